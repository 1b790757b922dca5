use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ArtSummary;
use crate::ids::{ArtId, ExhibitionId};
use crate::validate::{self, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhibitionStatus {
    /// Only visible to owners.
    #[default]
    Draft,
    Published,
    Archived,
}

text_enum!(ExhibitionStatus {
    Draft => "draft",
    Published => "published",
    Archived => "archived",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exhibition {
    pub id: ExhibitionId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: ExhibitionStatus,
    pub start_date: NaiveDate,
    /// Open-ended when absent.
    pub end_date: Option<NaiveDate>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exhibition {
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.end_date.map_or(true, |end| end >= today)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhibitionInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: ExhibitionStatus,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl ExhibitionInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        if self.end_date.is_some_and(|end| end < self.start_date) {
            return Err(ValidationError::DateRange);
        }
        Ok(Self {
            title: validate::required_text("title", &self.title, 200)?,
            description: validate::optional_text("description", &self.description, 10_000)?,
            location: validate::optional_text("location", &self.location, 200)?,
            cover_image_url: validate::optional_url("cover_image_url", self.cover_image_url.as_deref())?,
            ..self
        })
    }
}

/// Events page: what is on or coming, and what has closed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExhibitionSchedule {
    pub upcoming: Vec<Exhibition>,
    pub previous: Vec<Exhibition>,
}

/// Split exhibitions around `today`. Upcoming are ordered by start date,
/// previous by most recently closed.
pub fn partition(exhibitions: Vec<Exhibition>, today: NaiveDate) -> ExhibitionSchedule {
    let (mut upcoming, mut previous): (Vec<_>, Vec<_>) =
        exhibitions.into_iter().partition(|e| e.is_upcoming(today));
    upcoming.sort_by_key(|e| (e.start_date, e.id));
    previous.sort_by(|a, b| b.end_date.cmp(&a.end_date).then_with(|| b.id.cmp(&a.id)));
    ExhibitionSchedule { upcoming, previous }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExhibitionDetail {
    #[serde(flatten)]
    pub exhibition: Exhibition,
    pub art: Vec<ArtSummary>,
}

/// Owner selection of the art shown in an exhibition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExhibitionArtSelection {
    pub art_ids: Vec<ArtId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn exhibition(id: i64, start: NaiveDate, end: Option<NaiveDate>) -> Exhibition {
        Exhibition {
            id: ExhibitionId(id),
            title: format!("Show {id}"),
            description: String::new(),
            location: String::new(),
            status: ExhibitionStatus::Published,
            start_date: start,
            end_date: end,
            cover_image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn partition_around_today() {
        let today = day(2025, 6, 15);
        let schedule = partition(
            vec![
                exhibition(1, day(2025, 1, 1), Some(day(2025, 2, 1))),
                exhibition(2, day(2025, 7, 1), None),
                exhibition(3, day(2025, 6, 1), Some(day(2025, 6, 15))),
                exhibition(4, day(2025, 3, 1), Some(day(2025, 5, 1))),
            ],
            today,
        );

        let upcoming: Vec<i64> = schedule.upcoming.iter().map(|e| e.id.0).collect();
        let previous: Vec<i64> = schedule.previous.iter().map(|e| e.id.0).collect();
        assert_eq!(upcoming, vec![3, 2]);
        assert_eq!(previous, vec![4, 1]);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let input = ExhibitionInput {
            title: "Spring".into(),
            description: String::new(),
            location: String::new(),
            status: ExhibitionStatus::Draft,
            start_date: day(2025, 5, 1),
            end_date: Some(day(2025, 4, 30)),
            cover_image_url: None,
        };
        assert_eq!(input.validated(), Err(ValidationError::DateRange));
    }
}
