use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ArtId, MediaId, VariantId};
use crate::validate::{self, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Pdf,
    Other,
}

text_enum!(MediaKind {
    Image => "image",
    Video => "video",
    Pdf => "pdf",
    Other => "other",
});

/// Where on the site a media asset is meant to appear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[default]
    Art,
    Homepage,
    Collection,
    Artist,
    Page,
}

text_enum!(Placement {
    Art => "art",
    Homepage => "homepage",
    Collection => "collection",
    Artist => "artist",
    Page => "page",
});

/// Fixed homepage sections; each holds at most one media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomepageSlot {
    Hero,
    SecondSection,
    ThirdSection,
}

text_enum!(HomepageSlot {
    Hero => "hero",
    SecondSection => "second_section",
    ThirdSection => "third_section",
});

/// An uploaded asset. The file itself lives with the media host; only its
/// URL is stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub art_id: Option<ArtId>,
    pub variant_id: Option<VariantId>,
    pub file_url: Option<String>,
    pub kind: MediaKind,
    pub caption: String,
    pub is_primary: bool,
    pub ordering: i32,
    pub placement: Placement,
    pub slot: Option<HomepageSlot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInput {
    #[serde(default)]
    pub art_id: Option<ArtId>,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub kind: MediaKind,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub ordering: i32,
    #[serde(default)]
    pub placement: Placement,
}

impl MediaInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        if self.ordering < 0 {
            return Err(ValidationError::Negative { field: "ordering" });
        }
        if self.placement == Placement::Art && self.art_id.is_none() {
            return Err(ValidationError::Required { field: "art_id" });
        }
        Ok(Self {
            file_url: validate::optional_url("file_url", self.file_url.as_deref())?,
            caption: validate::optional_text("caption", &self.caption, 255)?,
            ..self
        })
    }
}

/// Media in display order: `ordering` ascending, newest first on ties.
pub fn sort_for_display(media: &mut [Media]) {
    media.sort_by(|a, b| {
        a.ordering
            .cmp(&b.ordering)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn media(id: i64, ordering: i32, age_minutes: i64) -> Media {
        let at = Utc::now() - Duration::minutes(age_minutes);
        Media {
            id: MediaId(id),
            art_id: Some(ArtId(1)),
            variant_id: None,
            file_url: Some(format!("https://media.example/{id}.jpg")),
            kind: MediaKind::Image,
            caption: String::new(),
            is_primary: false,
            ordering,
            placement: Placement::Art,
            slot: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn display_order() {
        let mut items = vec![media(1, 1, 10), media(2, 0, 10), media(3, 0, 1)];
        sort_for_display(&mut items);
        let ids: Vec<i64> = items.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn slot_text_round_trip() {
        assert_eq!("second_section".parse::<HomepageSlot>().unwrap(), HomepageSlot::SecondSection);
        assert_eq!(HomepageSlot::ThirdSection.as_str(), "third_section");
        assert!("footer".parse::<HomepageSlot>().is_err());
    }

    #[test]
    fn art_placement_needs_art() {
        let input = MediaInput {
            art_id: None,
            variant_id: None,
            file_url: None,
            kind: MediaKind::Image,
            caption: String::new(),
            is_primary: false,
            ordering: 0,
            placement: Placement::Art,
        };
        assert_eq!(input.clone().validated().unwrap_err().field(), "art_id");

        let homepage = MediaInput {
            placement: Placement::Homepage,
            ..input
        };
        assert!(homepage.validated().is_ok());
    }
}
