use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ArtistId;
use crate::validate::{self, ValidationError};

/// The artist behind a set of collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub bio: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/edit form for an artist profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ArtistInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: validate::required_text("name", &self.name, 200)?,
            email: validate::email("email", &self.email)?,
            phone_number: validate::optional_text("phone_number", &self.phone_number, 30)?,
            bio: validate::optional_text("bio", &self.bio, 5000)?,
            image_url: validate::optional_url("image_url", self.image_url.as_deref())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_normalizes_fields() {
        let input = ArtistInput {
            name: "  Mara Quell ".into(),
            email: "Mara@Studio.art".into(),
            phone_number: "123-456-7890".into(),
            bio: String::new(),
            image_url: Some("  ".into()),
        }
        .validated()
        .unwrap();

        assert_eq!(input.name, "Mara Quell");
        assert_eq!(input.email, "mara@studio.art");
        assert_eq!(input.image_url, None);
    }

    #[test]
    fn phone_length_is_bounded() {
        let err = ArtistInput {
            name: "Mara".into(),
            email: "mara@studio.art".into(),
            phone_number: "1".repeat(31),
            bio: String::new(),
            image_url: None,
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.field(), "phone_number");
    }
}
