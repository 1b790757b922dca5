use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::art::ArtSummary;
use super::artist::Artist;
use crate::ids::{ArtistId, CollectionId};
use crate::validate::{self, ValidationError};

/// A grouping of art under one artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub artist_id: ArtistId,
    pub name: String,
    pub description: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInput {
    pub artist_id: ArtistId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl CollectionInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            artist_id: self.artist_id,
            name: validate::required_text("name", &self.name, 200)?,
            description: validate::optional_text("description", &self.description, 5000)?,
            cover_image_url: validate::optional_url("cover_image_url", self.cover_image_url.as_deref())?,
        })
    }
}

/// A collection as shown in the gallery: with its artist and its art.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionView {
    #[serde(flatten)]
    pub collection: Collection,
    pub artist: Artist,
    pub art: Vec<ArtSummary>,
}
