use chrono::NaiveDate;

use super::Gallery;
use crate::error::{GalleryError, GalleryResult};
use crate::exhibition::{
    self, Exhibition, ExhibitionArtSelection, ExhibitionDetail, ExhibitionInput, ExhibitionSchedule,
    ExhibitionStatus,
};
use crate::ids::{ArtId, ExhibitionId};

impl Gallery {
    pub async fn create_exhibition(&self, input: ExhibitionInput) -> GalleryResult<Exhibition> {
        let input = input.validated()?;
        let exhibition = self.store.insert_exhibition(&input).await?;
        tracing::info!(exhibition_id = %exhibition.id, "exhibition created");
        Ok(exhibition)
    }

    pub async fn update_exhibition(
        &self,
        id: ExhibitionId,
        input: ExhibitionInput,
    ) -> GalleryResult<Exhibition> {
        let input = input.validated()?;
        Ok(self.store.update_exhibition(id, &input).await?)
    }

    pub async fn delete_exhibition(&self, id: ExhibitionId) -> GalleryResult<()> {
        if !self.store.delete_exhibition(id).await? {
            return Err(GalleryError::not_found("exhibition", id));
        }
        Ok(())
    }

    /// Upcoming and previous exhibitions as of `today`. Drafts are left out
    /// unless `include_drafts` is set.
    pub async fn exhibitions(&self, today: NaiveDate, include_drafts: bool) -> GalleryResult<ExhibitionSchedule> {
        let exhibitions = self
            .store
            .exhibitions()
            .await?
            .into_iter()
            .filter(|e| include_drafts || e.status != ExhibitionStatus::Draft)
            .collect();
        Ok(exhibition::partition(exhibitions, today))
    }

    /// A draft is reported as missing unless `include_drafts` is set.
    pub async fn exhibition(&self, id: ExhibitionId, include_drafts: bool) -> GalleryResult<ExhibitionDetail> {
        let exhibition = self
            .store
            .exhibition(id)
            .await?
            .filter(|e| include_drafts || e.status != ExhibitionStatus::Draft)
            .ok_or_else(|| GalleryError::not_found("exhibition", id))?;
        let ids = self.store.exhibition_art_ids(id).await?;
        let art = self.summaries_for(&ids).await?;
        Ok(ExhibitionDetail { exhibition, art })
    }

    /// Replace the exhibition's art with exactly `selection`. Unknown art
    /// ids are rejected and nothing changes.
    pub async fn assign_exhibition_art(
        &self,
        id: ExhibitionId,
        selection: ExhibitionArtSelection,
    ) -> GalleryResult<ExhibitionDetail> {
        let mut art_ids: Vec<ArtId> = selection.art_ids;
        art_ids.sort_unstable();
        art_ids.dedup();
        self.store.replace_exhibition_art(id, &art_ids).await?;
        tracing::info!(exhibition_id = %id, count = art_ids.len(), "exhibition art assigned");
        self.exhibition(id, true).await
    }
}
