use super::Gallery;
use crate::basket::{
    self, AddToBasket, BasketItem, BasketView, NewBasketItem, MAX_ITEM_QUANTITY,
};
use crate::catalog::variant::default_variant;
use crate::error::{GalleryError, GalleryResult};
use crate::ids::{BasketItemId, UserId};

impl Gallery {
    pub async fn basket(&self, user_id: UserId) -> GalleryResult<BasketView> {
        let basket = self.store.basket_for_user(user_id).await?;
        let lines = self.store.basket_lines(basket.id).await?;
        BasketView::new(basket, lines)
    }

    /// Sum of quantities across the user's basket.
    pub async fn basket_count(&self, user_id: UserId) -> GalleryResult<i64> {
        let basket = self.store.basket_for_user(user_id).await?;
        let lines = self.store.basket_lines(basket.id).await?;
        Ok(basket::item_count(lines.iter().map(|l| &l.item)))
    }

    /// Add art to the basket, snapshotting the variant's current price.
    /// Without a medium the default variant is used. Adding a line that
    /// already exists raises its quantity, capped at [`MAX_ITEM_QUANTITY`].
    pub async fn add_to_basket(&self, user_id: UserId, request: AddToBasket) -> GalleryResult<BasketItem> {
        let quantity = basket::check_quantity(request.quantity.unwrap_or(1))?;
        let record = self
            .store
            .art_record(request.art_id)
            .await?
            .ok_or_else(|| GalleryError::not_found("art", request.art_id))?;

        let variant = match request.medium {
            Some(medium) => record
                .variants
                .iter()
                .find(|v| v.medium == medium)
                .ok_or_else(|| GalleryError::not_found("variant", format!("{}/{medium}", record.art.id)))?,
            None => default_variant(&record.variants).ok_or_else(|| {
                GalleryError::Unavailable(format!("{} has no variant for sale", record.art.title))
            })?,
        };
        if !variant.is_available {
            return Err(GalleryError::Unavailable(format!(
                "{} ({}) is not available",
                record.art.title,
                variant.medium.label()
            )));
        }
        let price = variant.price.ok_or_else(|| {
            GalleryError::Unavailable(format!(
                "{} ({}) has no price",
                record.art.title,
                variant.medium.label()
            ))
        })?;

        let basket = self.store.basket_for_user(user_id).await?;
        let item = self
            .store
            .add_basket_item(
                basket.id,
                &NewBasketItem {
                    art_id: record.art.id,
                    variant_id: variant.id,
                    quantity,
                    price,
                    currency: variant.currency.clone(),
                },
                MAX_ITEM_QUANTITY,
            )
            .await?;
        tracing::debug!(%user_id, basket_item_id = %item.id, quantity = item.quantity, "basket item added");
        self.publish_basket(user_id).await;
        Ok(item)
    }

    /// Set a line's quantity. Zero removes the line and returns `None`.
    pub async fn update_basket_item(
        &self,
        user_id: UserId,
        id: BasketItemId,
        quantity: i32,
    ) -> GalleryResult<Option<BasketItem>> {
        self.owned_item(user_id, id).await?;
        let updated = if quantity == 0 {
            self.store.remove_basket_item(id).await?;
            None
        } else {
            let quantity = basket::check_quantity(quantity)?;
            Some(self.store.set_basket_item_quantity(id, quantity).await?)
        };
        self.publish_basket(user_id).await;
        Ok(updated)
    }

    pub async fn remove_basket_item(&self, user_id: UserId, id: BasketItemId) -> GalleryResult<()> {
        self.owned_item(user_id, id).await?;
        self.store.remove_basket_item(id).await?;
        self.publish_basket(user_id).await;
        Ok(())
    }

    /// Empties the basket; returns how many lines were removed.
    pub async fn clear_basket(&self, user_id: UserId) -> GalleryResult<u64> {
        let basket = self.store.basket_for_user(user_id).await?;
        let removed = self.store.clear_basket(basket.id).await?;
        self.publish_basket(user_id).await;
        Ok(removed)
    }

    async fn owned_item(&self, user_id: UserId, id: BasketItemId) -> GalleryResult<BasketItem> {
        let item = self
            .store
            .basket_item(id)
            .await?
            .ok_or_else(|| GalleryError::not_found("basket item", id))?;
        let basket = self.store.basket_for_user(user_id).await?;
        if item.basket_id != basket.id {
            return Err(GalleryError::Forbidden(format!("basket item {id} is not yours")));
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use std::sync::Arc;

    use super::*;
    use crate::catalog::{VariantInput, VariantMedium};
    use crate::events::{EventBus, GalleryEvent};
    use crate::payment::TestPaymentProcessor;
    use crate::service::tests::{seed, seed_with, Seed};
    use crate::store::MemoryStore;

    async fn with_variants(seed: &Seed) {
        for (medium, available, cents) in [
            (VariantMedium::OriginalPiece, true, 150000),
            (VariantMedium::PrintedPoster, true, 4000),
            (VariantMedium::DigitalCopy, false, 1000),
        ] {
            seed.gallery
                .save_variant(
                    seed.art.id,
                    medium,
                    VariantInput {
                        is_available: available,
                        price: Some(Decimal::new(cents, 2)),
                        currency: None,
                    },
                )
                .await
                .unwrap();
        }
    }

    fn add(seed: &Seed, medium: Option<VariantMedium>, quantity: Option<i32>) -> AddToBasket {
        AddToBasket {
            art_id: seed.art.id,
            medium,
            quantity,
        }
    }

    #[tokio::test]
    async fn default_variant_is_the_original() {
        let seed = seed().await;
        with_variants(&seed).await;
        let user = UserId::new_random();

        let item = seed.gallery.add_to_basket(user, add(&seed, None, None)).await.unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price_at_addition, Decimal::new(150000, 2));

        let view = seed.gallery.basket(user).await.unwrap();
        assert_eq!(view.lines[0].variant_medium, VariantMedium::OriginalPiece);
    }

    #[tokio::test]
    async fn price_is_snapshotted_at_first_add() {
        let seed = seed().await;
        with_variants(&seed).await;
        let user = UserId::new_random();
        let poster = Some(VariantMedium::PrintedPoster);

        seed.gallery.add_to_basket(user, add(&seed, poster, Some(2))).await.unwrap();
        seed.gallery
            .save_variant(
                seed.art.id,
                VariantMedium::PrintedPoster,
                VariantInput {
                    is_available: true,
                    price: Some(Decimal::new(9900, 2)),
                    currency: None,
                },
            )
            .await
            .unwrap();
        let merged = seed.gallery.add_to_basket(user, add(&seed, poster, Some(1))).await.unwrap();

        assert_eq!(merged.quantity, 3);
        assert_eq!(merged.price_at_addition, Decimal::new(4000, 2));
        assert_eq!(seed.gallery.basket_count(user).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unavailable_variant_is_refused() {
        let seed = seed().await;
        with_variants(&seed).await;
        let err = seed
            .gallery
            .add_to_basket(UserId::new_random(), add(&seed, Some(VariantMedium::DigitalCopy), None))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Unavailable(_)));
    }

    #[tokio::test]
    async fn art_without_variants_cannot_be_added() {
        let seed = seed().await;
        let err = seed
            .gallery
            .add_to_basket(UserId::new_random(), add(&seed, None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Unavailable(_)));
    }

    #[tokio::test]
    async fn quantity_zero_removes_and_strangers_are_refused() {
        let seed = seed().await;
        with_variants(&seed).await;
        let owner = UserId::new_random();
        let item = seed.gallery.add_to_basket(owner, add(&seed, None, None)).await.unwrap();

        let stranger = UserId::new_random();
        assert!(matches!(
            seed.gallery.update_basket_item(stranger, item.id, 5).await,
            Err(GalleryError::Forbidden(_))
        ));
        assert!(matches!(
            seed.gallery.update_basket_item(owner, item.id, 100).await,
            Err(GalleryError::Validation(_))
        ));

        assert_eq!(seed.gallery.update_basket_item(owner, item.id, 0).await.unwrap(), None);
        assert!(seed.gallery.basket(owner).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_variant_drops_its_basket_lines() {
        let seed = seed().await;
        with_variants(&seed).await;
        let user = UserId::new_random();
        let item = seed.gallery.add_to_basket(user, add(&seed, None, None)).await.unwrap();

        seed.gallery.delete_variant(item.variant_id).await.unwrap();
        assert_eq!(seed.gallery.basket_count(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn committed_add_survives_a_failed_recount() {
        let store = MemoryStore::new();
        let gallery = Gallery::new(
            Arc::new(store.clone()),
            Arc::new(TestPaymentProcessor),
            EventBus::default(),
        );
        let seed = seed_with(gallery).await;
        with_variants(&seed).await;
        let user = UserId::new_random();
        let original = seed.gallery.add_to_basket(user, add(&seed, None, None)).await.unwrap();

        // the original's line can no longer be joined, so recounting fails
        store.forget_variant(original.variant_id).await;
        let mut events = seed.gallery.events().subscribe();

        let poster = seed
            .gallery
            .add_to_basket(user, add(&seed, Some(VariantMedium::PrintedPoster), None))
            .await
            .unwrap();
        assert_eq!(poster.price_at_addition, Decimal::new(4000, 2));
        assert!(seed.gallery.store.basket_item(poster.id).await.unwrap().is_some());
        assert!(!matches!(events.try_recv(), Ok(GalleryEvent::BasketUpdated(_))));
    }

    #[tokio::test]
    async fn overpriced_variant_never_reaches_the_basket() {
        let seed = seed().await;
        let err = seed
            .gallery
            .save_variant(
                seed.art.id,
                VariantMedium::OriginalPiece,
                VariantInput {
                    is_available: true,
                    price: Some(Decimal::MAX),
                    currency: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Validation(ref e) if e.field() == "price"));

        let user = UserId::new_random();
        assert!(seed.gallery.add_to_basket(user, add(&seed, None, Some(2))).await.is_err());
        assert!(seed.gallery.basket(user).await.unwrap().lines.is_empty());
    }
}
