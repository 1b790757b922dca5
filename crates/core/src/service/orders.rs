use chrono::Utc;

use super::Gallery;
use crate::error::{GalleryError, GalleryResult};
use crate::events::types::{OrderPlacedEvent, OrderStatusEvent};
use crate::events::GalleryEvent;
use crate::ids::{OrderId, UserId};
use crate::order::{CheckoutDetails, NewOrder, Order, OrderDetail, OrderDraft, OrderFilter, OrderStatus};

impl Gallery {
    /// Turn the user's basket into an order.
    ///
    /// Every line is frozen into an order item, the total is charged, and
    /// the order is written together with the removal of the consumed lines.
    /// Any refusal before that write leaves the basket exactly as it was.
    pub async fn checkout(&self, user_id: UserId, details: CheckoutDetails) -> GalleryResult<OrderDetail> {
        let details = details.validated()?;
        let basket = self.store.basket_for_user(user_id).await?;
        let lines = self.store.basket_lines(basket.id).await?;
        let draft = OrderDraft::from_lines(&lines)?;

        let receipt = self
            .payments
            .charge(draft.total_amount, &draft.currency, user_id)
            .await?;

        let new = NewOrder {
            user_id,
            draft,
            details,
            payment_method: receipt.method,
            payment_reference: receipt.reference,
        };
        let placed = match self.store.place_order(&new).await {
            Ok(placed) => placed,
            Err(err) => {
                tracing::error!(
                    %user_id,
                    payment_reference = %new.payment_reference,
                    error = %err,
                    "order not recorded after successful charge"
                );
                return Err(err.into());
            }
        };

        tracing::info!(
            order_id = %placed.order.id,
            %user_id,
            total = %placed.order.total_amount,
            currency = %placed.order.currency,
            "order placed"
        );
        self.events.publish(GalleryEvent::OrderPlaced(OrderPlacedEvent {
            order_id: placed.order.id,
            user_id,
            total_amount: placed.order.total_amount,
            currency: placed.order.currency.clone(),
            item_count: placed.items.len(),
            timestamp: Utc::now(),
        }));
        self.publish_basket(user_id).await;
        Ok(placed)
    }

    /// The user's order history, newest first.
    pub async fn orders_for(&self, user_id: UserId) -> GalleryResult<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// An order with its items. Only its buyer or an owner may read it.
    pub async fn order(&self, viewer: UserId, is_owner: bool, id: OrderId) -> GalleryResult<OrderDetail> {
        let detail = self
            .store
            .order(id)
            .await?
            .ok_or_else(|| GalleryError::not_found("order", id))?;
        if detail.order.user_id != viewer && !is_owner {
            return Err(GalleryError::Forbidden(format!("order {id} belongs to another user")));
        }
        Ok(detail)
    }

    pub async fn all_orders(&self, filter: OrderFilter) -> GalleryResult<Vec<Order>> {
        Ok(self.store.orders(filter.status).await?)
    }

    /// Move an order along its lifecycle. Re-applying the current status
    /// changes nothing.
    pub async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> GalleryResult<Order> {
        let current = self
            .store
            .order(id)
            .await?
            .ok_or_else(|| GalleryError::not_found("order", id))?
            .order;
        if current.status == status {
            return Ok(current);
        }
        if !current.status.can_transition_to(status) {
            return Err(GalleryError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let updated = self.store.set_order_status(id, current.status, status).await?;
        tracing::info!(order_id = %id, from = %current.status, to = %status, "order status changed");
        self.events.publish(GalleryEvent::OrderStatusChanged(OrderStatusEvent {
            order_id: id,
            previous: current.status,
            current: status,
            timestamp: Utc::now(),
        }));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::basket::AddToBasket;
    use crate::catalog::{VariantInput, VariantMedium};
    use crate::events::EventBus;
    use crate::payment::{PaymentError, PaymentProcessor, PaymentReceipt};
    use crate::service::tests::{seed, seed_with, Seed};
    use crate::store::MemoryStore;

    #[derive(Debug)]
    struct DecliningProcessor;

    #[async_trait]
    impl PaymentProcessor for DecliningProcessor {
        async fn charge(&self, _: Decimal, _: &str, _: UserId) -> Result<PaymentReceipt, PaymentError> {
            Err(PaymentError::Declined("card refused".into()))
        }
    }

    fn details() -> CheckoutDetails {
        CheckoutDetails {
            email: "Buyer@Example.com".into(),
            full_name: "Buyer".into(),
            address_line1: "1 Main St".into(),
            address_line2: String::new(),
            city: "Springfield".into(),
            postal_code: "12345".into(),
            country: "US".into(),
        }
    }

    async fn fill_basket(seed: &Seed, user: UserId) {
        seed.gallery
            .save_variant(
                seed.art.id,
                VariantMedium::OriginalPiece,
                VariantInput {
                    is_available: true,
                    price: Some(Decimal::new(150000, 2)),
                    currency: None,
                },
            )
            .await
            .unwrap();
        seed.gallery
            .add_to_basket(
                user,
                AddToBasket {
                    art_id: seed.art.id,
                    medium: None,
                    quantity: Some(2),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn checkout_freezes_items_and_empties_basket() {
        let seed = seed().await;
        let user = UserId::new_random();
        fill_basket(&seed, user).await;
        let mut rx = seed.gallery.events().subscribe();

        let placed = seed.gallery.checkout(user, details()).await.unwrap();

        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.total_amount, Decimal::new(300000, 2));
        assert_eq!(placed.order.email, "buyer@example.com");
        assert!(placed.order.payment_reference.starts_with("test_"));
        assert_eq!(placed.items.len(), 1);
        assert_eq!(placed.items[0].artwork_title, "Artwork 1");
        assert_eq!(placed.items[0].artwork_artist, "Test Artist");
        assert_eq!(placed.items[0].variant_medium, "Original Piece");
        assert_eq!(seed.gallery.basket_count(user).await.unwrap(), 0);
        assert!(matches!(rx.recv().await.unwrap(), GalleryEvent::OrderPlaced(_)));

        // Catalog edits after the fact leave the order untouched.
        seed.gallery.delete_art(seed.art.id).await.unwrap();
        let kept = seed.gallery.order(user, false, placed.order.id).await.unwrap();
        assert_eq!(kept.items[0].artwork_title, "Artwork 1");
        assert_eq!(kept.items[0].art_id, None);
    }

    #[tokio::test]
    async fn empty_basket_cannot_check_out() {
        let seed = seed().await;
        let err = seed.gallery.checkout(UserId::new_random(), details()).await.unwrap_err();
        assert!(matches!(err, GalleryError::EmptyBasket));
    }

    #[tokio::test]
    async fn declined_payment_leaves_basket_alone() {
        let gallery = crate::Gallery::new(
            Arc::new(MemoryStore::new()),
            Arc::new(DecliningProcessor),
            EventBus::default(),
        );
        let seed = seed_with(gallery).await;
        let user = UserId::new_random();
        fill_basket(&seed, user).await;

        let err = seed.gallery.checkout(user, details()).await.unwrap_err();
        assert!(matches!(err, GalleryError::Payment(PaymentError::Declined(_))));
        assert_eq!(seed.gallery.basket_count(user).await.unwrap(), 2);
        assert!(seed.gallery.orders_for(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sold_out_line_blocks_checkout() {
        let seed = seed().await;
        let user = UserId::new_random();
        fill_basket(&seed, user).await;
        seed.gallery
            .save_variant(
                seed.art.id,
                VariantMedium::OriginalPiece,
                VariantInput {
                    is_available: false,
                    price: Some(Decimal::new(150000, 2)),
                    currency: None,
                },
            )
            .await
            .unwrap();

        let err = seed.gallery.checkout(user, details()).await.unwrap_err();
        assert!(matches!(err, GalleryError::Unavailable(_)));
        assert_eq!(seed.gallery.basket_count(user).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn other_users_orders_are_private() {
        let seed = seed().await;
        let buyer = UserId::new_random();
        fill_basket(&seed, buyer).await;
        let placed = seed.gallery.checkout(buyer, details()).await.unwrap();

        let stranger = UserId::new_random();
        assert!(matches!(
            seed.gallery.order(stranger, false, placed.order.id).await,
            Err(GalleryError::Forbidden(_))
        ));
        assert!(seed.gallery.order(stranger, true, placed.order.id).await.is_ok());
    }

    #[tokio::test]
    async fn status_moves_forward_only() {
        let seed = seed().await;
        let user = UserId::new_random();
        fill_basket(&seed, user).await;
        let id = seed.gallery.checkout(user, details()).await.unwrap().order.id;

        let same = seed.gallery.set_order_status(id, OrderStatus::Pending).await.unwrap();
        assert_eq!(same.status, OrderStatus::Pending);

        seed.gallery.set_order_status(id, OrderStatus::Processing).await.unwrap();
        seed.gallery.set_order_status(id, OrderStatus::Completed).await.unwrap();
        let err = seed
            .gallery
            .set_order_status(id, OrderStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GalleryError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Pending
            }
        ));

        let completed = seed
            .gallery
            .all_orders(OrderFilter {
                status: Some(OrderStatus::Completed),
            })
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
    }
}
