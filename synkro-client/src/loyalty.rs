//! Loyalty cards and coupons
//!
//! Points are only ever granted by the `add_loyalty_point` procedure, which
//! also decides when a coupon is due. The client calls it and re-reads both
//! stores.

use serde_json::json;
use shared::models::{
    AddPointResult, LOYALTY_POINTS_THRESHOLD, LoyaltyCard, LoyaltyCoupon, LoyaltyCouponRedeem,
};
use shared::util::now;
use uuid::Uuid;

use crate::context::SyncContext;
use crate::coordinator::{MutationCoordinator, MutationOutcome};
use crate::gateway::Collection;
use crate::notify::Notice;
use crate::store::decode_row;
use crate::{ClientError, ClientResult};

pub const ADD_POINT_PROCEDURE: &str = "add_loyalty_point";

pub struct Loyalty {
    cards: MutationCoordinator<LoyaltyCard>,
    coupons: MutationCoordinator<LoyaltyCoupon>,
}

impl Loyalty {
    pub fn new(
        cards: MutationCoordinator<LoyaltyCard>,
        coupons: MutationCoordinator<LoyaltyCoupon>,
    ) -> Self {
        Self { cards, coupons }
    }

    pub fn from_context(ctx: &SyncContext) -> Self {
        Self::new(
            MutationCoordinator::from_context(ctx),
            MutationCoordinator::from_context(ctx),
        )
    }

    pub fn cards(&self) -> &MutationCoordinator<LoyaltyCard> {
        &self.cards
    }

    pub fn coupons(&self) -> &MutationCoordinator<LoyaltyCoupon> {
        &self.coupons
    }

    /// Grant one point to a client, then reload cards and coupons
    pub async fn add_point(&self, client_id: Uuid) -> MutationOutcome<AddPointResult> {
        self.cards
            .run(
                self.add_point_inner(client_id),
                |result| match &result.coupon_code {
                    Some(code) if result.coupon_generated => {
                        Notice::success("Coupon generated").with_description(code.clone())
                    }
                    _ => Notice::success("Point added").with_description(format!(
                        "{}/{} points",
                        result.points, LOYALTY_POINTS_THRESHOLD
                    )),
                },
                "Failed to add point".to_string(),
            )
            .await
    }

    async fn add_point_inner(&self, client_id: Uuid) -> ClientResult<AddPointResult> {
        let tenant = self.cards.scope().await?;
        let value = self
            .cards
            .gateway()
            .invoke(
                ADD_POINT_PROCEDURE,
                json!({ "p_barbershop_id": tenant, "p_client_id": client_id }),
            )
            .await?;
        let result: AddPointResult = decode_row(Collection::LoyaltyCards, value)?;
        if !result.success {
            return Err(ClientError::remote(
                result
                    .error
                    .unwrap_or_else(|| format!("{ADD_POINT_PROCEDURE} reported failure")),
            ));
        }
        tracing::info!(
            %tenant,
            %client_id,
            points = result.points,
            coupon_generated = result.coupon_generated,
            "Loyalty point added"
        );

        tokio::join!(self.cards.store().refresh(), self.coupons.store().refresh());
        Ok(result)
    }

    /// Mark a coupon as used now
    pub async fn redeem_coupon(&self, coupon_id: Uuid) -> MutationOutcome<LoyaltyCoupon> {
        let redeem = LoyaltyCouponRedeem {
            used: true,
            used_at: now(),
        };
        self.coupons
            .run(
                self.coupons.update_inner(coupon_id, &redeem),
                |coupon| Notice::success("Coupon redeemed").with_description(coupon.code.clone()),
                "Failed to redeem coupon".to_string(),
            )
            .await
    }

    pub async fn card_for(&self, client_id: Uuid) -> Option<LoyaltyCard> {
        self.cards
            .store()
            .filter(|card| card.client_id == client_id)
            .await
            .into_iter()
            .next()
    }

    /// Unused, unexpired coupons of a client
    pub async fn available_coupons(&self, client_id: Uuid) -> Vec<LoyaltyCoupon> {
        let now = now();
        self.coupons
            .store()
            .filter(|coupon| coupon.client_id == client_id && coupon.is_available(now))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryGateway, Operation};
    use crate::notify::ChannelSink;
    use shared::TenantId;
    use std::sync::Arc;

    fn setup() -> (
        Arc<MemoryGateway>,
        Loyalty,
        tokio::sync::mpsc::UnboundedReceiver<Notice>,
    ) {
        let gateway = Arc::new(MemoryGateway::new());
        let (sink, rx) = ChannelSink::new();
        let ctx = SyncContext::memory(gateway.clone(), Arc::new(sink));
        (gateway, Loyalty::from_context(&ctx), rx)
    }

    async fn scope(loyalty: &Loyalty, tenant: TenantId) {
        loyalty.cards().store().load(Some(tenant)).await;
        loyalty.coupons().store().load(Some(tenant)).await;
    }

    #[tokio::test]
    async fn test_add_point_without_tenant_does_not_invoke() {
        let (gateway, loyalty, mut rx) = setup();
        let outcome = loyalty.add_point(Uuid::new_v4()).await;

        assert!(matches!(outcome.error(), Some(ClientError::NoTenant)));
        assert_eq!(gateway.call_count(Operation::Invoke), 0);
        assert!(rx.try_recv().unwrap().is_error());
    }

    #[tokio::test]
    async fn test_procedure_failure_is_reported() {
        let (gateway, loyalty, mut rx) = setup();
        gateway.register_procedure(ADD_POINT_PROCEDURE, |_, _| {
            Ok(json!({ "success": false, "error": "Cliente não encontrado" }))
        });
        scope(&loyalty, TenantId(Uuid::new_v4())).await;

        let outcome = loyalty.add_point(Uuid::new_v4()).await;
        assert!(!outcome.is_committed());
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.title, "Failed to add point");
        assert_eq!(notice.description.as_deref(), Some("Cliente não encontrado"));
    }

    #[tokio::test]
    async fn test_add_point_passes_named_arguments() {
        let (gateway, loyalty, mut rx) = setup();
        let tenant = TenantId(Uuid::new_v4());
        let client_id = Uuid::new_v4();
        gateway.register_procedure(ADD_POINT_PROCEDURE, move |tables, args| {
            assert_eq!(args["p_barbershop_id"], tenant.to_string());
            assert_eq!(args["p_client_id"], client_id.to_string());
            tables.insert(
                Collection::LoyaltyCards,
                json!({
                    "barbershop_id": args["p_barbershop_id"],
                    "client_id": args["p_client_id"],
                    "points": 1,
                    "total_points": 1,
                }),
            )?;
            Ok(json!({ "success": true, "points": 1, "total_points": 1, "coupon_generated": false }))
        });
        scope(&loyalty, tenant).await;

        let result = loyalty.add_point(client_id).await.committed().unwrap();
        assert_eq!(result.points, 1);
        assert_eq!(loyalty.card_for(client_id).await.unwrap().points_to_next_coupon(), 9);
        assert_eq!(
            rx.try_recv().unwrap().description.as_deref(),
            Some("1/10 points")
        );
    }
}
