//! One barbershop's synced data
//!
//! [`ShopSession`] owns a store and coordinator per entity and moves all of
//! them between tenants together.

use shared::TenantId;
use shared::models::{Client, Service, TeamMember};

use crate::context::SyncContext;
use crate::coordinator::MutationCoordinator;
use crate::gallery::Gallery;
use crate::gateway::Collection;
use crate::loyalty::Loyalty;
use crate::notifications::{Inbox, MessageHistory};
use crate::store::LoadOutcome;
use crate::working_hours::WorkingHours;

pub type Clients = MutationCoordinator<Client>;
pub type Services = MutationCoordinator<Service>;
pub type Team = MutationCoordinator<TeamMember>;

pub struct ShopSession {
    pub clients: Clients,
    pub services: Services,
    pub team: Team,
    pub working_hours: WorkingHours,
    pub gallery: Gallery,
    pub loyalty: Loyalty,
    pub history: MessageHistory,
    pub inbox: Inbox,
}

impl ShopSession {
    pub fn new(ctx: &SyncContext) -> Self {
        Self {
            clients: MutationCoordinator::from_context(ctx),
            services: MutationCoordinator::from_context(ctx),
            team: MutationCoordinator::from_context(ctx),
            working_hours: WorkingHours::from_context(ctx),
            gallery: Gallery::from_context(ctx),
            loyalty: Loyalty::from_context(ctx),
            history: MessageHistory::from_context(ctx),
            inbox: Inbox::from_context(ctx),
        }
    }

    /// Build a session and load the context's tenant, seeding working
    /// hours for a barbershop that has none.
    pub async fn open(ctx: &SyncContext) -> Self {
        let session = Self::new(ctx);
        if let Some(tenant) = ctx.tenant {
            if let Err(e) = session.working_hours.ensure_defaults(tenant).await {
                tracing::warn!(%tenant, error = %e, "Working hours not seeded");
            }
        }
        session.switch_tenant(ctx.tenant).await;
        session
    }

    /// Scope every store to `tenant` (or clear them all).
    ///
    /// Returns the collections whose load failed.
    pub async fn switch_tenant(&self, tenant: Option<TenantId>) -> Vec<Collection> {
        let outcomes = tokio::join!(
            self.clients.store().load(tenant),
            self.services.store().load(tenant),
            self.team.store().load(tenant),
            self.working_hours.store().load(tenant),
            self.gallery.store().load(tenant),
            self.loyalty.cards().store().load(tenant),
            self.loyalty.coupons().store().load(tenant),
            self.history.store().load(tenant),
            self.inbox.store().load(tenant),
        );
        let outcomes = [
            (Collection::Clients, outcomes.0),
            (Collection::Services, outcomes.1),
            (Collection::TeamMembers, outcomes.2),
            (Collection::WorkingHours, outcomes.3),
            (Collection::GalleryImages, outcomes.4),
            (Collection::LoyaltyCards, outcomes.5),
            (Collection::LoyaltyCoupons, outcomes.6),
            (Collection::ClientNotificationHistory, outcomes.7),
            (Collection::Notifications, outcomes.8),
        ];

        let failed: Vec<_> = outcomes
            .into_iter()
            .filter(|(_, outcome)| matches!(outcome, LoadOutcome::Failed(_)))
            .map(|(collection, _)| collection)
            .collect();
        match tenant {
            Some(tenant) => tracing::info!(%tenant, failed = failed.len(), "Session scoped"),
            None => tracing::info!("Session cleared"),
        }
        failed
    }

    /// Tenant the session is currently scoped to
    pub async fn tenant(&self) -> Option<TenantId> {
        self.clients.store().tenant().await
    }
}
