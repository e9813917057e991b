//! Working hours and default-week seeding

use shared::TenantId;
use shared::models::{DayOfWeek, WorkingHour, WorkingHourCreate};
use std::ops::Deref;
use uuid::Uuid;

use crate::ClientResult;
use crate::context::SyncContext;
use crate::coordinator::{MutationCoordinator, scoped_record};
use crate::entity::Entity;
use crate::gateway::Filter;

/// Week every new barbershop starts with: Monday to Friday 09:00-19:00,
/// Saturday 09:00-17:00, closed on Sunday.
pub const DEFAULT_TEMPLATE: [(DayOfWeek, &str, &str); 6] = [
    (1, "09:00", "19:00"),
    (2, "09:00", "19:00"),
    (3, "09:00", "19:00"),
    (4, "09:00", "19:00"),
    (5, "09:00", "19:00"),
    (6, "09:00", "17:00"),
];

/// Shop-wide rows of [`DEFAULT_TEMPLATE`], all active
pub fn default_week() -> Vec<WorkingHourCreate> {
    DEFAULT_TEMPLATE
        .iter()
        .map(|&(day_of_week, start, end)| WorkingHourCreate {
            barber_id: None,
            day_of_week,
            start_time: start.to_string(),
            end_time: end.to_string(),
            active: true,
        })
        .collect()
}

pub struct WorkingHours {
    hours: MutationCoordinator<WorkingHour>,
}

impl Deref for WorkingHours {
    type Target = MutationCoordinator<WorkingHour>;

    fn deref(&self) -> &Self::Target {
        &self.hours
    }
}

impl WorkingHours {
    pub fn new(hours: MutationCoordinator<WorkingHour>) -> Self {
        Self { hours }
    }

    pub fn from_context(ctx: &SyncContext) -> Self {
        Self::new(MutationCoordinator::from_context(ctx))
    }

    /// Seed the default week when the tenant has no working hours yet.
    ///
    /// Returns the number of rows inserted (0 when rows already existed).
    /// The existence check and the insert are separate calls, so two
    /// sessions seeding the same tenant at once can both insert.
    pub async fn ensure_defaults(&self, tenant: TenantId) -> ClientResult<usize> {
        let existing = self
            .gateway()
            .query(WorkingHour::COLLECTION, &Filter::tenant(tenant), None)
            .await
            .inspect_err(|e| tracing::warn!(%tenant, error = %e, "Failed to check working hours"))?;
        if !existing.is_empty() {
            return Ok(0);
        }

        let records = default_week()
            .iter()
            .map(|draft| scoped_record(tenant, draft))
            .collect::<ClientResult<Vec<_>>>()?;
        let inserted = self
            .gateway()
            .insert_many(WorkingHour::COLLECTION, records)
            .await
            .inspect_err(|e| tracing::warn!(%tenant, error = %e, "Failed to seed working hours"))?;
        tracing::info!(%tenant, count = inserted.len(), "Seeded default working hours");

        // Leave a store scoped to another tenant alone
        let scope = self.store().tenant().await;
        if scope.is_none() || scope == Some(tenant) {
            self.store().load(Some(tenant)).await;
        }
        Ok(inserted.len())
    }

    /// Rows for one day of the week, shop-wide and per barber
    pub async fn for_day(&self, day: DayOfWeek) -> Vec<WorkingHour> {
        self.store().filter(|h| h.day_of_week == day).await
    }

    /// Rows of one barber; `None` selects the shop-wide schedule
    pub async fn for_barber(&self, barber_id: Option<Uuid>) -> Vec<WorkingHour> {
        self.store().filter(|h| h.barber_id == barber_id).await
    }
}
