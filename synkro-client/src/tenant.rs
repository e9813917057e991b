//! Tenant Resolver
//!
//! Maps the signed-in user to the barbershop they manage:
//! auth user -> `profiles` row (`user_id`) -> `barbershop_id`.

use shared::TenantId;
use shared::models::Profile;
use std::sync::Arc;

use crate::ClientResult;
use crate::gateway::{AuthProvider, Collection, Filter, RemoteGateway};
use crate::store::decode_row;

pub struct TenantResolver {
    auth: Arc<dyn AuthProvider>,
    gateway: Arc<dyn RemoteGateway>,
}

impl TenantResolver {
    pub fn new(auth: Arc<dyn AuthProvider>, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { auth, gateway }
    }

    /// Tenant of the current user.
    ///
    /// `None` when nobody is signed in, the user has no profile, the profile
    /// is not linked to a barbershop, or the backend could not be reached.
    pub async fn resolve(&self) -> Option<TenantId> {
        match self.try_resolve().await {
            Ok(tenant) => tenant,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve barbershop");
                None
            }
        }
    }

    async fn try_resolve(&self) -> ClientResult<Option<TenantId>> {
        let Some(user) = self.auth.current_user().await? else {
            tracing::debug!("No signed-in user");
            return Ok(None);
        };

        let rows = self
            .gateway
            .query(Collection::Profiles, &Filter::new().eq("user_id", user.id), None)
            .await?;
        let Some(row) = rows.into_iter().next() else {
            tracing::debug!(user_id = %user.id, "User has no profile");
            return Ok(None);
        };

        let profile: Profile = decode_row(Collection::Profiles, row)?;
        Ok(profile.barbershop_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{AuthUser, MemoryGateway, Operation};
    use serde_json::json;
    use uuid::Uuid;

    fn resolver(gateway: &Arc<MemoryGateway>) -> TenantResolver {
        TenantResolver::new(gateway.clone(), gateway.clone())
    }

    fn sign_in(gateway: &MemoryGateway) -> Uuid {
        let user_id = Uuid::new_v4();
        gateway.set_current_user(Some(AuthUser {
            id: user_id,
            email: Some("dono@barbearia.com".to_string()),
        }));
        user_id
    }

    #[tokio::test]
    async fn test_resolves_linked_profile() {
        let gateway = Arc::new(MemoryGateway::new());
        let user_id = sign_in(&gateway);
        let tenant = TenantId(Uuid::new_v4());
        gateway.seed(
            Collection::Profiles,
            [json!({ "user_id": user_id, "barbershop_id": tenant, "full_name": "Carlos" })],
        );

        assert_eq!(resolver(&gateway).resolve().await, Some(tenant));
    }

    #[tokio::test]
    async fn test_absent_without_user_or_link() {
        let gateway = Arc::new(MemoryGateway::new());
        assert_eq!(resolver(&gateway).resolve().await, None);
        assert_eq!(gateway.call_count(Operation::Query), 0);

        let user_id = sign_in(&gateway);
        assert_eq!(resolver(&gateway).resolve().await, None);

        gateway.seed(
            Collection::Profiles,
            [json!({ "user_id": user_id, "barbershop_id": null })],
        );
        assert_eq!(resolver(&gateway).resolve().await, None);
    }

    #[tokio::test]
    async fn test_remote_error_resolves_to_none() {
        let gateway = Arc::new(MemoryGateway::new());
        sign_in(&gateway);
        gateway.fail_next(Operation::Query, "JWT expired");

        assert_eq!(resolver(&gateway).resolve().await, None);
    }
}
