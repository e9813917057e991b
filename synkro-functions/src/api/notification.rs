//! create-notification: in-app notifications for a barbershop's staff
//!
//! Recipients are the owner plus every active team member linked to a
//! user account. They are looked up in one query per table and written in
//! a single batched insert.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::TenantId;
use shared::appointment::AppointmentEvent;
use shared::models::NotificationCreate;
use synkro_client::{ClientError, Collection, Filter, RemoteGateway};
use uuid::Uuid;
use validator::Validate;

use crate::error::{FunctionError, FunctionResult};
use crate::state::AppState;

use super::{ApiResult, fetch_barbershop};

#[derive(Deserialize)]
struct LinkedMember {
    user_id: Option<Uuid>,
}

/// Users to notify: owner first, then linked active team members
pub async fn recipients(backend: &dyn RemoteGateway, tenant: TenantId) -> FunctionResult<Vec<Uuid>> {
    let team_filter = Filter::tenant(tenant).eq("active", true);
    let (shop, team) = tokio::try_join!(
        fetch_barbershop(backend, tenant),
        async {
            backend
                .query(Collection::TeamMembers, &team_filter, None)
                .await
                .map_err(FunctionError::from)
        },
    )?;

    let mut users: Vec<Uuid> = shop.owner_id.into_iter().collect();
    for row in team {
        let member: LinkedMember = serde_json::from_value(row).map_err(ClientError::from)?;
        match member.user_id {
            Some(user_id) if !users.contains(&user_id) => users.push(user_id),
            _ => {}
        }
    }
    Ok(users)
}

/// POST /create-notification
pub async fn create_notification(
    State(state): State<AppState>,
    payload: Result<Json<AppointmentEvent>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(event) = payload.map_err(|e| FunctionError::Validation(e.body_text()))?;
    event.validate()?;

    let tenant = event.barbershop_id;
    let users = recipients(state.backend.as_ref(), tenant).await?;
    if users.is_empty() {
        tracing::info!(%tenant, "No recipients for notification");
        return Ok(Json(json!({ "success": true, "count": 0 })));
    }

    let message = event.notification_message();
    let rows = users
        .iter()
        .map(|&user_id| {
            serde_json::to_value(NotificationCreate {
                barbershop_id: tenant,
                user_id: Some(user_id),
                title: event.notification_title().to_string(),
                message: message.clone(),
                kind: event.notification_kind(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(ClientError::from)?;

    let inserted = state
        .backend
        .insert_many(Collection::Notifications, rows)
        .await?;
    tracing::info!(%tenant, count = inserted.len(), "Notifications created");

    Ok(Json(json!({ "success": true, "count": inserted.len() })))
}
