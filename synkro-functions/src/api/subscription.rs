//! check-subscription: billing state of the calling user

use axum::Json;
use axum::extract::State;
use http::HeaderMap;
use shared::billing::SubscriptionStatus;

use crate::auth::bearer_token;
use crate::error::FunctionError;
use crate::state::AppState;

use super::ApiResult;

/// POST /check-subscription
pub async fn check_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<SubscriptionStatus> {
    let token = bearer_token(&headers).ok_or(FunctionError::MissingToken)?;
    let user = state
        .users
        .user_for_token(token)
        .await?
        .ok_or(FunctionError::Unauthenticated)?;
    tracing::info!(user_id = %user.id, "Checking subscription");
    let email = user.email.ok_or(FunctionError::Unauthenticated)?;

    let Some(customer_id) = state.billing.find_customer(&email).await? else {
        tracing::info!(user_id = %user.id, "No billing customer");
        return Ok(Json(SubscriptionStatus::unsubscribed()));
    };

    let (subscription, invoices) = tokio::try_join!(
        state.billing.active_subscription(&customer_id),
        state
            .billing
            .recent_invoices(&customer_id, state.invoice_limit),
    )?;

    let status = match subscription {
        Some(sub) => SubscriptionStatus {
            subscribed: true,
            plan: sub
                .price_id
                .as_deref()
                .and_then(|price| state.plans.plan_for(price))
                .map(String::from),
            price_id: sub.price_id,
            subscription_end: sub.current_period_end,
            invoices,
        },
        None => SubscriptionStatus {
            invoices,
            ..SubscriptionStatus::unsubscribed()
        },
    };
    tracing::info!(
        %customer_id,
        subscribed = status.subscribed,
        plan = status.plan.as_deref().unwrap_or("-"),
        "Subscription checked"
    );
    Ok(Json(status))
}
