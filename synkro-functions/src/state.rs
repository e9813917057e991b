//! Application state for synkro-functions

use std::sync::Arc;
use synkro_client::{ClientConfig, RemoteGateway};

use crate::auth::UserLookup;
use crate::config::Config;
use crate::stripe::{BillingProvider, PlanPrices, StripeClient};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Backend tables, accessed with the service-role key
    pub backend: Arc<dyn RemoteGateway>,
    /// Bearer token -> user
    pub users: Arc<dyn UserLookup>,
    /// Stripe lookups
    pub billing: Arc<dyn BillingProvider>,
    pub plans: PlanPrices,
    /// Invoices returned by check-subscription
    pub invoice_limit: u32,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: &Config) -> Result<Self, BoxError> {
        let gateway = Arc::new(
            ClientConfig::new(&config.supabase_url, &config.service_role_key)
                .with_access_token(&config.service_role_key)
                .build_gateway()?,
        );
        tracing::info!(url = %gateway.base_url(), "Backend gateway ready");

        Ok(Self {
            backend: gateway.clone(),
            users: gateway,
            billing: Arc::new(StripeClient::new(&config.stripe_secret_key)),
            plans: PlanPrices {
                basic: config.stripe_basic_price_id.clone(),
                pro: config.stripe_pro_price_id.clone(),
            },
            invoice_limit: config.invoice_limit,
        })
    }
}
