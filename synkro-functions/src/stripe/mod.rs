//! Stripe integration via REST API (no SDK dependency)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shared::billing::InvoiceSummary;
use thiserror::Error;

const STRIPE_API: &str = "https://api.stripe.com/v1";

#[derive(Debug, Error)]
pub enum StripeError {
    #[error("Stripe request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Api(String),
}

impl From<StripeError> for crate::error::FunctionError {
    fn from(e: StripeError) -> Self {
        Self::Billing(e.to_string())
    }
}

/// Monthly price ids of the sellable plans
#[derive(Debug, Clone)]
pub struct PlanPrices {
    pub basic: String,
    pub pro: String,
}

impl PlanPrices {
    /// Plan name for a price id
    pub fn plan_for(&self, price_id: &str) -> Option<&'static str> {
        if price_id == self.basic {
            Some("basic")
        } else if price_id == self.pro {
            Some("pro")
        } else {
            None
        }
    }
}

/// The customer's current active subscription
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSubscription {
    pub id: String,
    pub price_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Billing lookups needed by check-subscription
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Customer id registered for this email
    async fn find_customer(&self, email: &str) -> Result<Option<String>, StripeError>;

    async fn active_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<ActiveSubscription>, StripeError>;

    /// Most recent invoices first
    async fn recent_invoices(
        &self,
        customer_id: &str,
        limit: u32,
    ) -> Result<Vec<InvoiceSummary>, StripeError>;
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Deserialize)]
struct List<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct Customer {
    id: String,
}

#[derive(Deserialize)]
struct Subscription {
    id: String,
    /// Older API versions carry the period on the subscription itself
    #[serde(default)]
    current_period_end: Option<i64>,
    items: List<SubscriptionItem>,
}

#[derive(Deserialize)]
struct SubscriptionItem {
    price: Price,
    #[serde(default)]
    current_period_end: Option<i64>,
}

#[derive(Deserialize)]
struct Price {
    id: String,
}

#[derive(Deserialize)]
struct Invoice {
    id: String,
    number: Option<String>,
    amount_paid: i64,
    currency: String,
    status: Option<String>,
    created: i64,
    hosted_invoice_url: Option<String>,
    invoice_pdf: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

impl From<Subscription> for ActiveSubscription {
    fn from(sub: Subscription) -> Self {
        let item = sub.items.data.into_iter().next();
        let period_end = sub
            .current_period_end
            .or_else(|| item.as_ref().and_then(|i| i.current_period_end));
        Self {
            id: sub.id,
            price_id: item.map(|i| i.price.id),
            current_period_end: period_end.and_then(timestamp),
        }
    }
}

impl From<Invoice> for InvoiceSummary {
    fn from(inv: Invoice) -> Self {
        Self {
            id: inv.id,
            number: inv.number,
            amount_paid: inv.amount_paid,
            currency: inv.currency,
            status: inv.status,
            created: timestamp(inv.created).unwrap_or_default(),
            hosted_invoice_url: inv.hosted_invoice_url,
            invoice_pdf: inv.invoice_pdf,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, StripeError> {
        let resp = self
            .client
            .get(format!("{STRIPE_API}/{path}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .query(query)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = match resp.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => format!("Stripe returned {status}"),
            };
            return Err(StripeError::Api(message));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn find_customer(&self, email: &str) -> Result<Option<String>, StripeError> {
        let customers: List<Customer> = self
            .get("customers", &[("email", email), ("limit", "1")])
            .await?;
        Ok(customers.data.into_iter().next().map(|c| c.id))
    }

    async fn active_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<ActiveSubscription>, StripeError> {
        let subs: List<Subscription> = self
            .get(
                "subscriptions",
                &[("customer", customer_id), ("status", "active"), ("limit", "1")],
            )
            .await?;
        Ok(subs.data.into_iter().next().map(ActiveSubscription::from))
    }

    async fn recent_invoices(
        &self,
        customer_id: &str,
        limit: u32,
    ) -> Result<Vec<InvoiceSummary>, StripeError> {
        let limit = limit.to_string();
        let invoices: List<Invoice> = self
            .get("invoices", &[("customer", customer_id), ("limit", &limit)])
            .await?;
        Ok(invoices.data.into_iter().map(InvoiceSummary::from).collect())
    }
}
