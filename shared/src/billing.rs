//! Billing DTOs returned by the `check-subscription` function

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription state of the calling user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub subscribed: bool,
    /// Plan name resolved from the price id ("basic", "pro", ...)
    pub plan: Option<String>,
    pub price_id: Option<String>,
    pub subscription_end: Option<DateTime<Utc>>,
    pub invoices: Vec<InvoiceSummary>,
}

impl SubscriptionStatus {
    /// Caller has no billing customer or no active subscription
    pub fn unsubscribed() -> Self {
        Self {
            subscribed: false,
            plan: None,
            price_id: None,
            subscription_end: None,
            invoices: Vec::new(),
        }
    }
}

/// Invoice as shown on the billing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub id: String,
    pub number: Option<String>,
    /// Amount in the smallest currency unit (cents)
    pub amount_paid: i64,
    pub currency: String,
    pub status: Option<String>,
    pub created: DateTime<Utc>,
    pub hosted_invoice_url: Option<String>,
    pub invoice_pdf: Option<String>,
}
