//! Loyalty Models
//!
//! Cards and coupons are written exclusively by the `add_loyalty_point`
//! stored procedure; the client only reads them (and marks coupons used).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TenantId;

/// Points needed for the procedure to issue a coupon
pub const LOYALTY_POINTS_THRESHOLD: i32 = 10;

/// Per-client loyalty card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyCard {
    pub id: Uuid,
    pub barbershop_id: TenantId,
    pub client_id: Uuid,
    /// Points in the current cycle (reset when a coupon is issued)
    pub points: i32,
    /// Lifetime points
    pub total_points: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LoyaltyCard {
    /// Points still missing before the next coupon
    pub fn points_to_next_coupon(&self) -> i32 {
        (LOYALTY_POINTS_THRESHOLD - self.points).max(0)
    }
}

/// Discount coupon issued by the loyalty procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyCoupon {
    pub id: Uuid,
    pub barbershop_id: TenantId,
    pub client_id: Uuid,
    pub code: String,
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl LoyaltyCoupon {
    /// Unused and not past its expiry
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// Marks a coupon as redeemed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyCouponRedeem {
    pub used: bool,
    pub used_at: DateTime<Utc>,
}

/// Result of the `add_loyalty_point` procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPointResult {
    pub success: bool,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub coupon_generated: bool,
    #[serde(default)]
    pub coupon_code: Option<String>,
    /// Set by the procedure when `success` is false
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(used: bool, expires_at: Option<DateTime<Utc>>) -> LoyaltyCoupon {
        LoyaltyCoupon {
            id: Uuid::new_v4(),
            barbershop_id: TenantId(Uuid::new_v4()),
            client_id: Uuid::new_v4(),
            code: "ABC123".to_string(),
            discount_percentage: Decimal::from(10),
            used,
            used_at: None,
            expires_at,
            created_at: None,
        }
    }

    #[test]
    fn test_coupon_availability() {
        let now = Utc::now();
        assert!(coupon(false, None).is_available(now));
        assert!(coupon(false, Some(now + Duration::days(1))).is_available(now));
        assert!(!coupon(false, Some(now - Duration::days(1))).is_available(now));
        assert!(!coupon(true, None).is_available(now));
    }

    #[test]
    fn test_add_point_result_defaults() {
        let result: AddPointResult =
            serde_json::from_value(serde_json::json!({ "success": false, "error": "no card" }))
                .unwrap();
        assert!(!result.success);
        assert!(!result.coupon_generated);
        assert_eq!(result.error.as_deref(), Some("no card"));
    }
}
