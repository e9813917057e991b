//! Functions server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Functions server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Hosted backend base URL
    pub supabase_url: String,
    /// Service-role key; bypasses row-level security for server-side writes
    pub service_role_key: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe Price ID for Basic plan (monthly)
    pub stripe_basic_price_id: String,
    /// Stripe Price ID for Pro plan (monthly)
    pub stripe_pro_price_id: String,
    /// Number of invoices returned by check-subscription
    pub invoice_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any name -> value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let secret = |name: &str| -> Result<String, BoxError> {
            match lookup(name).filter(|v| !v.is_empty()) {
                Some(value) => Ok(value),
                None if environment == "development" => Ok(format!("dev-{name}-not-for-production")),
                None => Err(format!("{name} must be set and non-empty in {environment}").into()),
            }
        };

        Ok(Self {
            supabase_url: lookup("SUPABASE_URL").ok_or("SUPABASE_URL must be set")?,
            service_role_key: secret("SUPABASE_SERVICE_ROLE_KEY")?,
            http_port: lookup("HTTP_PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            stripe_secret_key: secret("STRIPE_SECRET_KEY")?,
            stripe_basic_price_id: lookup("STRIPE_BASIC_PRICE_ID")
                .unwrap_or_else(|| "price_basic_monthly".into()),
            stripe_pro_price_id: lookup("STRIPE_PRO_PRICE_ID")
                .unwrap_or_else(|| "price_pro_monthly".into()),
            invoice_limit: lookup("INVOICE_LIMIT")
                .and_then(|n| n.parse().ok())
                .unwrap_or(10),
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = Config::from_lookup(source(&[("SUPABASE_URL", "http://localhost:54321")])).unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.service_role_key, "dev-SUPABASE_SERVICE_ROLE_KEY-not-for-production");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.invoice_limit, 10);
        assert_eq!(config.stripe_pro_price_id, "price_pro_monthly");
    }

    #[test]
    fn test_production_requires_secrets() {
        let err = Config::from_lookup(source(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("ENVIRONMENT", "production"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("STRIPE_SECRET_KEY", ""),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("STRIPE_SECRET_KEY must be set and non-empty in production"));
    }

    #[test]
    fn test_missing_backend_url_fails() {
        assert!(Config::from_lookup(source(&[])).is_err());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = Config::from_lookup(source(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("HTTP_PORT", "9090"),
            ("INVOICE_LIMIT", "3"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.invoice_limit, 3);
    }
}
