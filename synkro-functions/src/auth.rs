//! Caller identity from a bearer token

use async_trait::async_trait;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use synkro_client::{AuthUser, ClientResult, RestGateway};

/// Resolves an access token to the user it was issued to
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// `None` when the token is invalid or expired
    async fn user_for_token(&self, token: &str) -> ClientResult<Option<AuthUser>>;
}

#[async_trait]
impl UserLookup for RestGateway {
    async fn user_for_token(&self, token: &str) -> ClientResult<Option<AuthUser>> {
        RestGateway::user_for_token(self, token).await
    }
}

/// Token of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
