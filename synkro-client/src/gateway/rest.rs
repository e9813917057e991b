//! REST gateway for the hosted backend
//!
//! Tables go through the PostgREST API (`/rest/v1`), procedures through
//! `/rest/v1/rpc`, objects through `/storage/v1` and the current user
//! through `/auth/v1/user`.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

use super::{AuthProvider, AuthUser, Collection, Filter, ObjectStorage, Order, RemoteGateway};
use crate::{ClientConfig, ClientError, ClientResult};

/// Error body shapes used by PostgREST, Storage and Auth
#[derive(Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RemoteErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.error_description)
            .or(self.msg)
            .or(self.error)
    }
}

/// HTTP implementation of all gateway capabilities
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestGateway {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// Set the user's access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table_name())
    }

    fn filter_params(filter: &Filter) -> Vec<(String, String)> {
        filter
            .conditions()
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{value}")))
            .collect()
    }

    fn row_params(id: Uuid, filter: &Filter) -> Vec<(String, String)> {
        let mut params = vec![("id".to_string(), format!("eq.{id}"))];
        params.extend(Self::filter_params(filter));
        params
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<RemoteErrorBody>(&text)
                .ok()
                .and_then(RemoteErrorBody::into_message)
                .unwrap_or_else(|| {
                    if text.is_empty() {
                        status.to_string()
                    } else {
                        text
                    }
                });
            tracing::debug!(%status, %message, "Remote call rejected");
            return Err(ClientError::Remote { message });
        }
        Ok(response.json().await?)
    }

    /// First row of a `return=representation` response
    fn single_row(rows: Vec<Value>, collection: Collection, id: Option<Uuid>) -> ClientResult<Value> {
        rows.into_iter().next().ok_or_else(|| match id {
            Some(id) => ClientError::NotFound(format!("{collection} {id}")),
            None => ClientError::InvalidResponse(format!("{collection}: empty insert response")),
        })
    }

    /// Resolve the user behind an arbitrary access token
    ///
    /// Used server-side where the caller's token arrives in a request header.
    pub async fn user_for_token(&self, token: &str) -> ClientResult<Option<AuthUser>> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED || response.status() == StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        Self::handle_response(response).await.map(Some)
    }
}

#[async_trait]
impl RemoteGateway for RestGateway {
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<Order>,
    ) -> ClientResult<Vec<Value>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(Self::filter_params(filter));
        if let Some(order) = order {
            params.push(("order".to_string(), order.to_param()));
        }
        let response = self
            .request(Method::GET, &self.table_url(collection))
            .query(&params)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn insert(&self, collection: Collection, record: Value) -> ClientResult<Value> {
        let response = self
            .request(Method::POST, &self.table_url(collection))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        let rows: Vec<Value> = Self::handle_response(response).await?;
        Self::single_row(rows, collection, None)
    }

    async fn insert_many(
        &self,
        collection: Collection,
        records: Vec<Value>,
    ) -> ClientResult<Vec<Value>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .request(Method::POST, &self.table_url(collection))
            .header("Prefer", "return=representation")
            .json(&records)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        filter: &Filter,
        patch: Value,
    ) -> ClientResult<Value> {
        let response = self
            .request(Method::PATCH, &self.table_url(collection))
            .query(&Self::row_params(id, filter))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let rows: Vec<Value> = Self::handle_response(response).await?;
        Self::single_row(rows, collection, Some(id))
    }

    async fn update_where(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Value,
    ) -> ClientResult<Vec<Value>> {
        let response = self
            .request(Method::PATCH, &self.table_url(collection))
            .query(&Self::filter_params(filter))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn delete(&self, collection: Collection, id: Uuid, filter: &Filter) -> ClientResult<()> {
        let response = self
            .request(Method::DELETE, &self.table_url(collection))
            .query(&Self::row_params(id, filter))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<Value> = Self::handle_response(response).await?;
        Self::single_row(rows, collection, Some(id)).map(|_| ())
    }

    async fn invoke(&self, procedure: &str, args: Value) -> ClientResult<Value> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, procedure);
        let response = self.request(Method::POST, &url).json(&args).send().await?;
        Self::handle_response(response).await
    }
}

#[async_trait]
impl ObjectStorage for RestGateway {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ClientResult<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, key);
        let response = self
            .request(Method::POST, &url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        let _: Value = Self::handle_response(response).await?;
        Ok(self.public_url(bucket, key))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, key)
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> ClientResult<()> {
        let url = format!("{}/storage/v1/object/{}", self.base_url, bucket);
        let response = self
            .request(Method::DELETE, &url)
            .json(&json!({ "prefixes": [key] }))
            .send()
            .await?;
        let _: Value = Self::handle_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for RestGateway {
    async fn current_user(&self) -> ClientResult<Option<AuthUser>> {
        match self.access_token.as_deref() {
            Some(token) => self.user_for_token(token).await,
            None => Ok(None),
        }
    }
}
