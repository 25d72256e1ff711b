//! Hosted content store over a PostgREST-compatible HTTP API

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::{validate_identifier, ContentStore, Filter, Query, StoreError};
use crate::models::{ContentItem, Row};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Client for `{base_url}/rest/v1/{collection}` endpoints
pub struct RestContentStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestContentStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Fetch(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn rows(response: Response) -> Result<Vec<ContentItem>, StoreError> {
        let rows: Vec<Row> = response
            .json()
            .await
            .map_err(|e| StoreError::Fetch(format!("invalid response body: {}", e)))?;
        rows.into_iter().map(normalize).collect()
    }
}

fn normalize(row: Row) -> Result<ContentItem, StoreError> {
    ContentItem::from_row(row).map_err(|e| StoreError::Fetch(format!("malformed row: {}", e)))
}

/// PostgREST literal for an equality operand
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Query string pairs for a read
pub(crate) fn query_params(filter: &Filter, order: Option<&super::OrderHint>) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for predicate in filter.predicates() {
        let operand = if predicate.value.is_null() {
            "is.null".to_string()
        } else {
            format!("eq.{}", literal(&predicate.value))
        };
        params.push((predicate.column.clone(), operand));
    }
    if let Some(hint) = order {
        let direction = if hint.descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{}.{}", hint.column, direction)));
    }
    params
}

/// Map an unsuccessful response onto the store taxonomy
pub(crate) fn classify(status: StatusCode, body: &str, context: &str) -> StoreError {
    if status == StatusCode::NOT_ACCEPTABLE || body.contains("PGRST116") {
        return StoreError::NotFound(context.to_string());
    }
    if status == StatusCode::CONFLICT || body.contains("23505") {
        return StoreError::Conflict(context.to_string());
    }
    let detail = body.chars().take(200).collect::<String>();
    StoreError::Fetch(format!("{}: HTTP {}: {}", context, status, detail))
}

async fn check(response: Response, context: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify(status, &body, context))
}

#[async_trait]
impl ContentStore for RestContentStore {
    async fn fetch(&self, query: &Query) -> Result<Vec<ContentItem>, StoreError> {
        query.validate()?;

        let request = self
            .client
            .get(self.collection_url(&query.collection))
            .query(&query_params(&query.filter, query.order.as_ref()));
        let response = self.authorized(request).send().await?;
        let response = check(response, &query.collection).await?;
        Self::rows(response).await
    }

    async fn fetch_single(&self, collection: &str, filter: &Filter) -> Result<ContentItem, StoreError> {
        validate_identifier(collection)?;
        filter.validate()?;

        let mut params = query_params(filter, None);
        params.push(("limit".to_string(), "1".to_string()));

        let request = self
            .client
            .get(self.collection_url(collection))
            .query(&params)
            .header(header::ACCEPT, SINGLE_OBJECT);
        let response = self.authorized(request).send().await?;
        let response = check(response, collection).await?;

        let row: Row = response
            .json()
            .await
            .map_err(|e| StoreError::Fetch(format!("invalid response body: {}", e)))?;
        normalize(row)
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<ContentItem, StoreError> {
        validate_identifier(collection)?;

        let request = self
            .client
            .post(self.collection_url(collection))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row);
        let response = self.authorized(request).send().await?;
        let response = check(response, collection).await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Fetch(format!("{}: insert returned no row", collection)))
    }

    async fn update(&self, collection: &str, id: &str, mut patch: Row) -> Result<ContentItem, StoreError> {
        validate_identifier(collection)?;
        patch.remove("id");

        let request = self
            .client
            .patch(self.collection_url(collection))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch);
        let response = self.authorized(request).send().await?;
        let context = format!("{}/{}", collection, id);
        let response = check(response, &context).await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound(context))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        validate_identifier(collection)?;

        let request = self
            .client
            .delete(self.collection_url(collection))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", RETURN_REPRESENTATION);
        let response = self.authorized(request).send().await?;
        let context = format!("{}/{}", collection, id);
        let response = check(response, &context).await?;

        if Self::rows(response).await?.is_empty() {
            return Err(StoreError::NotFound(context));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let request = self.client.get(format!("{}/rest/v1/", self.base_url));
        let response = self.authorized(request).send().await?;
        check(response, "ping").await.map(|_| ())
    }
}
