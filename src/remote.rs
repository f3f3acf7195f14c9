//! Remote order mirror.
//!
//! [`RemoteOrders`] is the record-oriented upsert surface the sync bridge
//! talks to. [`PocketBaseClient`] implements it over the PocketBase records
//! REST API (`/api/collections/{collection}/records`).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

use crate::auth::TokenSession;
use crate::config::Config;
use crate::models::{ConfirmedOrder, OrderStatus, PaymentMethod};

const PAGE_SIZE: u32 = 200;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote record not found")]
    NotFound,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid remote payload: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Decode(e.to_string())
    }
}

/// Remote shape of a confirmed order, keyed by the local id in `order_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteOrderRecord {
    pub order_id: String,
    pub order_number: u32,
    /// Line items as a JSON string.
    pub items: String,
    pub total: f64,
    /// RFC 3339, UTC.
    pub date: String,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl RemoteOrderRecord {
    pub fn from_order(order: &ConfirmedOrder, user: Option<&str>) -> Result<Self, RemoteError> {
        Ok(Self {
            order_id: order.id.clone(),
            order_number: order.order_number,
            items: serde_json::to_string(&order.items)?,
            total: order.total,
            date: order.date.with_timezone(&chrono::Utc).to_rfc3339(),
            status: order.status,
            payment_method: order.payment_method,
            user: user.map(str::to_string),
        })
    }

    pub fn into_order(self) -> Result<ConfirmedOrder, RemoteError> {
        let date = chrono::DateTime::parse_from_rfc3339(&self.date)
            .map_err(|e| RemoteError::Decode(format!("date {}: {e}", self.date)))?;
        Ok(ConfirmedOrder {
            id: self.order_id,
            order_number: self.order_number,
            items: serde_json::from_str(&self.items)?,
            total: self.total,
            date,
            status: self.status,
            payment_method: self.payment_method,
        })
    }
}

#[async_trait]
pub trait RemoteOrders: Send + Sync {
    /// Remote record id for `order_id`, or [`RemoteError::NotFound`].
    async fn find_by_order_id(&self, order_id: &str) -> Result<String, RemoteError>;

    /// Returns the new remote record id.
    async fn create(&self, record: &RemoteOrderRecord) -> Result<String, RemoteError>;

    async fn update(&self, record_id: &str, record: &RemoteOrderRecord) -> Result<(), RemoteError>;

    /// All records owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<RemoteOrderRecord>, RemoteError>;
}

#[derive(Deserialize)]
struct RecordId {
    id: String,
}

#[derive(Deserialize)]
struct ListPage<T> {
    items: Vec<T>,
    /// -1 when the request used `skipTotal`.
    #[serde(rename = "totalPages", default)]
    total_pages: i64,
}

impl<T> ListPage<T> {
    /// Whether another page should be requested after `page_no`.
    fn has_more(&self, page_no: u32) -> bool {
        !self.items.is_empty() && i64::from(page_no) < self.total_pages
    }
}

/// Map a non-success response status to an error.
fn status_error(status: StatusCode, body: String) -> RemoteError {
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthenticated,
        _ => RemoteError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

fn first_record_id(page: ListPage<RecordId>) -> Result<String, RemoteError> {
    page.items
        .into_iter()
        .next()
        .map(|r| r.id)
        .ok_or(RemoteError::NotFound)
}

/// Quote a value for a PocketBase filter expression.
fn filter_eq(field: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{field} = \"{escaped}\"")
}

pub struct PocketBaseClient {
    client: Client,
    base_url: String,
    collection: String,
    session: Arc<TokenSession>,
}

impl PocketBaseClient {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        timeout: Duration,
        session: Arc<TokenSession>,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            session,
        })
    }

    /// `None` when no remote URL is configured.
    pub fn from_config(
        config: &Config,
        session: Arc<TokenSession>,
    ) -> Result<Option<Self>, RemoteError> {
        match &config.remote_url {
            Some(url) => Self::new(
                url.clone(),
                config.remote_collection.clone(),
                Duration::from_secs(config.http_timeout_secs),
                session,
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn records_url(&self) -> String {
        format!("{}/api/collections/{}/records", self.base_url, self.collection)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, RemoteError> {
        let token = self.session.token().ok_or(RemoteError::Unauthenticated)?;
        Ok(builder.header("Authorization", token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let resp = self.authorized(builder)?.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }
}

#[async_trait]
impl RemoteOrders for PocketBaseClient {
    async fn find_by_order_id(&self, order_id: &str) -> Result<String, RemoteError> {
        let filter = filter_eq("order_id", order_id);
        trace!(filter = %filter, "remote lookup");
        let builder = self.client.get(self.records_url()).query(&[
            ("page", "1"),
            ("perPage", "1"),
            ("skipTotal", "1"),
            ("fields", "id"),
            ("filter", filter.as_str()),
        ]);
        let page: ListPage<RecordId> = self.send(builder).await?.json().await?;
        first_record_id(page)
    }

    async fn create(&self, record: &RemoteOrderRecord) -> Result<String, RemoteError> {
        let builder = self.client.post(self.records_url()).json(record);
        let created: RecordId = self.send(builder).await?.json().await?;
        debug!(record_id = %created.id, order_id = %record.order_id, "remote order created");
        Ok(created.id)
    }

    async fn update(&self, record_id: &str, record: &RemoteOrderRecord) -> Result<(), RemoteError> {
        let url = format!("{}/{}", self.records_url(), record_id);
        self.send(self.client.patch(url).json(record)).await?;
        debug!(record_id = %record_id, order_id = %record.order_id, "remote order updated");
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<RemoteOrderRecord>, RemoteError> {
        let filter = filter_eq("user", user_id);
        let per_page = PAGE_SIZE.to_string();
        let mut records = Vec::new();
        let mut page_no: u32 = 1;

        loop {
            let page_param = page_no.to_string();
            let builder = self.client.get(self.records_url()).query(&[
                ("page", page_param.as_str()),
                ("perPage", per_page.as_str()),
                ("sort", "-created"),
                ("filter", filter.as_str()),
            ]);
            let page: ListPage<RemoteOrderRecord> = self.send(builder).await?.json().await?;
            let more = page.has_more(page_no);
            records.extend(page.items);

            if !more {
                break;
            }
            page_no += 1;
        }

        Ok(records)
    }
}
