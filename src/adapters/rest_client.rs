use crate::adapters::realtime::SnapshotSource;
use crate::domain::model::Document;
use crate::domain::table::Table;
use crate::utils::error::{DataError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Error code the backend returns when a single-object request matched no rows.
pub const NO_ROWS_CODE: &str = "PGRST116";

const OBJECT_ACCEPT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Thin HTTP client for the remote relational store's REST interface.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base: Url,
    api_key: String,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| DataError::ConfigError {
            message: format!("invalid remote url {:?}: {}", base_url, e),
        })?;
        if base.cannot_be_a_base() {
            return Err(DataError::ConfigError {
                message: format!("remote url {:?} cannot be used as a base", base_url),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base,
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: Table) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DataError::ConfigError {
                message: format!("remote url {} cannot be used as a base", self.base),
            })?
            .pop_if_empty()
            .extend(["rest", "v1", table.as_str()]);
        Ok(url)
    }

    fn request(&self, method: Method, table: Table) -> Result<RequestBuilder> {
        let url = self.table_url(table)?;
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key))
    }

    fn by_id(table: Table, id: &str) -> [(String, String); 1] {
        [(table.id_column().to_string(), format!("eq.{}", id))]
    }

    /// Fetches one row by id; `None` when the backend reports no rows.
    pub async fn select_one(&self, table: Table, id: &str) -> Result<Option<Value>> {
        tracing::debug!(table = %table, id, "remote select one");
        let response = self
            .request(Method::GET, table)?
            .header("Accept", OBJECT_ACCEPT)
            .query(&Self::by_id(table, id))
            .query(&[("select", "*")])
            .send()
            .await?;

        match check(response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(e) if is_no_rows(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn select(&self, table: Table, params: &[(String, String)]) -> Result<Vec<Value>> {
        tracing::debug!(table = %table, params = ?params, "remote select");
        let response = self
            .request(Method::GET, table)?
            .query(params)
            .send()
            .await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn insert(&self, table: Table, row: &Document) -> Result<Value> {
        tracing::debug!(table = %table, "remote insert");
        let response = self
            .request(Method::POST, table)?
            .header("Prefer", RETURN_REPRESENTATION)
            .json(row)
            .send()
            .await?;
        let response = check(response).await?;

        match response.json::<Value>().await? {
            Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
            Value::Object(row) => Ok(Value::Object(row)),
            other => Err(DataError::BackendError {
                code: None,
                message: format!("insert into {} returned no row: {}", table, other),
            }),
        }
    }

    /// Patches the given columns; `None` when no row has that id.
    pub async fn update(&self, table: Table, id: &str, columns: &Document) -> Result<Option<Value>> {
        tracing::debug!(table = %table, id, columns = columns.len(), "remote update");
        let response = self
            .request(Method::PATCH, table)?
            .header("Accept", OBJECT_ACCEPT)
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&Self::by_id(table, id))
            .json(columns)
            .send()
            .await?;

        match check(response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(e) if is_no_rows(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Deleting an id that does not exist succeeds.
    pub async fn delete(&self, table: Table, id: &str) -> Result<()> {
        tracing::debug!(table = %table, id, "remote delete");
        let response = self
            .request(Method::DELETE, table)?
            .query(&Self::by_id(table, id))
            .send()
            .await?;

        match check(response).await {
            Ok(_) => Ok(()),
            Err(e) if is_no_rows(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SnapshotSource for RestClient {
    async fn snapshot(&self, table: Table) -> Result<Vec<Value>> {
        self.select(table, &[("select".to_string(), "*".to_string())])
            .await
    }
}

pub fn is_no_rows(err: &DataError) -> bool {
    matches!(err, DataError::BackendError { code: Some(code), .. } if code == NO_ROWS_CODE)
}

/// Passes successful responses through and turns everything else into a typed error.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed: Option<ErrorBody> = serde_json::from_str(&body).ok();

    if matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    ) {
        return Err(DataError::BackendUnavailable {
            message: format!("remote backend returned {}", status),
        });
    }

    let (code, message) = match parsed {
        Some(err) => {
            let message = match (err.message, err.details) {
                (Some(message), Some(details)) => format!("{} ({})", message, details),
                (Some(message), None) => message,
                (None, Some(details)) => details,
                (None, None) => status.to_string(),
            };
            (err.code.or_else(|| Some(status.as_u16().to_string())), message)
        }
        None if body.trim().is_empty() => (Some(status.as_u16().to_string()), status.to_string()),
        None => (Some(status.as_u16().to_string()), body),
    };

    Err(DataError::BackendError { code, message })
}
