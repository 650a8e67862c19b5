// Hand-crafted async HTTP client for a PostgREST-style table interface.
//
// Base path: /rest/v1/
// Auth: `apikey` header + `Authorization: Bearer <token>`

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::query::{Filter, Query, select_param};
use crate::{Error, TransportConfig};

/// One row as returned by the table interface.
pub type Row = serde_json::Map<String, serde_json::Value>;

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_COUNT: &str = "count=exact";

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the table interface.
///
/// Every call is a single HTTP request: no retries, no caching. Errors
/// come back with the backend's own message.
#[derive(Debug, Clone)]
pub struct TableClient {
    http: reqwest::Client,
    base_url: Url,
    schema: Option<String>,
}

impl TableClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from the project API key and an optional user access token.
    ///
    /// Without a token the API key doubles as the bearer credential, which
    /// gives the anonymous role's row-level permissions.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        access_token: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let headers = auth_headers(api_key, access_token)?;
        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            schema: None,
        })
    }

    /// Target a non-default schema via `Accept-Profile` / `Content-Profile`.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// The resolved `/rest/v1/` base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `https://host` → `https://host/rest/v1/`; an explicit `/rest/v1`
    /// suffix is kept as-is.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/rest/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/rest/v1/"));
        }

        Ok(url)
    }

    fn url(&self, table: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(table)?)
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, Error> {
        let url = self.url(table)?;
        debug!("{method} {url}");

        let writes = method != Method::GET && method != Method::HEAD;
        let mut req = self.http.request(method, url);
        if let Some(ref schema) = self.schema {
            let header = if writes {
                "Content-Profile"
            } else {
                "Accept-Profile"
            };
            req = req.header(header, schema);
        }
        Ok(req)
    }

    // ── Table operations ─────────────────────────────────────────────

    /// Fetch rows matching `query`, in the order the backend returns them.
    pub async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, Error> {
        let params = query.params();
        debug!(table, ?params, "select");

        let resp = self
            .request(Method::GET, table)?
            .query(&params)
            .send()
            .await?;
        handle_response(resp).await
    }

    /// Insert one row and return the stored representation, including the
    /// server-assigned `id`. `select` shapes the returned row the same way
    /// it shapes a read, embedded joins included.
    pub async fn insert(&self, table: &str, row: &Row, select: Option<&str>) -> Result<Row, Error> {
        let params: Vec<(String, String)> = select.map(select_param).into_iter().collect();
        let resp = self
            .request(Method::POST, table)?
            .query(&params)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(row)
            .send()
            .await?;
        let rows: Vec<Row> = handle_response(resp).await?;
        rows.into_iter().next().ok_or_else(|| Error::EmptyResponse {
            table: table.to_owned(),
        })
    }

    /// Update the row with `id` and return its new representation,
    /// projected through `select` when given.
    pub async fn update(
        &self,
        table: &str,
        id: &str,
        row: &Row,
        select: Option<&str>,
    ) -> Result<Row, Error> {
        let mut params: Vec<(String, String)> = select.map(select_param).into_iter().collect();
        params.push(("id".to_owned(), format!("eq.{id}")));
        let resp = self
            .request(Method::PATCH, table)?
            .query(&params)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(row)
            .send()
            .await?;
        let rows: Vec<Row> = handle_response(resp).await?;
        rows.into_iter().next().ok_or_else(|| Error::RowNotFound {
            table: table.to_owned(),
            id: id.to_owned(),
        })
    }

    /// Delete the row with `id`. Deleting an absent id is not an error.
    pub async fn delete(&self, table: &str, id: &str) -> Result<(), Error> {
        let resp = self
            .request(Method::DELETE, table)?
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        handle_empty(resp).await
    }

    /// Exact row count for `filters`, read from the `Content-Range` header
    /// of a `HEAD` request.
    pub async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, Error> {
        let params: Vec<(String, String)> = filters.iter().map(Filter::to_param).collect();
        let resp = self
            .request(Method::HEAD, table)?
            .query(&params)
            .header("Prefer", PREFER_COUNT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }

        let range = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        parse_content_range(&range)
    }
}

// ── Headers ──────────────────────────────────────────────────────────

pub(crate) fn auth_headers(
    api_key: &SecretString,
    access_token: Option<&SecretString>,
) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();

    let mut key_value =
        HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
            message: format!("invalid API key header value: {e}"),
        })?;
    key_value.set_sensitive(true);
    headers.insert("apikey", key_value);

    let bearer = access_token.unwrap_or(api_key).expose_secret();
    let mut bearer_value = HeaderValue::from_str(&format!("Bearer {bearer}")).map_err(|e| {
        Error::Authentication {
            message: format!("invalid access token header value: {e}"),
        }
    })?;
    bearer_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer_value);

    Ok(headers)
}

// ── Response handling ────────────────────────────────────────────────

pub(crate) async fn handle_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    } else {
        Err(parse_error(status, resp).await)
    }
}

pub(crate) async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

pub(crate) async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    let (message, code) = match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(err) => (
            err.message.or(err.msg).or(err.error_description),
            err.code.map(|c| match c {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
        ),
        Err(_) => (None, None),
    };
    let message = message.unwrap_or_else(|| {
        if raw.is_empty() {
            status.to_string()
        } else {
            raw
        }
    });

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::Authentication { message };
    }

    Error::Api {
        message,
        code,
        status: status.as_u16(),
    }
}

/// Parse `0-24/3573` or `*/0` into the total.
fn parse_content_range(value: &str) -> Result<u64, Error> {
    value
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
        .ok_or_else(|| Error::InvalidCount(value.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn content_range_with_rows() {
        assert_eq!(parse_content_range("0-24/3573").unwrap(), 3573);
    }

    #[test]
    fn content_range_empty_table() {
        assert_eq!(parse_content_range("*/0").unwrap(), 0);
    }

    #[test]
    fn content_range_without_total_is_rejected() {
        assert!(matches!(
            parse_content_range("0-24/*"),
            Err(Error::InvalidCount(_))
        ));
        assert!(matches!(parse_content_range(""), Err(Error::InvalidCount(_))));
    }

    #[test]
    fn base_url_gets_rest_prefix() {
        let client =
            TableClient::from_reqwest("https://fleet.example.com", reqwest::Client::new()).unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://fleet.example.com/rest/v1/"
        );
    }

    #[test]
    fn base_url_keeps_explicit_rest_prefix() {
        let client = TableClient::from_reqwest(
            "https://fleet.example.com/rest/v1/",
            reqwest::Client::new(),
        )
        .unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://fleet.example.com/rest/v1/"
        );
    }
}
