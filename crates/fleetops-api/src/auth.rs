// Async client for the auth endpoints that sit next to the table interface.
//
// Base path: /auth/v1/
// Auth: `apikey` header, plus the user's bearer token where one is needed.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::{handle_empty, handle_response};
use crate::{Error, TransportConfig};

/// The signed-in user as reported by `GET /auth/v1/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Tokens returned by a successful sign-in.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

#[derive(Deserialize)]
struct RawSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    user: AuthUser,
}

impl From<RawSession> for AuthSession {
    fn from(raw: RawSession) -> Self {
        Self {
            access_token: SecretString::from(raw.access_token),
            refresh_token: raw.refresh_token.map(SecretString::from),
            expires_in: raw.expires_in,
            user: raw.user,
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for sign-in and session checks.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AuthClient {
    /// Build a client that sends the project API key on every request.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert("apikey", key_value);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages the `apikey` header).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/auth/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/auth/v1/"));
        }
        Ok(Self { http, base_url: url })
    }

    /// Exchange email + password for a session.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, Error> {
        let url = self.base_url.join("token")?;
        debug!("POST {url} grant_type=password");

        let resp = self
            .http
            .post(url)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let raw: RawSession = handle_response(resp).await.map_err(into_auth_error)?;
        Ok(raw.into())
    }

    /// Resolve the user behind `access_token`, or deny.
    pub async fn current_user(&self, access_token: &SecretString) -> Result<AuthUser, Error> {
        let url = self.base_url.join("user")?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;
        handle_response(resp).await.map_err(into_auth_error)
    }

    /// Revoke the session behind `access_token`.
    pub async fn sign_out(&self, access_token: &SecretString) -> Result<(), Error> {
        let url = self.base_url.join("logout")?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;
        handle_empty(resp).await
    }
}

/// Credential rejections come back as 400/403 from the auth endpoints;
/// surface them all as authentication failures.
fn into_auth_error(err: Error) -> Error {
    match err {
        Error::Api {
            status: 400 | 401 | 403,
            message,
            ..
        } => Error::Authentication { message },
        other => other,
    }
}
