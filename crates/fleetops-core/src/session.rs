// ── Session boundary ──
//
// Resolves who is signed in before any controller is built. Controllers
// assume a valid session; a denied check surfaces as an authentication
// error here and nowhere else.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fleetops_api::{AuthClient, AuthUser, Filter, Query, TableClient};

use crate::config::AuthCredentials;
use crate::error::CoreError;

const PROFILES_TABLE: &str = "profiles";

/// The signed-in user's profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// An authenticated user, with their profile when one exists.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: AuthUser,
    pub profile: Option<Profile>,
}

impl Session {
    /// Profile name, falling back to the account email.
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.full_name.as_deref())
            .or(self.user.email.as_deref())
            .unwrap_or(&self.user.id)
    }

    pub fn role(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.role.as_deref())
            .or(self.user.role.as_deref())
    }
}

/// Exchange credentials for a user access token.
///
/// API-key credentials are anonymous and yield `None`.
pub async fn authenticate(
    auth: &AuthClient,
    credentials: &AuthCredentials,
) -> Result<Option<(AuthUser, SecretString)>, CoreError> {
    match credentials {
        AuthCredentials::ApiKey(_) => Ok(None),
        AuthCredentials::Session { access_token, .. } => {
            let user = auth.current_user(access_token).await?;
            debug!(user = %user.id, "session token accepted");
            Ok(Some((user, access_token.clone())))
        }
        AuthCredentials::Password {
            email, password, ..
        } => {
            let session = auth.sign_in_with_password(email, password).await?;
            debug!(user = %session.user.id, "signed in with password");
            Ok(Some((session.user, session.access_token)))
        }
    }
}

/// Look up the profile row for `user_id`. A missing row is `None`.
pub async fn load_profile(
    tables: &TableClient,
    user_id: &str,
) -> Result<Option<Profile>, CoreError> {
    let query = Query::new()
        .select("id, full_name, role")
        .filter(Filter::eq("id", user_id))
        .limit(1);
    let Some(row) = tables.select(PROFILES_TABLE, &query).await?.into_iter().next() else {
        return Ok(None);
    };
    serde_json::from_value(serde_json::Value::Object(row))
        .map(Some)
        .map_err(|e| CoreError::Internal(format!("malformed profile row: {e}")))
}

/// Build a session for `user`. Profile lookup failures are logged, not
/// fatal: the account is still signed in.
pub async fn establish(tables: &TableClient, user: AuthUser) -> Session {
    let profile = match load_profile(tables, &user.id).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(user = %user.id, error = %e, "profile lookup failed");
            None
        }
    };
    Session { user, profile }
}
