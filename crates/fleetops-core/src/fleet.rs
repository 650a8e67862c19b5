// ── Fleet facade ──
//
// Process-owned entry point. Builds the gateway and session once at
// bootstrap and hands out list controllers that share them. There is no
// global state: the shell owns the `Fleet` and drops it on exit.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, warn};

use fleetops_api::{AuthClient, Query, TableClient};

use crate::config::GatewayConfig;
use crate::controller::ListController;
use crate::error::CoreError;
use crate::gateway::{Gateway, RestGateway};
use crate::notify::{Notifier, TracingNotifier};
use crate::overview::{FleetAnalytics, FleetOverview};
use crate::schema::EntityKind;
use crate::session::{self, Session};

/// Shared gateway, notifier and session for one process.
pub struct Fleet<G: Gateway = RestGateway> {
    gateway: Arc<G>,
    notifier: Arc<dyn Notifier>,
    session: Option<Session>,
    auth: Option<(AuthClient, SecretString)>,
}

impl Fleet<RestGateway> {
    /// Authenticate (if the credentials name a user) and build the REST
    /// gateway. Toasts go to the log until [`with_notifier`](Self::with_notifier).
    pub async fn connect(config: &GatewayConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        let url = config.url.as_str();
        let api_key = config.auth.api_key();

        let auth = AuthClient::new(url, api_key, &transport)?;
        let signed_in = session::authenticate(&auth, &config.auth).await?;
        let token = signed_in.as_ref().map(|(_, token)| token);

        let mut tables = TableClient::new(url, api_key, token, &transport)?;
        if let Some(schema) = &config.schema {
            tables = tables.with_schema(schema.clone());
        }

        let (session, auth) = match signed_in {
            Some((user, token)) => {
                let session = session::establish(&tables, user).await;
                info!(user = session.display_name(), "signed in");
                (Some(session), Some((auth, token)))
            }
            None => {
                debug!("connected with project API key only");
                (None, None)
            }
        };

        Ok(Self {
            gateway: Arc::new(RestGateway::new(tables)),
            notifier: Arc::new(TracingNotifier),
            session,
            auth,
        })
    }

    /// Revoke the user token, if there is one. Failures are logged only.
    pub async fn sign_out(&self) {
        if let Some((auth, token)) = &self.auth {
            if let Err(e) = auth.sign_out(token).await {
                warn!(error = %e, "sign-out failed");
            }
        }
    }
}

impl<G: Gateway> Fleet<G> {
    /// Wrap an existing gateway without a session.
    pub fn with_gateway(gateway: Arc<G>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            session: None,
            auth: None,
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// A list controller for `kind` sharing this fleet's gateway.
    pub fn controller(&self, kind: EntityKind) -> ListController<G> {
        ListController::new(kind, Arc::clone(&self.gateway), Arc::clone(&self.notifier))
    }

    /// A list controller over a narrowed query.
    pub fn controller_with(&self, kind: EntityKind, query: Query) -> ListController<G> {
        ListController::with_query(
            kind,
            query,
            Arc::clone(&self.gateway),
            Arc::clone(&self.notifier),
        )
    }

    pub async fn overview(&self) -> Result<FleetOverview, CoreError> {
        FleetOverview::fetch(self.gateway.as_ref()).await
    }

    pub async fn analytics(&self) -> Result<FleetAnalytics, CoreError> {
        FleetAnalytics::fetch(self.gateway.as_ref()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AuthCredentials;
    use crate::testing::{MemoryGateway, RecordingNotifier, row};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn controllers_share_gateway() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.seed(
            EntityKind::Aircraft,
            vec![row(json!({ "id": "a1", "tail_number": "N1" }))],
        );
        let fleet = Fleet::with_gateway(gateway, Arc::new(RecordingNotifier::default()));

        let first = fleet.controller(EntityKind::Aircraft);
        let second = fleet.controller(EntityKind::Aircraft);
        first.load().await.unwrap();
        second.load().await.unwrap();

        assert!(Arc::ptr_eq(first.gateway(), second.gateway()));
        assert_eq!(second.len(), 1);
        assert!(fleet.session().is_none());
    }

    #[tokio::test]
    async fn connect_with_session_token_loads_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1", "email": "lead@example.com", "role": "authenticated"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(header("authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "u1", "full_name": "Sam Reyes", "role": "manager" }
            ])))
            .mount(&server)
            .await;

        let config = GatewayConfig::new(
            Url::parse(&server.uri()).unwrap(),
            AuthCredentials::Session {
                api_key: SecretString::from("anon".to_owned()),
                access_token: SecretString::from("user-jwt".to_owned()),
            },
        );
        let fleet = Fleet::connect(&config).await.unwrap();
        let session = fleet.session().unwrap();
        assert_eq!(session.display_name(), "Sam Reyes");
        assert_eq!(session.role(), Some("manager"));
    }

    #[tokio::test]
    async fn rejected_token_fails_connect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "msg": "invalid JWT"
            })))
            .mount(&server)
            .await;

        let config = GatewayConfig::new(
            Url::parse(&server.uri()).unwrap(),
            AuthCredentials::Session {
                api_key: SecretString::from("anon".to_owned()),
                access_token: SecretString::from("stale".to_owned()),
            },
        );
        let err = Fleet::connect(&config).await.err().unwrap();
        assert!(matches!(err, CoreError::Authentication { .. }));
    }
}
