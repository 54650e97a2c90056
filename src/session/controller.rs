use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::preferences::Preferences;
use super::state::{Session, SessionStatus};
use crate::config::{IdentityEndpoints, PreferencesConfig};
use crate::errors::{ErrorPayload, SessionError, TransportError};
use crate::guard::SessionAuthority;
use crate::models::{Credentials, Registration, TokenGrant, UserProfile};
use crate::store::TokenStore;
use crate::transport::{ApiRequest, AuthenticatedTransport, SessionExpiry};

pub const LOGIN_FAILED: &str = "Login failed, please check your username and password";
pub const NO_RESPONSE: &str = "No response from server, please check your network connection";

#[derive(Debug, Default)]
struct Inner {
    session: Session,
    pending: usize,
}

/// Owns the in-memory session and every transition of it.
pub struct SessionController {
    transport: Arc<AuthenticatedTransport>,
    tokens: Arc<TokenStore>,
    endpoints: IdentityEndpoints,
    preferences: Option<Preferences>,
    inner: Mutex<Inner>,
}

/// Keeps `loading` set while at least one network operation runs.
struct Loading<'a> {
    controller: &'a SessionController,
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        let mut inner = self.controller.inner();
        inner.pending = inner.pending.saturating_sub(1);
        inner.session.loading = inner.pending > 0;
    }
}

impl SessionController {
    pub fn new(
        transport: Arc<AuthenticatedTransport>,
        endpoints: IdentityEndpoints,
        prefs_config: &PreferencesConfig,
    ) -> Self {
        let tokens = transport.tokens().clone();
        let preferences = prefs_config
            .enabled
            .then(|| Preferences::new(transport.clone(), &endpoints, prefs_config));
        // Start from whatever a previous run left behind, like a reopened tab.
        let session = Session {
            token: tokens.read(),
            ..Session::default()
        };
        Self {
            transport,
            tokens,
            endpoints,
            preferences,
            inner: Mutex::new(Inner {
                session,
                pending: 0,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn begin_loading(&self) -> Loading<'_> {
        let mut inner = self.inner();
        inner.pending += 1;
        inner.session.loading = true;
        Loading { controller: self }
    }

    fn update(&self, f: impl FnOnce(&mut Session)) {
        f(&mut self.inner().session);
    }

    fn fail(&self, message: String) {
        warn!(
            event_name = "session.error",
            event_domain = "session",
            reason = message.as_str(),
            "session operation failed"
        );
        self.update(|s| {
            s.status = SessionStatus::Error;
            s.error = Some(message);
        });
    }

    pub fn snapshot(&self) -> Session {
        self.inner().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner().session.is_authenticated()
    }

    pub fn username(&self) -> String {
        self.inner().session.display_name().to_string()
    }

    pub fn error(&self) -> Option<String> {
        self.inner().session.error.clone()
    }

    pub fn preferences(&self) -> Option<&Preferences> {
        self.preferences.as_ref()
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Have the transport reset this session whenever a 401 wipes the
    /// stored token.
    pub fn watch_expiry(self: &Arc<Self>) {
        let handler: Weak<dyn SessionExpiry> = Arc::downgrade(self) as Weak<SessionController>;
        self.transport.set_expiry_handler(handler);
    }

    /// Exchange credentials for a token. Failures end up in `error()`.
    pub async fn login(&self, credentials: &Credentials, remember: bool) -> bool {
        let _loading = self.begin_loading();
        self.update(|s| {
            s.status = SessionStatus::Authenticating;
            s.error = None;
        });
        info!(
            event_name = "session.login.started",
            event_domain = "session",
            username = credentials.username.as_str(),
            remember,
            "logging in"
        );

        let outcome = match self.authenticate(credentials, remember).await {
            Ok(()) => {
                if let Some(prefs) = &self.preferences {
                    prefs.refresh_personalities().await;
                }
                self.still_authenticated()
            }
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => {
                info!(
                    event_name = "session.login.succeeded",
                    event_domain = "session",
                    username = credentials.username.as_str(),
                    "logged in"
                );
                true
            }
            Err(e) => {
                let message = login_failure_message(&e);
                self.tokens.clear();
                self.update(|s| {
                    s.token = None;
                    s.user = None;
                });
                self.fail(message);
                false
            }
        }
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
        remember: bool,
    ) -> Result<(), TransportError> {
        let grant: TokenGrant = self
            .transport
            .post_form(&self.endpoints.login, &credentials.form_fields())
            .await?;
        self.tokens.write(&grant.access_token, remember);
        self.update(|s| s.token = Some(grant.access_token));

        match self.fetch_user_info().await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(TransportError::Unauthorized(ErrorPayload::default())),
            Err(SessionError::ProfileFetch(e)) | Err(SessionError::Transport(e)) => Err(e),
        }
    }

    /// A 401 on any follow-up request may have ended the session meanwhile.
    fn still_authenticated(&self) -> Result<(), TransportError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(TransportError::Unauthorized(ErrorPayload::default()))
        }
    }

    /// Create an account, then log straight into it with `remember` set.
    pub async fn register(&self, registration: &Registration) -> bool {
        let _loading = self.begin_loading();
        self.update(|s| s.error = None);
        info!(
            event_name = "session.register.started",
            event_domain = "session",
            username = registration.username.as_str(),
            "registering"
        );

        let request = match ApiRequest::post(&self.endpoints.register).json(registration) {
            Ok(request) => request,
            Err(e) => {
                self.fail(registration_failure_message(&e));
                return false;
            }
        };
        match self.transport.send(request).await {
            Ok(_) => {
                info!(
                    event_name = "session.register.succeeded",
                    event_domain = "session",
                    username = registration.username.as_str(),
                    "account created"
                );
                self.login(&registration.credentials(), true).await
            }
            Err(e) => {
                self.fail(registration_failure_message(&e));
                false
            }
        }
    }

    /// Load the profile for the in-memory token. Any failure logs out.
    pub async fn fetch_user_info(&self) -> Result<Option<UserProfile>, SessionError> {
        if self.inner().session.token.is_none() {
            return Ok(None);
        }

        let _loading = self.begin_loading();
        match self
            .transport
            .get_json::<UserProfile>(&self.endpoints.profile)
            .await
        {
            Ok(profile) => {
                self.update(|s| {
                    s.user = Some(profile.clone());
                    s.status = SessionStatus::Authenticated;
                    s.error = None;
                });
                debug!(username = profile.username().unwrap_or_default(), "profile loaded");
                if let Some(prefs) = &self.preferences {
                    prefs.load_settings().await;
                }
                Ok(self.is_authenticated().then_some(profile))
            }
            Err(e) => {
                warn!(
                    event_name = "session.profile.failed",
                    event_domain = "session",
                    error = %e,
                    "failed to load profile, logging out"
                );
                self.logout();
                Err(SessionError::ProfileFetch(e))
            }
        }
    }

    /// Rebuild the session from storage and validate it with the server.
    pub async fn check_auth(&self) -> Option<UserProfile> {
        self.tokens.reconcile();
        match self.tokens.read() {
            Some(token) => {
                debug!("stored token found, validating");
                self.update(|s| s.token = Some(token));
                match self.fetch_user_info().await {
                    Ok(Some(profile)) => {
                        if let Some(prefs) = &self.preferences {
                            prefs.refresh_personalities().await;
                        }
                        self.is_authenticated().then_some(profile)
                    }
                    Ok(None) => None,
                    // fetch_user_info has already logged out.
                    Err(e) => {
                        debug!(error = %e, "stored token rejected");
                        None
                    }
                }
            }
            None => {
                if self.inner().session.token.is_some() {
                    warn!(
                        event_name = "session.token.orphaned",
                        event_domain = "session",
                        "in-memory token has no stored counterpart, logging out"
                    );
                    self.logout();
                }
                None
            }
        }
    }

    /// Forget the user and every stored token. The personality choice stays.
    pub fn logout(&self) {
        self.end_session();
        self.tokens.clear();
        info!(
            event_name = "session.logout",
            event_domain = "session",
            "logged out"
        );
    }

    /// Drop in-memory session state. Storage is left to the caller.
    fn end_session(&self) {
        self.update(Session::reset);
        if let Some(prefs) = &self.preferences {
            prefs.forget_personalities();
        }
    }
}

impl SessionExpiry for SessionController {
    fn session_expired(&self) {
        warn!(
            event_name = "session.expired",
            event_domain = "session",
            "stored token rejected by server, session ended"
        );
        self.end_session();
    }
}

#[async_trait]
impl SessionAuthority for SessionController {
    fn is_authenticated(&self) -> bool {
        SessionController::is_authenticated(self)
    }

    fn has_persisted_token(&self) -> bool {
        self.tokens.has_token()
    }

    async fn recover(&self) -> Result<Option<UserProfile>, SessionError> {
        Ok(self.check_auth().await)
    }
}

fn login_failure_message(error: &TransportError) -> String {
    if let Some(detail) = error.payload().and_then(|p| p.detail()) {
        return detail;
    }
    if error.is_network() {
        return NO_RESPONSE.to_string();
    }
    LOGIN_FAILED.to_string()
}

fn registration_failure_message(error: &TransportError) -> String {
    match (error.payload(), error.status()) {
        (Some(payload), Some(status)) => payload
            .describe()
            .unwrap_or_else(|| format!("Error ({})", status)),
        _ if error.is_network() => NO_RESPONSE.to_string(),
        _ => format!("Request error: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::errors::ErrorPayload;
    use crate::store::testing::{memory_store, CountingTier};
    use crate::store::{MemoryTier, StorageTier, PERSONALITY_KEY, REMEMBER_KEY, TOKEN_KEY};
    use crate::transport::{Location, Navigator};
    use mockito::{Matcher, Server};

    struct Fixture {
        controller: Arc<SessionController>,
        durable: Arc<MemoryTier>,
        session: Arc<MemoryTier>,
        location: Arc<Location>,
    }

    fn fixture(server: &Server, at: &str) -> Fixture {
        let (tokens, durable, session) = memory_store();
        let api = ApiConfig {
            base_url: server.url(),
            ..ApiConfig::default()
        };
        let location = Arc::new(Location::new(at));
        let transport =
            Arc::new(AuthenticatedTransport::new(&api, "/login", tokens, location.clone()).unwrap());
        let controller = Arc::new(SessionController::new(
            transport,
            IdentityEndpoints::default(),
            &PreferencesConfig::default(),
        ));
        controller.watch_expiry();
        Fixture {
            controller,
            durable,
            session,
            location,
        }
    }

    async fn mock_profile(server: &mut Server, token: &str) -> mockito::Mock {
        server
            .mock("GET", "/users/me")
            .match_query(Matcher::Any)
            .match_header("authorization", format!("Bearer {}", token).as_str())
            .with_status(200)
            .with_body(r#"{"id":7,"username":"alice","email":"alice@example.com"}"#)
            .create_async()
            .await
    }

    async fn mock_preferences(server: &mut Server) -> (mockito::Mock, mockito::Mock) {
        let settings = server
            .mock("GET", "/users/settings")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"personality_id":2}"#)
            .create_async()
            .await;
        let personalities = server
            .mock("GET", "/chat/personalities")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id":1,"name":"Warm"},{"id":2,"name":"Frugal"}]"#)
            .create_async()
            .await;
        (settings, personalities)
    }

    #[tokio::test]
    async fn login_with_remember_persists_and_authenticates() {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/users/login")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "alice".into()),
                Matcher::UrlEncoded("password".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"t1","token_type":"bearer"}"#)
            .create_async()
            .await;
        let profile = mock_profile(&mut server, "t1").await;
        let _m = mock_preferences(&mut server).await;
        let f = fixture(&server, "/login");

        assert!(f.controller.login(&Credentials::new("alice", "secret"), true).await);

        login.assert_async().await;
        profile.assert_async().await;
        let session = f.controller.snapshot();
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert!(!session.loading);
        assert!(session.error.is_none());
        assert_eq!(f.controller.username(), "alice");
        assert_eq!(f.durable.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
        assert_eq!(f.durable.get(REMEMBER_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(f.session.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));

        let prefs = f.controller.preferences().unwrap();
        assert_eq!(prefs.current_personality_id(), Some(2));
        assert_eq!(prefs.current_personality().map(|p| p.name), Some("Frugal".to_string()));
    }

    #[tokio::test]
    async fn login_without_remember_stays_in_session_tier() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/users/login")
            .with_status(200)
            .with_body(r#"{"access_token":"t1"}"#)
            .create_async()
            .await;
        let _m = mock_profile(&mut server, "t1").await;
        let _m = mock_preferences(&mut server).await;
        let f = fixture(&server, "/login");

        assert!(f.controller.login(&Credentials::new("alice", "secret"), false).await);

        assert_eq!(f.durable.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(f.durable.get(REMEMBER_KEY).unwrap(), None);
        assert_eq!(f.session.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn rejected_login_reports_server_detail() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/users/login")
            .with_status(401)
            .with_body(r#"{"detail":"bad credentials"}"#)
            .create_async()
            .await;
        let f = fixture(&server, "/login");
        f.durable.set(TOKEN_KEY, "old").unwrap();

        assert!(!f.controller.login(&Credentials::new("alice", "wrong"), false).await);

        let session = f.controller.snapshot();
        assert_eq!(session.status, SessionStatus::Error);
        assert_eq!(session.error.as_deref(), Some("bad credentials"));
        assert!(!session.loading);
        assert_eq!(f.durable.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(f.session.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(f.location.current(), "/login");
    }

    #[tokio::test]
    async fn login_without_detail_uses_generic_message() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/users/login")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;
        let f = fixture(&server, "/login");

        assert!(!f.controller.login(&Credentials::new("alice", "secret"), false).await);
        assert_eq!(f.controller.error().as_deref(), Some(LOGIN_FAILED));
    }

    #[tokio::test]
    async fn login_fails_when_profile_cannot_be_loaded() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/users/login")
            .with_status(200)
            .with_body(r#"{"access_token":"t1"}"#)
            .create_async()
            .await;
        let _m = server
            .mock("GET", "/users/me")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let f = fixture(&server, "/login");

        assert!(!f.controller.login(&Credentials::new("alice", "secret"), true).await);
        assert_eq!(f.controller.snapshot().status, SessionStatus::Error);
        assert_eq!(f.durable.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(f.session.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_server_reports_connectivity_message() {
        let (tokens, _, _) = memory_store();
        let api = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiConfig::default()
        };
        let transport = Arc::new(
            AuthenticatedTransport::new(&api, "/login", tokens, Arc::new(Location::new("/login")))
                .unwrap(),
        );
        let controller = SessionController::new(
            transport,
            IdentityEndpoints::default(),
            &PreferencesConfig::default(),
        );

        assert!(!controller.login(&Credentials::new("alice", "secret"), false).await);
        assert_eq!(controller.error().as_deref(), Some(NO_RESPONSE));
        assert!(!controller.register(&Registration::new("a", "a@x", "p")).await);
        assert_eq!(controller.error().as_deref(), Some(NO_RESPONSE));
    }

    #[tokio::test]
    async fn register_logs_in_with_remember() {
        let mut server = Server::new_async().await;
        let register = server
            .mock("POST", "/users/register")
            .match_body(Matcher::Json(serde_json::json!({
                "username": "bob",
                "email": "bob@example.com",
                "password": "pw"
            })))
            .with_status(201)
            .with_body(r#"{"id":8}"#)
            .create_async()
            .await;
        let _m = server
            .mock("POST", "/users/login")
            .match_body(Matcher::UrlEncoded("username".into(), "bob".into()))
            .with_status(200)
            .with_body(r#"{"access_token":"t9"}"#)
            .create_async()
            .await;
        let _m = mock_profile(&mut server, "t9").await;
        let _m = mock_preferences(&mut server).await;
        let f = fixture(&server, "/register");

        assert!(
            f.controller
                .register(&Registration::new("bob", "bob@example.com", "pw"))
                .await
        );
        register.assert_async().await;
        assert!(f.controller.is_authenticated());
        assert_eq!(f.durable.get(REMEMBER_KEY).unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn register_failure_messages_follow_preference_order() {
        let mut server = Server::new_async().await;
        let f = fixture(&server, "/register");
        let reg = Registration::new("bob", "bob@example.com", "pw");

        for (status, body, expected) in [
            (400, r#"{"detail":"Username already registered"}"#, "Username already registered"),
            (422, r#"{"errors":["email"]}"#, r#"{"errors":["email"]}"#),
            (500, "database down", "database down"),
            (503, "", "Error (503)"),
        ] {
            let m = server
                .mock("POST", "/users/register")
                .with_status(status)
                .with_body(body)
                .create_async()
                .await;
            assert!(!f.controller.register(&reg).await);
            assert_eq!(f.controller.error().as_deref(), Some(expected));
            m.remove_async().await;
        }
    }

    #[test]
    fn request_errors_are_prefixed() {
        let message = registration_failure_message(&TransportError::Request("bad url".into()));
        assert_eq!(message, "Request error: invalid request: bad url");
        let message = registration_failure_message(&TransportError::Status {
            status: 404,
            payload: ErrorPayload::default(),
        });
        assert_eq!(message, "Error (404)");
    }

    #[tokio::test]
    async fn fetch_user_info_without_token_skips_network() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/users/me")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let f = fixture(&server, "/");

        assert!(f.controller.fetch_user_info().await.unwrap().is_none());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_user_info_failure_logs_out() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/users/me")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let f = fixture(&server, "/chat");
        f.session.set(TOKEN_KEY, "t1").unwrap();
        f.controller.update(|s| s.token = Some("t1".to_string()));

        let err = f.controller.fetch_user_info().await.unwrap_err();
        assert!(matches!(err, SessionError::ProfileFetch(_)));
        assert!(f.controller.snapshot().token.is_none());
        assert_eq!(f.session.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn check_auth_recovers_from_durable_tier() {
        let mut server = Server::new_async().await;
        let profile = mock_profile(&mut server, "t1").await;
        let _m = mock_preferences(&mut server).await;
        let f = fixture(&server, "/");
        f.durable.set(TOKEN_KEY, "t1").unwrap();
        f.durable.set(REMEMBER_KEY, "true").unwrap();

        let user = f.controller.check_auth().await.unwrap();

        profile.assert_async().await;
        assert_eq!(user.username(), Some("alice"));
        assert_eq!(f.session.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
        assert!(f.controller.is_authenticated());
        assert_eq!(f.controller.preferences().unwrap().personalities().len(), 2);
    }

    #[tokio::test]
    async fn server_rejecting_the_token_ends_the_session() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/users/login")
            .with_status(200)
            .with_body(r#"{"access_token":"t1"}"#)
            .create_async()
            .await;
        let _m = mock_profile(&mut server, "t1").await;
        let _m = mock_preferences(&mut server).await;
        let _m = server
            .mock("GET", "/transactions")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"detail":"token expired"}"#)
            .create_async()
            .await;
        let f = fixture(&server, "/reports/daily");
        assert!(f.controller.login(&Credentials::new("alice", "secret"), true).await);
        assert!(f.controller.is_authenticated());

        let err = f
            .controller
            .transport
            .get_json::<serde_json::Value>("/transactions")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        let session = f.controller.snapshot();
        assert_eq!(session.status, SessionStatus::Anonymous);
        assert!(session.user.is_none());
        assert!(session.token.is_none());
        assert!(!f.controller.is_authenticated());
        assert_eq!(f.controller.username(), "Not logged in");
        let prefs = f.controller.preferences().unwrap();
        assert!(prefs.personalities().is_empty());
        assert_eq!(f.durable.get(PERSONALITY_KEY).unwrap().as_deref(), Some("2"));
        assert_eq!(f.location.current(), "/login?redirect=%2Freports%2Fdaily");
    }

    #[tokio::test]
    async fn unauthorized_follow_up_request_fails_the_login() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/users/login")
            .with_status(200)
            .with_body(r#"{"access_token":"t1"}"#)
            .create_async()
            .await;
        let _m = mock_profile(&mut server, "t1").await;
        let _m = server
            .mock("GET", "/users/settings")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;
        let f = fixture(&server, "/login");

        assert!(!f.controller.login(&Credentials::new("alice", "secret"), true).await);

        assert!(!f.controller.is_authenticated());
        assert_eq!(f.controller.snapshot().status, SessionStatus::Error);
        assert_eq!(f.controller.error().as_deref(), Some(LOGIN_FAILED));
        assert_eq!(f.durable.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(f.session.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn rejected_stored_token_is_cleared_once() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/users/me")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let durable = Arc::new(MemoryTier::new("durable"));
        let session = Arc::new(CountingTier::new("session"));
        durable.set(TOKEN_KEY, "t1").unwrap();
        let tokens = Arc::new(TokenStore::new(durable.clone(), session.clone()));
        let api = ApiConfig {
            base_url: server.url(),
            ..ApiConfig::default()
        };
        let transport = Arc::new(
            AuthenticatedTransport::new(&api, "/login", tokens, Arc::new(Location::new("/")))
                .unwrap(),
        );
        let controller = SessionController::new(
            transport,
            IdentityEndpoints::default(),
            &PreferencesConfig::default(),
        );

        assert!(controller.check_auth().await.is_none());
        assert_eq!(session.token_removals(), 1);
        assert_eq!(durable.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn check_auth_drops_orphaned_memory_token() {
        let server = Server::new_async().await;
        let f = fixture(&server, "/");
        f.controller.update(|s| {
            s.token = Some("ghost".to_string());
            s.status = SessionStatus::Authenticated;
        });

        assert!(f.controller.check_auth().await.is_none());
        let session = f.controller.snapshot();
        assert!(session.token.is_none());
        assert_eq!(session.status, SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn logout_keeps_personality_choice() {
        let server = Server::new_async().await;
        let f = fixture(&server, "/chat");
        f.durable.set(TOKEN_KEY, "t1").unwrap();
        f.durable.set(REMEMBER_KEY, "true").unwrap();
        f.durable.set(PERSONALITY_KEY, "3").unwrap();
        f.session.set(TOKEN_KEY, "t1").unwrap();

        f.controller.logout();

        assert_eq!(f.durable.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(f.durable.get(REMEMBER_KEY).unwrap(), None);
        assert_eq!(f.session.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(f.durable.get(PERSONALITY_KEY).unwrap().as_deref(), Some("3"));
        assert_eq!(f.controller.username(), "Not logged in");
    }

    #[tokio::test]
    async fn authority_reports_persisted_token() {
        let server = Server::new_async().await;
        let f = fixture(&server, "/");
        let authority: &dyn SessionAuthority = &*f.controller;
        assert!(!authority.has_persisted_token());
        f.session.set(TOKEN_KEY, "t1").unwrap();
        assert!(authority.has_persisted_token());
        assert!(!authority.is_authenticated());
    }
}
