//! Client assembly.
//!
//! Builds the storage tiers, the transport, the session controller and the
//! navigation guard from configuration, and wires them together.

use std::sync::Arc;

use tracing::info;

use crate::config::ConfigV1;
use crate::errors::TransportError;
use crate::guard::{NavigationGuard, RouteTable, SessionAuthority};
use crate::session::SessionController;
use crate::state::App;
use crate::store::{create_durable_tier, create_session_tier, TokenStore};
use crate::transport::{AuthenticatedTransport, Location};

/// Builds a client whose location starts at the fallback route.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn build(config: ConfigV1) -> Result<App, TransportError> {
    let initial = config.routes.fallback_path.clone();
    build_at(config, &initial)
}

/// Builds a client whose location starts at `initial`.
pub fn build_at(config: ConfigV1, initial: &str) -> Result<App, TransportError> {
    let config = Arc::new(config);
    let tokens = Arc::new(TokenStore::new(
        create_durable_tier(&config.storage),
        create_session_tier(),
    ));
    let location = Arc::new(Location::new(initial));
    let transport = Arc::new(AuthenticatedTransport::new(
        &config.api,
        &config.routes.login_path,
        tokens.clone(),
        location.clone(),
    )?);
    let session = Arc::new(SessionController::new(
        transport.clone(),
        config.api.endpoints.clone(),
        &config.preferences,
    ));
    session.watch_expiry();
    let authority: Arc<dyn SessionAuthority> = session.clone();
    let guard = NavigationGuard::new(authority, &config.routes);
    let routes = RouteTable::new(&config.routes);

    info!(
        base_url = config.api.base_url.as_str(),
        remembered = tokens.is_remembered(),
        "client ready"
    );

    Ok(App {
        config,
        tokens,
        transport,
        session,
        guard,
        routes,
        location,
    })
}
