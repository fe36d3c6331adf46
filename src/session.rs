//! Actor resolution: which identity backs remote calls right now.
//!
//! Three sources initialise independently (signed-in identity, admin token,
//! anonymous fallback). [`resolve`] folds their states into one
//! [`ResolvedSession`] which the service carries explicitly; nothing here is
//! global.
use anyhow::Result;
use reqwest::Url;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::backend::{Backend, HttpBackend};
use crate::config::Config;
use crate::model::Principal;

/// Query parameter carrying the admin secret in launch links.
pub const ADMIN_TOKEN_PARAM: &str = "caffeineAdminToken";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Initializing,
    Anonymous,
    Authenticated,
    AdminToken,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Initializing => "initializing",
            AuthMode::Anonymous => "anonymous",
            AuthMode::Authenticated => "authenticated",
            AuthMode::AdminToken => "admin-token",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one actor source.
#[derive(Clone)]
pub enum SourceState<T> {
    /// Not requested (e.g. no identity, no admin token).
    Idle,
    Fetching,
    Ready(T),
    Failed(String),
}

impl<T> SourceState<T> {
    pub fn is_fetching(&self) -> bool {
        matches!(self, SourceState::Fetching)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            SourceState::Ready(actor) => Some(actor),
            _ => None,
        }
    }
}

impl<T> fmt::Debug for SourceState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceState::Idle => f.write_str("Idle"),
            SourceState::Fetching => f.write_str("Fetching"),
            SourceState::Ready(_) => f.write_str("Ready"),
            SourceState::Failed(msg) => write!(f, "Failed({})", msg),
        }
    }
}

/// State of the signed-in identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityState {
    Initializing,
    Resolved(Option<Principal>),
}

impl IdentityState {
    /// The principal, when it is a real (non-anonymous) one.
    pub fn authenticated_principal(&self) -> Option<&Principal> {
        match self {
            IdentityState::Resolved(Some(p)) if !p.is_anonymous() => Some(p),
            _ => None,
        }
    }
}

pub type Actor = Arc<dyn Backend>;

/// Raw state of the three actor sources plus the identity provider.
#[derive(Clone)]
pub struct SessionSources {
    pub identity: IdentityState,
    pub authenticated: SourceState<Actor>,
    pub admin_token: SourceState<Actor>,
    pub anonymous: SourceState<Actor>,
    pub has_admin_token: bool,
}

impl fmt::Debug for SessionSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSources")
            .field("identity", &self.identity)
            .field("authenticated", &self.authenticated)
            .field("admin_token", &self.admin_token)
            .field("anonymous", &self.anonymous)
            .field("has_admin_token", &self.has_admin_token)
            .finish()
    }
}

/// The single session value every query and mutation runs under.
#[derive(Clone)]
pub struct ResolvedSession {
    pub mode: AuthMode,
    pub actor: Option<Actor>,
    pub ready_for_queries: bool,
    /// Partition key folded into every cache key.
    pub cache_key: String,
}

impl fmt::Debug for ResolvedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSession")
            .field("mode", &self.mode)
            .field("has_actor", &self.actor.is_some())
            .field("ready_for_queries", &self.ready_for_queries)
            .field("cache_key", &self.cache_key)
            .finish()
    }
}

pub fn resolve_mode(sources: &SessionSources) -> AuthMode {
    if sources.identity == IdentityState::Initializing {
        return AuthMode::Initializing;
    }
    if sources.has_admin_token {
        if sources.admin_token.is_fetching() {
            return AuthMode::Initializing;
        }
        return AuthMode::AdminToken;
    }
    if sources.identity.authenticated_principal().is_some() {
        if sources.authenticated.is_fetching() {
            return AuthMode::Initializing;
        }
        return AuthMode::Authenticated;
    }
    if sources.anonymous.is_fetching() {
        return AuthMode::Initializing;
    }
    AuthMode::Anonymous
}

pub fn resolve(sources: &SessionSources) -> ResolvedSession {
    let mode = resolve_mode(sources);
    let actor = match mode {
        AuthMode::AdminToken => sources.admin_token.ready().cloned(),
        AuthMode::Authenticated => sources.authenticated.ready().cloned(),
        AuthMode::Anonymous => sources.anonymous.ready().cloned(),
        AuthMode::Initializing => None,
    };
    let cache_key = match (mode, sources.identity.authenticated_principal()) {
        (AuthMode::AdminToken, _) => format!("admin-token:{}", sources.has_admin_token),
        (AuthMode::Authenticated, Some(principal)) => format!("authenticated:{}", principal),
        _ => "anonymous".to_string(),
    };
    ResolvedSession {
        ready_for_queries: actor.is_some(),
        mode,
        actor,
        cache_key,
    }
}

/// Extract the admin secret from a launch link's query string or fragment.
pub fn admin_token_from_url(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let from_query = url
        .query_pairs()
        .find(|(k, _)| k == ADMIN_TOKEN_PARAM)
        .map(|(_, v)| v.into_owned());
    let token = from_query.or_else(|| {
        let fragment = url.fragment()?;
        let query = fragment.split_once('?').map(|(_, q)| q).unwrap_or(fragment);
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == ADMIN_TOKEN_PARAM)
            .map(|(_, v)| v.into_owned())
    })?;
    let token = token.trim().to_string();
    (!token.is_empty()).then_some(token)
}

impl SessionSources {
    /// Everything idle and the identity provider still starting.
    pub fn initializing() -> Self {
        Self {
            identity: IdentityState::Initializing,
            authenticated: SourceState::Idle,
            admin_token: SourceState::Idle,
            anonymous: SourceState::Fetching,
            has_admin_token: false,
        }
    }

    /// Build real HTTP actors for every configured source.
    #[instrument(skip_all)]
    pub async fn connect(cfg: &Config, admin_token: Option<&str>) -> Result<Self> {
        let anonymous = HttpBackend::from_config(cfg)?;

        let (identity, authenticated) = match &cfg.session.identity {
            Some(id) => {
                let actor: Actor = Arc::new(anonymous.clone().with_identity(id.token.clone()));
                (
                    IdentityState::Resolved(Some(Principal::new(id.principal.clone()))),
                    SourceState::Ready(actor),
                )
            }
            None => (IdentityState::Resolved(None), SourceState::Idle),
        };

        let admin_token = admin_token
            .map(str::to_string)
            .or_else(|| cfg.session.admin_token.clone())
            .filter(|t| !t.trim().is_empty());
        let has_admin_token = admin_token.is_some();
        let admin_state = match admin_token {
            Some(secret) => {
                let actor = anonymous.clone();
                match actor.initialize_access_control_with_secret(&secret).await {
                    Ok(()) => {
                        info!("admin token actor ready");
                        SourceState::Ready(Arc::new(actor) as Actor)
                    }
                    Err(err) => {
                        warn!(?err, "admin token initialization failed");
                        SourceState::Failed(format!("{:#}", err))
                    }
                }
            }
            None => SourceState::Idle,
        };

        Ok(Self {
            identity,
            authenticated,
            admin_token: admin_state,
            anonymous: SourceState::Ready(Arc::new(anonymous) as Actor),
            has_admin_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubBackend;

    fn actor() -> Actor {
        Arc::new(StubBackend::default())
    }

    fn settled() -> SessionSources {
        SessionSources {
            identity: IdentityState::Resolved(None),
            authenticated: SourceState::Idle,
            admin_token: SourceState::Idle,
            anonymous: SourceState::Ready(actor()),
            has_admin_token: false,
        }
    }

    #[test]
    fn identity_initializing_wins() {
        let mut sources = settled();
        sources.identity = IdentityState::Initializing;
        sources.has_admin_token = true;
        sources.admin_token = SourceState::Ready(actor());
        let session = resolve(&sources);
        assert_eq!(session.mode, AuthMode::Initializing);
        assert!(session.actor.is_none());
        assert!(!session.ready_for_queries);
    }

    #[test]
    fn anonymous_fallback() {
        let session = resolve(&settled());
        assert_eq!(session.mode, AuthMode::Anonymous);
        assert!(session.ready_for_queries);
        assert_eq!(session.cache_key, "anonymous");

        let mut sources = settled();
        sources.anonymous = SourceState::Fetching;
        assert_eq!(resolve(&sources).mode, AuthMode::Initializing);
    }

    #[test]
    fn authenticated_outranks_anonymous() {
        let mut sources = settled();
        sources.identity = IdentityState::Resolved(Some(Principal::new("abc-def")));
        sources.authenticated = SourceState::Fetching;
        assert_eq!(resolve(&sources).mode, AuthMode::Initializing);

        sources.authenticated = SourceState::Ready(actor());
        let session = resolve(&sources);
        assert_eq!(session.mode, AuthMode::Authenticated);
        assert_eq!(session.cache_key, "authenticated:abc-def");
        assert!(session.ready_for_queries);
    }

    #[test]
    fn anonymous_principal_is_not_authenticated() {
        let mut sources = settled();
        sources.identity = IdentityState::Resolved(Some(Principal::anonymous()));
        sources.authenticated = SourceState::Ready(actor());
        assert_eq!(resolve(&sources).mode, AuthMode::Anonymous);
    }

    #[test]
    fn admin_token_outranks_everything() {
        let mut sources = settled();
        sources.identity = IdentityState::Resolved(Some(Principal::new("abc-def")));
        sources.authenticated = SourceState::Ready(actor());
        sources.has_admin_token = true;
        sources.admin_token = SourceState::Fetching;
        assert_eq!(resolve(&sources).mode, AuthMode::Initializing);

        sources.admin_token = SourceState::Ready(actor());
        let session = resolve(&sources);
        assert_eq!(session.mode, AuthMode::AdminToken);
        assert_eq!(session.cache_key, "admin-token:true");
        assert!(session.ready_for_queries);
    }

    #[test]
    fn failed_admin_actor_is_not_ready() {
        let mut sources = settled();
        sources.has_admin_token = true;
        sources.admin_token = SourceState::Failed("Unauthorized".into());
        let session = resolve(&sources);
        assert_eq!(session.mode, AuthMode::AdminToken);
        assert!(session.actor.is_none());
        assert!(!session.ready_for_queries);
    }

    #[test]
    fn cache_keys_differ_between_identities() {
        let mut a = settled();
        a.identity = IdentityState::Resolved(Some(Principal::new("user-a")));
        a.authenticated = SourceState::Ready(actor());
        let mut b = a.clone();
        b.identity = IdentityState::Resolved(Some(Principal::new("user-b")));
        assert_ne!(resolve(&a).cache_key, resolve(&b).cache_key);
        assert_ne!(resolve(&a).cache_key, resolve(&settled()).cache_key);
    }

    #[test]
    fn initializing_sources_resolve_to_initializing() {
        assert_eq!(resolve(&SessionSources::initializing()).mode, AuthMode::Initializing);
    }

    #[test]
    fn admin_token_from_launch_link() {
        assert_eq!(
            admin_token_from_url("https://app.test/?caffeineAdminToken=s3cret&x=1"),
            Some("s3cret".to_string())
        );
        assert_eq!(
            admin_token_from_url("https://app.test/#/dashboard?caffeineAdminToken=abc"),
            Some("abc".to_string())
        );
        assert_eq!(admin_token_from_url("https://app.test/?caffeineAdminToken="), None);
        assert_eq!(admin_token_from_url("https://app.test/"), None);
        assert_eq!(admin_token_from_url("not a url"), None);
    }
}
