//! Authenticated portal session: the cookie-carrying client, its on-disk
//! snapshot, and the state machine that decides between reusing and
//! re-establishing it.

use std::{collections::BTreeMap, sync::Arc};

use reqwest::{
    Client,
    cookie::{CookieStore as _, Jar},
    header::HeaderMap,
};
use url::Url;

use crate::{
    Error,
    config::{PortalConfig, default_headers},
};

pub mod auth;
pub mod probe;
pub mod state;

pub use auth::Authenticator;
pub use probe::validate;
pub use state::{Credentials, SessionState};

/// HTTP client bound to one cookie jar. Every request of a run goes through it.
#[derive(Debug, Clone)]
pub struct PortalSession {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
    /// Besides the root, pages whose path-scoped cookies belong in the snapshot.
    scoped_urls: Vec<Url>,
    headers: HeaderMap,
}

impl PortalSession {
    pub fn new(config: &PortalConfig, headers: HeaderMap) -> Result<Self, Error> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_store(true)
            .cookie_provider(jar.clone())
            .user_agent(&config.user_agent)
            .default_headers(headers.clone())
            .build()?;
        let scoped_urls = [config.probe_url(), config.login_url()]
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            client,
            jar,
            base_url: config.base_url.clone(),
            scoped_urls,
            headers,
        })
    }

    /// Rebuilds a session from a persisted snapshot.
    pub fn restore(config: &PortalConfig, state: &SessionState) -> Result<Self, Error> {
        let headers = match state.header_map() {
            map if map.is_empty() => default_headers(),
            map => map,
        };
        let session = Self::new(config, headers)?;
        for (name, value) in &state.cookies {
            session
                .jar
                .add_cookie_str(&format!("{name}={value}; Path=/"), &session.base_url);
        }
        Ok(session)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Snapshot of the cookies sent to the portal root and its login/probe pages, plus the
    /// base headers. Restoring widens path-scoped cookies to `/`.
    pub fn state(&self) -> SessionState {
        let mut cookies = BTreeMap::new();
        for url in std::iter::once(&self.base_url).chain(&self.scoped_urls) {
            let Some(header) = self.jar.cookies(url) else {
                continue;
            };
            let Ok(value) = header.to_str() else {
                continue;
            };
            for (name, value) in SessionState::cookies_from_header(value) {
                cookies.entry(name).or_insert(value);
            }
        }
        SessionState {
            cookies,
            headers: SessionState::headers_from_map(&self.headers),
        }
    }

    /// GET returning the body. Non-success statuses are errors.
    pub async fn get_text(&self, url: Url, config: &PortalConfig) -> Result<String, Error> {
        Ok(self
            .client
            .get(url)
            .timeout(config.page_timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoSession,
    LoadingPersisted,
    Validating,
    Authenticating,
    Valid,
    Failed,
}

pub struct SessionManager {
    config: PortalConfig,
    credentials: Option<Credentials>,
    force_refresh: bool,
    phase: SessionPhase,
}

impl SessionManager {
    pub fn new(config: PortalConfig, credentials: Option<Credentials>) -> Self {
        Self {
            config,
            credentials,
            force_refresh: false,
            phase: SessionPhase::NoSession,
        }
    }

    /// Discard any persisted session before the next `initialize`.
    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Produces a validated session, reusing the persisted one when the portal still accepts it.
    /// Logs in at most once per call.
    #[tracing::instrument(level = tracing::Level::DEBUG, skip(self), fields(session_file = %self.config.session_file.display()))]
    pub async fn initialize(&mut self) -> Result<PortalSession, Error> {
        let result = self.run().await;
        self.phase = match &result {
            Ok(_) => SessionPhase::Valid,
            Err(_) => SessionPhase::Failed,
        };
        result
    }

    async fn run(&mut self) -> Result<PortalSession, Error> {
        let Some(credentials) = self.credentials.clone() else {
            return Err(Error::configuration(format!(
                "credentials are required ({} and {} must be set)",
                state::USERNAME_VAR,
                state::PASSWORD_VAR
            )));
        };
        let path = self.config.session_file.clone();
        if self.force_refresh {
            tracing::info!("Forced refresh, discarding persisted session");
            remove_session_file(&path)?;
        }

        self.phase = SessionPhase::LoadingPersisted;
        if path.exists() {
            match SessionState::load(&path)
                .and_then(|state| PortalSession::restore(&self.config, &state))
            {
                Ok(session) => {
                    self.phase = SessionPhase::Validating;
                    if validate(&session, &self.config).await {
                        tracing::info!("Reusing persisted session");
                        return Ok(session);
                    }
                    tracing::info!("Persisted session expired");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Persisted session is unreadable, logging in again");
                }
            }
        }

        self.phase = SessionPhase::Authenticating;
        let session = match Authenticator::new(&self.config).login(&credentials).await {
            Ok(session) => session,
            Err(e) => {
                if let Err(remove_error) = remove_session_file(&path) {
                    tracing::warn!(error = %remove_error, "Cannot remove stale session file");
                }
                return Err(e);
            }
        };
        session.state().save(&path)?;
        tracing::info!(path = %path.display(), "Session saved");
        Ok(session)
    }
}

fn remove_session_file(path: &std::path::Path) -> Result<(), Error> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
