use std::{path::PathBuf, time::Duration};

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue,
    UPGRADE_INSECURE_REQUESTS,
};
use url::Url;

use crate::{Error, extract::Category};

pub const DEFAULT_BASE_URL: &str = "https://sinta.kemdikbud.go.id/";
pub const DEFAULT_SESSION_FILE: &str = ".config/session_data.json";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// Final-URL fragments that mean the login landed inside the portal.
pub const AUTHENTICATED_FRAGMENTS: &[&str] = &["authors", "dashboard", "profile"];
pub const LOGIN_FRAGMENT: &str = "login";

/// Where the portal lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: Url,
    pub login_path: String,
    pub probe_path: String,
    pub profile_path: String,
    pub session_file: PathBuf,
    pub user_agent: String,
    pub page_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            // Constant literal, always parses.
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            login_path: "logins".to_string(),
            probe_path: "authors".to_string(),
            profile_path: "authors/profile/".to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
        }
    }
}

impl PortalConfig {
    /// Defaults pointed at another portal root (a mirror, or a local stub).
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    pub fn session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    pub fn login_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join(&self.login_path)?)
    }

    pub fn probe_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join(&self.probe_path)?)
    }

    pub fn profile_url(&self, author_id: u64) -> Result<Url, Error> {
        Ok(self
            .base_url
            .join(&format!("{}{author_id}", self.profile_path))?)
    }

    /// Listing page `page` of `category` for one author. Profile has no view.
    pub fn view_url(&self, author_id: u64, category: Category, page: u32) -> Result<Url, Error> {
        let mut url = self.profile_url(author_id)?;
        if let Some(view) = category.view() {
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("view", view);
        }
        Ok(url)
    }
}

pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,id;q=0.8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}
