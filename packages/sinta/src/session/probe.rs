use reqwest::StatusCode;
use url::Url;

use crate::config::{LOGIN_FRAGMENT, PortalConfig};

use super::PortalSession;

/// Whether a probe response proves the session is still authenticated.
pub fn probe_is_authenticated(status: StatusCode, final_url: &Url) -> bool {
    status == StatusCode::OK && !final_url.as_str().contains(LOGIN_FRAGMENT)
}

/// Issues one GET to the authenticated probe page. Transport errors count as invalid.
#[tracing::instrument(level = tracing::Level::DEBUG, skip_all)]
pub async fn validate(session: &PortalSession, config: &PortalConfig) -> bool {
    let probe_url = match config.probe_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot build probe url");
            return false;
        }
    };
    let response = session
        .client()
        .get(probe_url)
        .timeout(config.probe_timeout)
        .send()
        .await;
    match response {
        Ok(res) => {
            let valid = probe_is_authenticated(res.status(), res.url());
            if valid {
                tracing::info!("Session is valid");
            } else {
                tracing::info!(status = %res.status(), final_url = %res.url(), "Session is not valid");
            }
            valid
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session probe failed");
            false
        }
    }
}
