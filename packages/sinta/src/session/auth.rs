use std::sync::LazyLock;

use reqwest::{
    StatusCode,
    header::{ORIGIN, REFERER},
};
use scraper::{Html, Selector};
use url::Url;

use crate::{
    Error,
    config::{AUTHENTICATED_FRAGMENTS, LOGIN_FRAGMENT, PortalConfig, default_headers},
    utils::ElementRefExt as _,
};

use super::{PortalSession, state::Credentials};

static CSRF_META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="csrf-token"]"#).unwrap());
static TOKEN_INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="_token"]"#).unwrap());
static CSRF_INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="csrf_token"]"#).unwrap());
static FORM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("form").unwrap());
static ERROR_BANNER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.alert-danger").unwrap());

/// Token lookups in priority order: selector and the attribute holding the value.
static TOKEN_LOOKUPS: [(&LazyLock<Selector>, &str); 3] = [
    (&CSRF_META_SELECTOR, "content"),
    (&TOKEN_INPUT_SELECTOR, "value"),
    (&CSRF_INPUT_SELECTOR, "value"),
];

const TOKEN_FIELD: &str = "_token";
const TOKEN_HEADER: &str = "x-csrf-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub token: Option<String>,
    pub action: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Final URL is inside the authenticated area.
    Authenticated,
    /// 200 but the final URL matched nothing known; accepted anyway.
    AcceptedUnrecognized,
    RedirectedToLogin,
    Status(StatusCode),
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            LoginOutcome::Authenticated | LoginOutcome::AcceptedUnrecognized
        )
    }
}

pub fn find_csrf_token(document: &Html) -> Option<String> {
    TOKEN_LOOKUPS.iter().find_map(|(selector, attr)| {
        document
            .select(selector)
            .next()
            .and_then(|el| el.value().attr(attr))
            .map(str::to_string)
    })
}

/// Reads the token and submission target from the login page markup.
pub fn parse_login_form(html: &str, login_url: &Url) -> LoginForm {
    let document = Html::parse_document(html);
    let token = find_csrf_token(&document);
    let action = document
        .select(&FORM_SELECTOR)
        .next()
        .and_then(|form| form.value().attr("action"))
        .filter(|action| !action.trim().is_empty())
        .and_then(|action| match login_url.join(action.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(action, error = %e, "Unusable form action, posting to login page");
                None
            }
        })
        .unwrap_or_else(|| login_url.clone());
    LoginForm { token, action }
}

pub fn classify_login(status: StatusCode, final_url: &Url) -> LoginOutcome {
    if status != StatusCode::OK {
        return LoginOutcome::Status(status);
    }
    let url = final_url.as_str();
    if AUTHENTICATED_FRAGMENTS.iter().any(|f| url.contains(f)) {
        LoginOutcome::Authenticated
    } else if url.contains(LOGIN_FRAGMENT) {
        LoginOutcome::RedirectedToLogin
    } else {
        LoginOutcome::AcceptedUnrecognized
    }
}

pub fn error_banner(html: &str) -> Option<String> {
    Html::parse_document(html)
        .select(&ERROR_BANNER_SELECTOR)
        .next()
        .map(|el| el.collapsed_text())
        .filter(|text| !text.is_empty())
}

pub struct Authenticator<'a> {
    config: &'a PortalConfig,
}

impl<'a> Authenticator<'a> {
    pub fn new(config: &'a PortalConfig) -> Self {
        Self { config }
    }

    /// Runs the login handshake on a fresh cookie jar, which becomes the returned session.
    #[tracing::instrument(level = tracing::Level::DEBUG, skip_all, fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<PortalSession, Error> {
        let session = PortalSession::new(self.config, default_headers())?;
        let login_url = self.config.login_url()?;

        tracing::info!(%login_url, "Loading login page");
        let page = session
            .client()
            .get(login_url.clone())
            .timeout(self.config.page_timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let form = parse_login_form(&page, &login_url);
        if form.token.is_none() {
            tracing::warn!("No anti-forgery token on login page, submitting without one");
        }

        let mut params = vec![
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let mut request = session
            .client()
            .post(form.action.clone())
            .header(ORIGIN, login_url.origin().ascii_serialization())
            .header(REFERER, login_url.as_str())
            .timeout(self.config.page_timeout);
        if let Some(token) = form.token.as_deref() {
            params.push((TOKEN_FIELD, token));
            request = request.header(TOKEN_HEADER, token);
        }

        tracing::info!(action = %form.action, "Submitting credentials");
        let response = request.form(&params).send().await?;
        let status = response.status();
        let final_url = response.url().clone();
        let outcome = classify_login(status, &final_url);
        tracing::debug!(?outcome, %final_url, "Login response classified");

        match outcome {
            LoginOutcome::Authenticated => {
                tracing::info!("Login successful");
                Ok(session)
            }
            LoginOutcome::AcceptedUnrecognized => {
                tracing::warn!(%final_url, "Login landed on an unrecognised page, assuming success");
                Ok(session)
            }
            LoginOutcome::RedirectedToLogin => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::authentication(
                    "redirected back to login page",
                    error_banner(&body),
                ))
            }
            LoginOutcome::Status(status) => Err(Error::authentication(
                format!("login returned HTTP {status}"),
                None,
            )),
        }
    }
}
