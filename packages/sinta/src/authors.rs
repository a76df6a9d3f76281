use std::{path::Path, sync::LazyLock};

use scraper::{Html, Selector};

use crate::{
    Error, config::PortalConfig, session::PortalSession, utils::ElementRefExt as _,
};

static AUTHOR_NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.col-lg.col-md h3 a").unwrap());

const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub id: u64,
    /// Resolved from the profile page on first use.
    pub name: Option<String>,
}

impl AuthorIdentity {
    pub fn new(id: u64) -> Self {
        Self { id, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn fallback_name(id: u64) -> String {
        format!("Author_{id}")
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| Self::fallback_name(self.id))
    }
}

/// One numeric id per line. Blank lines and `#` comments are ignored; anything else
/// that is not a number is skipped with a warning.
pub fn parse_author_list(content: &str) -> Vec<u64> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
        .filter_map(|(line_number, line)| match line.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(line_number, value = line, "Skipping invalid author id");
                None
            }
        })
        .collect()
}

pub fn load_author_list(path: &Path) -> Result<Vec<u64>, Error> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::configuration(format!("cannot read author list {}: {e}", path.display()))
    })?;
    let ids = parse_author_list(&content);
    tracing::info!(count = ids.len(), path = %path.display(), "Loaded author list");
    Ok(ids)
}

pub fn parse_author_name(html: &str) -> Option<String> {
    Html::parse_document(html)
        .select(&AUTHOR_NAME_SELECTOR)
        .next()
        .map(|el| el.collapsed_text())
        .filter(|name| !name.is_empty())
}

/// Display name from the profile page. Never fails: any problem yields `Author_<id>`.
#[tracing::instrument(level = tracing::Level::DEBUG, skip(session, config))]
pub async fn resolve_author_name(
    session: &PortalSession,
    config: &PortalConfig,
    author_id: u64,
) -> String {
    let html = match config.profile_url(author_id) {
        Ok(url) => session.get_text(url, config).await,
        Err(e) => Err(e),
    };
    match html.map(|html| parse_author_name(&html)) {
        Ok(Some(name)) => name,
        Ok(None) => {
            tracing::warn!(author_id, "Profile page has no author name");
            AuthorIdentity::fallback_name(author_id)
        }
        Err(e) => {
            tracing::warn!(author_id, error = %e, "Cannot resolve author name");
            AuthorIdentity::fallback_name(author_id)
        }
    }
}
