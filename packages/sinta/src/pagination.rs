use std::sync::LazyLock;

use futures::{Stream, stream};
use scraper::{Html, Selector};

use crate::{
    Error, config::PortalConfig, extract::Category, session::PortalSession,
    utils::ElementRefExt as _,
};

static PAGINATION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".pagination-text").unwrap());

/// One fetched listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub total: u32,
    pub html: String,
}

/// `total` is unknown until page 1 has been read, and is never re-derived after that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    pub current: u32,
    pub total: Option<u32>,
}

impl PaginationCursor {
    pub fn next_page(&self) -> Option<u32> {
        let next = self.current + 1;
        match self.total {
            Some(total) if next > total => None,
            _ => Some(next),
        }
    }
}

/// Total page count from a listing page's indicator, `1` when absent or unreadable.
///
/// Handles both `Page 2 of 7 | Total Records : 63` and `2 of 7`.
pub fn pagination_total(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let Some(text) = document
        .select(&PAGINATION_SELECTOR)
        .next()
        .map(|el| el.collapsed_text())
    else {
        return 1;
    };
    parse_page_count(&text).unwrap_or_else(|| {
        tracing::debug!(indicator = %text, "Unreadable pagination indicator, assuming one page");
        1
    })
}

fn parse_page_count(indicator: &str) -> Option<u32> {
    let page_info = indicator.split('|').next()?;
    let (_, after) = page_info.rsplit_once("of")?;
    after
        .split_whitespace()
        .next()?
        .replace(',', "")
        .parse::<u32>()
        .ok()
        .map(|total| total.max(1))
}

/// Lazily fetches every page of one author's category view, one request at a time.
///
/// Page 1 is always fetched; its indicator fixes how many more follow. Dropping
/// the stream stops fetching, and calling again starts over from page 1.
pub fn fetch_all_pages<'a>(
    session: &'a PortalSession,
    config: &'a PortalConfig,
    author_id: u64,
    category: Category,
) -> impl Stream<Item = Result<Page, Error>> + 'a {
    stream::try_unfold(PaginationCursor::default(), move |cursor| async move {
        let Some(number) = cursor.next_page() else {
            return Ok(None);
        };
        let url = config.view_url(author_id, category, number)?;
        tracing::debug!(author_id, category = %category, page = number, %url, "Fetching page");
        let html = session.get_text(url, config).await?;
        let total = match cursor.total {
            Some(total) => total,
            None if category.view().is_some() => pagination_total(&html),
            None => 1,
        };
        if cursor.total.is_none() {
            tracing::info!(author_id, category = %category, total, "Pages to fetch");
        }
        let next = PaginationCursor {
            current: number,
            total: Some(total),
        };
        Ok(Some((
            Page {
                number,
                total,
                html,
            },
            next,
        )))
    })
}
