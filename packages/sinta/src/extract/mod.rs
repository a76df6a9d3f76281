//! Page markup to records, one category at a time.
//!
//! Every category implements [`Extractor`]. [`extract_page`] runs one over all
//! item blocks of a page and keeps going past items that fail: those come back
//! as [`ExtractionFailure`]s next to the records that did extract.

use std::{fmt, str::FromStr, sync::LazyLock};

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::{Error, ExtractionError, authors::AuthorIdentity, record::CategoryRecord};

pub mod book;
pub mod grant;
pub mod ipr;
pub mod profile;
pub mod publication;

static ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ar-list-item").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Profile,
    Books,
    Iprs,
    Scopus,
    GoogleScholar,
    Wos,
    Researches,
    Services,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Profile,
        Category::Books,
        Category::Iprs,
        Category::Scopus,
        Category::GoogleScholar,
        Category::Wos,
        Category::Researches,
        Category::Services,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            Category::Profile => "profile",
            Category::Books => "books",
            Category::Iprs => "iprs",
            Category::Scopus => "scopus",
            Category::GoogleScholar => "googlescholar",
            Category::Wos => "wos",
            Category::Researches => "researches",
            Category::Services => "services",
        }
    }

    /// Value of the `view` query parameter. The profile page has none and is never paginated.
    pub fn view(self) -> Option<&'static str> {
        match self {
            Category::Profile => None,
            other => Some(other.identifier()),
        }
    }

    /// Output file name without extension.
    pub fn file_stem(self) -> &'static str {
        match self {
            Category::Profile => "profil",
            Category::Books => "buku",
            Category::Iprs => "haki",
            Category::Scopus => "publikasi_scopus",
            Category::GoogleScholar => "publikasi_gs",
            Category::Wos => "publikasi_wos",
            Category::Researches => "penelitian",
            Category::Services => "ppm",
        }
    }

    pub fn fields(self) -> &'static [&'static str] {
        self.extractor().fields()
    }

    pub fn extractor(self) -> &'static dyn Extractor {
        match self {
            Category::Profile => &profile::ProfileExtractor,
            Category::Books => &book::BookExtractor,
            Category::Iprs => &ipr::IprExtractor,
            Category::Scopus => &publication::ScopusExtractor,
            Category::GoogleScholar => &publication::GoogleScholarExtractor,
            Category::Wos => &publication::WosExtractor,
            Category::Researches => &grant::RESEARCH,
            Category::Services => &grant::SERVICES,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Accepts the view identifier or the output file stem.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.identifier() == s || c.file_stem() == s)
            .ok_or_else(|| Error::configuration(format!("unknown category `{s}`")))
    }
}

pub trait Extractor: Sync {
    fn category(&self) -> Category;

    /// Declared output columns, in order.
    fn fields(&self) -> &'static [&'static str];

    /// Item blocks of a page, in document order.
    fn items<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&ITEM_SELECTOR).collect()
    }

    fn extract(
        &self,
        item: ElementRef<'_>,
        author: &AuthorIdentity,
    ) -> Result<CategoryRecord, ExtractionError>;
}

/// Identifies an item that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFailure {
    pub category: Category,
    pub author_id: u64,
    pub page: u32,
    /// 1-based position of the item on its page.
    pub item: usize,
    #[serde(serialize_with = "serialize_display")]
    pub error: ExtractionError,
}

fn serialize_display<S: serde::Serializer>(
    error: &ExtractionError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageExtraction {
    pub records: Vec<CategoryRecord>,
    pub failures: Vec<ExtractionFailure>,
}

/// Runs `extractor` over every item of one page. Never fails as a whole.
pub fn extract_page(
    extractor: &dyn Extractor,
    html: &str,
    page: u32,
    author: &AuthorIdentity,
) -> PageExtraction {
    let document = Html::parse_document(html);
    let category = extractor.category();
    let mut result = PageExtraction::default();
    for (index, item) in extractor.items(&document).into_iter().enumerate() {
        match extractor.extract(item, author) {
            Ok(record) => result.records.push(record),
            Err(error) => {
                tracing::warn!(
                    target: "extraction_failure",
                    author_id = author.id,
                    category = %category,
                    page,
                    item = index + 1,
                    error = %error,
                    "Skipping item"
                );
                result.failures.push(ExtractionFailure {
                    category,
                    author_id: author.id,
                    page,
                    item: index + 1,
                    error,
                });
            }
        }
    }
    tracing::debug!(
        author_id = author.id,
        category = %category,
        page,
        records = result.records.len(),
        skipped = result.failures.len(),
        "Page extracted"
    );
    result
}
