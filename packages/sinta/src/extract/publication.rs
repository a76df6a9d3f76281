//! Article listings from the three indexing sources.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::{
    ExtractionError,
    authors::AuthorIdentity,
    record::{CategoryRecord, ID_FIELD, NAME_FIELD, RecordBuilder},
    selector::{FieldSelector, Position, TextPredicate},
    transform::{
        PLACEHOLDER, first_token, last_token, nth_token_from_end, or_placeholder,
        value_after_colon,
    },
};

use super::{Category, Extractor};

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

const TITLE: FieldSelector = FieldSelector::new("Judul Artikel", "div.ar-title");
const TITLE_LINK: FieldSelector = FieldSelector::new("Link", "div.ar-title a");
const YEAR: FieldSelector = FieldSelector::new("Tahun", "a.ar-year");
const CITED: FieldSelector = FieldSelector::new("Sitasi", "a.ar-cited");

/// Picks one whitespace token out of `text`, or reports the whole text as malformed.
fn token(
    field: &'static str,
    text: &str,
    pick: impl for<'t> Fn(&'t str) -> Option<&'t str>,
) -> Result<String, ExtractionError> {
    pick(text)
        .map(str::to_string)
        .ok_or_else(|| ExtractionError::Malformed {
            field,
            value: text.to_string(),
        })
}

pub const SCOPUS_FIELDS: &[&str] = &[
    "Judul Artikel",
    "Nama Jurnal",
    "Quartile",
    "Penulis",
    "Tahun",
    "Sitasi",
    "Link",
    ID_FIELD,
    NAME_FIELD,
];

const SCOPUS_JOURNAL: FieldSelector = FieldSelector::new("Nama Jurnal", ".ar-pub");
const SCOPUS_QUARTILE: FieldSelector = FieldSelector::new("Quartile", ".ar-quartile");
const SCOPUS_CREATOR: FieldSelector = FieldSelector::new("Penulis", "a")
    .with_text(TextPredicate::Label("Creator"))
    .parent();

pub struct ScopusExtractor;

impl Extractor for ScopusExtractor {
    fn category(&self) -> Category {
        Category::Scopus
    }

    fn fields(&self) -> &'static [&'static str] {
        SCOPUS_FIELDS
    }

    fn extract(
        &self,
        item: ElementRef<'_>,
        author: &AuthorIdentity,
    ) -> Result<CategoryRecord, ExtractionError> {
        let creator = SCOPUS_CREATOR
            .text_optional(item)?
            .map(|text| value_after_colon(&text));
        RecordBuilder::new(SCOPUS_FIELDS)
            .set("Judul Artikel", TITLE.text(item)?)
            .set("Nama Jurnal", SCOPUS_JOURNAL.text(item)?)
            .set("Quartile", SCOPUS_QUARTILE.text(item)?)
            .set("Penulis", or_placeholder(creator))
            .set("Tahun", token("Tahun", &YEAR.text(item)?, last_token)?)
            .set("Sitasi", CITED.text(item)?)
            .set("Link", SCOPUS_JOURNAL.attr(item, "href")?)
            .author(author)
            .build()
    }
}

pub const GOOGLE_SCHOLAR_FIELDS: &[&str] = &[
    "Judul Artikel",
    "Nama Jurnal",
    "Penulis",
    "Tahun",
    "Sitasi",
    "Link",
    ID_FIELD,
    NAME_FIELD,
];

const GS_JOURNAL: FieldSelector = FieldSelector::new("Nama Jurnal", "div.ar-meta a.ar-pub");
const GS_AUTHORS: FieldSelector =
    FieldSelector::new("Penulis", "a").with_text(TextPredicate::Contains("Authors"));

pub struct GoogleScholarExtractor;

impl Extractor for GoogleScholarExtractor {
    fn category(&self) -> Category {
        Category::GoogleScholar
    }

    fn fields(&self) -> &'static [&'static str] {
        GOOGLE_SCHOLAR_FIELDS
    }

    fn extract(
        &self,
        item: ElementRef<'_>,
        author: &AuthorIdentity,
    ) -> Result<CategoryRecord, ExtractionError> {
        RecordBuilder::new(GOOGLE_SCHOLAR_FIELDS)
            .set("Judul Artikel", TITLE.text(item)?)
            .set("Nama Jurnal", GS_JOURNAL.text(item)?)
            .set("Penulis", value_after_colon(&GS_AUTHORS.text(item)?))
            .set("Tahun", token("Tahun", &YEAR.text(item)?, last_token)?)
            .set("Sitasi", token("Sitasi", &CITED.text(item)?, first_token)?)
            .set("Link", TITLE_LINK.attr(item, "href")?)
            .author(author)
            .build()
    }
}

pub const WOS_FIELDS: &[&str] = &[
    "Judul Artikel",
    "Nama Jurnal",
    "Quartile",
    "Edition",
    "Link Jurnal",
    "Penulis",
    "Urutan Penulis",
    "Total Penulis",
    "Tahun",
    "Sitasi",
    "Terindex Scopus",
    "DOI",
    "Link",
    ID_FIELD,
    NAME_FIELD,
];

const WOS_QUARTILE: FieldSelector = FieldSelector::new("Quartile", "a.ar-quartile");
const WOS_EDITION: FieldSelector = FieldSelector::new("Edition", "a.ar-pub");
const WOS_JOURNAL: FieldSelector =
    FieldSelector::new("Nama Jurnal", "div.ar-meta a.ar-pub").at(Position::Last);
const WOS_AUTHOR_ORDER: FieldSelector =
    FieldSelector::new("Urutan Penulis", "a").with_text(TextPredicate::Contains("Author Order"));
const WOS_AUTHORS: FieldSelector =
    FieldSelector::new("Penulis", "div.ar-meta a").with_text(TextPredicate::Label("Authors"));
const WOS_SCOPUS_FLAG: FieldSelector = FieldSelector::new("Terindex Scopus", "span.scopus-indexed");
const WOS_DOI: FieldSelector = FieldSelector::new("DOI", "a.ar-sinta");

/// `Author Order : 2 of 5` into `("2", "5")`.
pub fn author_order(text: &str) -> Result<(String, String), ExtractionError> {
    let numbers: Vec<&str> = NUMBER_RE.find_iter(text).map(|m| m.as_str()).collect();
    match numbers.as_slice() {
        [position, total] => Ok((position.to_string(), total.to_string())),
        _ => Err(ExtractionError::Malformed {
            field: "Urutan Penulis",
            value: text.to_string(),
        }),
    }
}

pub struct WosExtractor;

impl Extractor for WosExtractor {
    fn category(&self) -> Category {
        Category::Wos
    }

    fn fields(&self) -> &'static [&'static str] {
        WOS_FIELDS
    }

    fn extract(
        &self,
        item: ElementRef<'_>,
        author: &AuthorIdentity,
    ) -> Result<CategoryRecord, ExtractionError> {
        let (order, total) = author_order(&WOS_AUTHOR_ORDER.text(item)?)?;
        let indexed = if WOS_SCOPUS_FLAG.find_optional(item)?.is_some() {
            "Yes"
        } else {
            "No"
        };
        let doi = WOS_DOI
            .text_optional(item)?
            .map(|text| value_after_colon(&text));
        RecordBuilder::new(WOS_FIELDS)
            .set("Judul Artikel", TITLE.text(item)?)
            .set("Nama Jurnal", WOS_JOURNAL.text(item)?)
            .set("Quartile", or_placeholder(WOS_QUARTILE.text_optional(item)?))
            .set("Edition", WOS_EDITION.text(item)?)
            .set("Link Jurnal", WOS_JOURNAL.attr(item, "href")?)
            .set(
                "Penulis",
                or_placeholder(
                    WOS_AUTHORS
                        .text_optional(item)?
                        .map(|text| value_after_colon(&text)),
                ),
            )
            .set("Urutan Penulis", order)
            .set("Total Penulis", total)
            .set("Tahun", token("Tahun", &YEAR.text(item)?, last_token)?)
            .set(
                "Sitasi",
                token("Sitasi", &CITED.text(item)?, |t| nth_token_from_end(t, 1))?,
            )
            .set("Terindex Scopus", indexed)
            .set("DOI", doi.unwrap_or_else(|| PLACEHOLDER.to_string()))
            .set("Link", TITLE_LINK.attr(item, "href")?)
            .author(author)
            .build()
    }
}
