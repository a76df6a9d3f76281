use scraper::ElementRef;

use crate::{
    ExtractionError,
    authors::AuthorIdentity,
    record::{CategoryRecord, ID_FIELD, NAME_FIELD, RecordBuilder},
    selector::{FieldSelector, TextPredicate},
    transform::{drop_leading_self_reference, or_placeholder, trim_commas, value_after_colon},
    utils::ElementRefExt as _,
};

use super::{Category, Extractor};

pub const FIELDS: &[&str] = &[
    "Judul Buku",
    "Kategori Buku",
    "Penulis",
    "Penerbit",
    "Tahun",
    "Kota",
    "ISBN",
    ID_FIELD,
    NAME_FIELD,
];

const TITLE: FieldSelector = FieldSelector::new("Judul Buku", "div.ar-title");
const CATEGORY: FieldSelector =
    FieldSelector::new("Kategori Buku", "a").with_text(TextPredicate::Contains("Category"));
/// Plain author links; decorated links (publisher, year, city, ISBN) carry a class.
const AUTHORS: FieldSelector =
    FieldSelector::new("Penulis", r##"div.ar-meta a[href="#!"]:not([class])"##);
const PUBLISHER: FieldSelector = FieldSelector::new("Penerbit", "a.ar-pub");
const YEAR: FieldSelector = FieldSelector::new("Tahun", "a.ar-year");
const CITY: FieldSelector = FieldSelector::new("Kota", "a.ar-cited");
const ISBN: FieldSelector = FieldSelector::new("ISBN", "a.ar-quartile");

pub struct BookExtractor;

/// Joined plain author names with the profile owner dropped from the front.
fn co_authors(item: ElementRef<'_>, selector: &FieldSelector) -> Result<String, ExtractionError> {
    let joined = selector
        .find_all(item)?
        .into_iter()
        .map(|link| link.collapsed_text())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let names = trim_commas(&drop_leading_self_reference(&joined));
    Ok(or_placeholder(Some(names)))
}

impl Extractor for BookExtractor {
    fn category(&self) -> Category {
        Category::Books
    }

    fn fields(&self) -> &'static [&'static str] {
        FIELDS
    }

    fn extract(
        &self,
        item: ElementRef<'_>,
        author: &AuthorIdentity,
    ) -> Result<CategoryRecord, ExtractionError> {
        RecordBuilder::new(FIELDS)
            .set("Judul Buku", TITLE.text(item)?)
            .set("Kategori Buku", value_after_colon(&CATEGORY.text(item)?))
            .set("Penulis", co_authors(item, &AUTHORS)?)
            .set("Penerbit", PUBLISHER.text(item)?)
            .set("Tahun", YEAR.text(item)?)
            .set("Kota", CITY.text(item)?)
            .set("ISBN", value_after_colon(&ISBN.text(item)?))
            .author(author)
            .build()
    }
}
