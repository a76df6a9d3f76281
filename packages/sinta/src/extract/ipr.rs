use scraper::ElementRef;

use crate::{
    ExtractionError,
    authors::AuthorIdentity,
    record::{CategoryRecord, ID_FIELD, NAME_FIELD, RecordBuilder},
    selector::{FieldSelector, TextPredicate},
    transform::value_after_colon,
};

use super::{Category, Extractor};

pub const FIELDS: &[&str] = &[
    "Judul HAKI",
    "Penemu",
    "Jenis HAKI",
    "Nomor HAKI",
    "Tahun",
    ID_FIELD,
    NAME_FIELD,
];

const TITLE: FieldSelector = FieldSelector::new("Judul HAKI", "div.ar-title");
const INVENTOR: FieldSelector =
    FieldSelector::new("Penemu", "a").with_text(TextPredicate::Label("Inventor"));
const KIND: FieldSelector = FieldSelector::new("Jenis HAKI", "a.ar-quartile");
const NUMBER: FieldSelector = FieldSelector::new("Nomor HAKI", "a.ar-cited");
const YEAR: FieldSelector = FieldSelector::new("Tahun", "a.ar-year");

pub struct IprExtractor;

impl Extractor for IprExtractor {
    fn category(&self) -> Category {
        Category::Iprs
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
            .set("Judul HAKI", TITLE.text(item)?)
            .set("Penemu", value_after_colon(&INVENTOR.text(item)?))
            .set("Jenis HAKI", KIND.text(item)?)
            .set("Nomor HAKI", value_after_colon(&NUMBER.text(item)?))
            .set("Tahun", YEAR.text(item)?)
            .author(author)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_page;

    #[test]
    fn ipr_item_is_extracted() {
        let html = r##"
            <div class="ar-list-item">
                <div class="ar-title"><a href="#!">Alat Pengering Gabah Otomatis</a></div>
                <div class="ar-meta">
                    <a href="#!">Inventor : Budi Santoso, Ani Wijaya</a>
                    <a href="#!" class="ar-quartile">Paten Sederhana</a>
                </div>
                <div class="ar-meta">
                    <a href="#!" class="ar-year">2019</a>
                    <a href="#!" class="ar-cited">Nomor Permohonan : S00201907654</a>
                </div>
            </div>"##;
        let out = extract_page(&IprExtractor, html, 1, &AuthorIdentity::new(99));
        assert!(out.failures.is_empty());
        let record = &out.records[0];
        assert_eq!(record.get("Penemu"), Some("Budi Santoso, Ani Wijaya"));
        assert_eq!(record.get("Jenis HAKI"), Some("Paten Sederhana"));
        assert_eq!(record.get("Nomor HAKI"), Some("S00201907654"));
        assert_eq!(record.get("Tahun"), Some("2019"));
        assert_eq!(record.get("Nama Sinta"), Some("Author_99"));
    }

    #[test]
    fn missing_inventor_fails_the_item() {
        let html = r##"
            <div class="ar-list-item">
                <div class="ar-title">Hak Cipta Modul</div>
                <div class="ar-meta"><a href="#!" class="ar-quartile">Hak Cipta</a></div>
            </div>"##;
        let out = extract_page(&IprExtractor, html, 1, &AuthorIdentity::new(99));
        assert!(out.records.is_empty());
        assert_eq!(
            out.failures[0].error,
            ExtractionError::MissingField {
                field: "Penemu",
                selector: "a"
            }
        );
    }
}
