//! Research grants and community-service grants share one listing layout; only
//! the column names differ.

use scraper::ElementRef;

use crate::{
    ExtractionError,
    authors::AuthorIdentity,
    record::{CategoryRecord, ID_FIELD, NAME_FIELD, RecordBuilder},
    selector::{FieldSelector, Position, TextPredicate},
    transform::{or_placeholder, value_after_colon},
    utils::ElementRefExt as _,
};

use super::{Category, Extractor};

pub struct GrantColumns {
    pub title: &'static str,
    pub leader: &'static str,
    pub scheme: &'static str,
    pub members: &'static str,
}

pub struct GrantExtractor {
    category: Category,
    columns: GrantColumns,
    fields: &'static [&'static str],
}

pub static RESEARCH: GrantExtractor = GrantExtractor {
    category: Category::Researches,
    columns: GrantColumns {
        title: "Judul Penelitian",
        leader: "Ketua Penelitian",
        scheme: "Sumber Dana",
        members: "Anggota Penelitian",
    },
    fields: &[
        "Judul Penelitian",
        "Ketua Penelitian",
        "Sumber Dana",
        "Anggota Penelitian",
        "Tahun",
        "Besar Dana",
        "Status",
        "Sumber",
        ID_FIELD,
        NAME_FIELD,
    ],
};

pub static SERVICES: GrantExtractor = GrantExtractor {
    category: Category::Services,
    columns: GrantColumns {
        title: "Judul PPM",
        leader: "Ketua PPM",
        scheme: "Skim PPM",
        members: "Anggota PPM",
    },
    fields: &[
        "Judul PPM",
        "Ketua PPM",
        "Skim PPM",
        "Anggota PPM",
        "Tahun",
        "Besar Dana",
        "Status",
        "Sumber",
        ID_FIELD,
        NAME_FIELD,
    ],
};

const MEMBER_LINKS: &str = r#"a[href*="/authors/profile/"]"#;

/// Badge `n` of the row: 0 amount, 1 status, 2 source.
const fn badge(field: &'static str, n: usize) -> FieldSelector {
    FieldSelector::new(field, "a.ar-quartile").at(Position::Nth(n))
}

impl GrantExtractor {
    fn members(&self, item: ElementRef<'_>) -> Result<String, ExtractionError> {
        let names = FieldSelector::new(self.columns.members, MEMBER_LINKS)
            .find_all(item)?
            .into_iter()
            .map(|link| link.collapsed_text())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        Ok(or_placeholder(Some(names)))
    }
}

impl Extractor for GrantExtractor {
    fn category(&self) -> Category {
        self.category
    }

    fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    fn extract(
        &self,
        item: ElementRef<'_>,
        author: &AuthorIdentity,
    ) -> Result<CategoryRecord, ExtractionError> {
        let columns = &self.columns;
        let leader = FieldSelector::new(columns.leader, "a").with_text(TextPredicate::Label("Leader"));
        RecordBuilder::new(self.fields)
            .set(columns.title, FieldSelector::new(columns.title, "div.ar-title").text(item)?)
            .set(columns.leader, value_after_colon(&leader.text(item)?))
            .set(columns.scheme, FieldSelector::new(columns.scheme, "a.ar-pub").text(item)?)
            .set(columns.members, self.members(item)?)
            .set("Tahun", FieldSelector::new("Tahun", "a.ar-year").text(item)?)
            .set("Besar Dana", badge("Besar Dana", 0).text(item)?)
            .set("Status", badge("Status", 1).text(item)?)
            .set("Sumber", badge("Sumber", 2).text(item)?)
            .author(author)
            .build()
    }
}
