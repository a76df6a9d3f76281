use scraper::{ElementRef, Html};

use crate::{
    ExtractionError,
    authors::AuthorIdentity,
    record::{CategoryRecord, ID_FIELD, NAME_FIELD, RecordBuilder},
    selector::FieldSelector,
    transform::{PLACEHOLDER, or_placeholder, strip_university_prefix},
    utils::ElementRefExt as _,
};

use super::{Category, Extractor};

pub const FIELDS: &[&str] = &[
    NAME_FIELD,
    ID_FIELD,
    "Universitas",
    "Program Studi",
    "SINTA Score Overall",
    "SINTA Score 3Yr",
    "Scopus Article",
    "Scopus Citation",
    "Scopus Cited Document",
    "Scopus H-Index",
    "Scopus i10-Index",
    "Scopus G-Index",
    "GScholar Article",
    "GScholar Citation",
    "GScholar Cited Document",
    "GScholar H-Index",
    "GScholar i10-Index",
    "GScholar G-Index",
];

/// Column names of the statistics table: `[metric row][source column]`.
const STAT_FIELDS: [[&str; 2]; 6] = [
    ["Scopus Article", "GScholar Article"],
    ["Scopus Citation", "GScholar Citation"],
    ["Scopus Cited Document", "GScholar Cited Document"],
    ["Scopus H-Index", "GScholar H-Index"],
    ["Scopus i10-Index", "GScholar i10-Index"],
    ["Scopus G-Index", "GScholar G-Index"],
];

const SCORES: [&str; 2] = ["SINTA Score Overall", "SINTA Score 3Yr"];

const NAME: FieldSelector = FieldSelector::new(NAME_FIELD, "div.col-lg.col-md h3 a");
const UNIVERSITY: FieldSelector =
    FieldSelector::new("Universitas", r#"a[href*="affiliations/profile"]"#);
const PROGRAM: FieldSelector =
    FieldSelector::new("Program Studi", r#"a[href*="departments/profile"]"#);
const STAT_TABLE: FieldSelector = FieldSelector::new("Scopus Article", "table.stat-table");
const STAT_ROWS: FieldSelector = FieldSelector::new("Scopus Article", "tr");
const STAT_CELLS: &str = "td";
const SCORE_ROWS: FieldSelector = FieldSelector::new("SINTA Score", "div.row.no-gutters");
const SCORE_LABELS: FieldSelector = FieldSelector::new("SINTA Score", "div.pr-txt");
const SCORE_NUMBERS: FieldSelector = FieldSelector::new("SINTA Score", "div.pr-num");

type ScoreLookup = fn(ElementRef<'_>, &str) -> Result<Option<String>, ExtractionError>;

/// Tried in order until one finds the score.
const SCORE_LOOKUPS: [ScoreLookup; 2] = [score_by_row, score_by_sibling];

/// Pairs the n-th label with the n-th number inside each score row.
fn score_by_row(root: ElementRef<'_>, label: &str) -> Result<Option<String>, ExtractionError> {
    for row in SCORE_ROWS.find_all(root)? {
        let labels = SCORE_LABELS.find_all(row)?;
        let numbers = SCORE_NUMBERS.find_all(row)?;
        if let Some(number) = labels
            .iter()
            .position(|l| l.collapsed_text().contains(label))
            .and_then(|i| numbers.get(i))
        {
            return Ok(Some(number.collapsed_text()));
        }
    }
    Ok(None)
}

/// Walks every label and reads the number element next to it.
fn score_by_sibling(root: ElementRef<'_>, label: &str) -> Result<Option<String>, ExtractionError> {
    for text in SCORE_LABELS.find_all(root)? {
        if !text.collapsed_text().contains(label) {
            continue;
        }
        let Some(parent) = text.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if let Some(number) = SCORE_NUMBERS.find_optional(parent)? {
            return Ok(Some(number.collapsed_text()));
        }
    }
    Ok(None)
}

pub fn score(root: ElementRef<'_>, label: &str) -> Result<String, ExtractionError> {
    for lookup in SCORE_LOOKUPS {
        if let Some(value) = lookup(root, label)?.filter(|v| !v.is_empty()) {
            return Ok(value);
        }
    }
    tracing::debug!(label, "Score not found");
    Ok(PLACEHOLDER.to_string())
}

/// Scopus and Google Scholar metrics by table position. Row 0 is the header, column 0 the metric name.
fn statistics(root: ElementRef<'_>) -> Result<Vec<(&'static str, String)>, ExtractionError> {
    let table = STAT_TABLE.find(root)?;
    let rows = STAT_ROWS.find_all(table)?;
    let cells = FieldSelector::new("Scopus Article", STAT_CELLS);
    let mut values = Vec::with_capacity(12);
    for (i, names) in STAT_FIELDS.iter().enumerate() {
        let row = rows.get(i + 1).copied();
        let row_cells = match row {
            Some(row) => cells.find_all(row)?,
            None => Vec::new(),
        };
        for (j, &field) in names.iter().enumerate() {
            let cell = row_cells
                .get(j + 1)
                .ok_or(ExtractionError::MissingField {
                    field,
                    selector: "table.stat-table tr td",
                })?;
            values.push((field, cell.collapsed_text()));
        }
    }
    Ok(values)
}

/// The whole profile page is one item.
pub struct ProfileExtractor;

impl Extractor for ProfileExtractor {
    fn category(&self) -> Category {
        Category::Profile
    }

    fn fields(&self) -> &'static [&'static str] {
        FIELDS
    }

    fn items<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        vec![document.root_element()]
    }

    fn extract(
        &self,
        item: ElementRef<'_>,
        author: &AuthorIdentity,
    ) -> Result<CategoryRecord, ExtractionError> {
        let name = NAME
            .text_optional(item)?
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| author.display_name());
        let university = UNIVERSITY
            .text_optional(item)?
            .map(|u| strip_university_prefix(&u));
        let mut record = RecordBuilder::new(FIELDS)
            .author(author)
            .set(NAME_FIELD, name)
            .set("Universitas", or_placeholder(university))
            .set("Program Studi", or_placeholder(PROGRAM.text_optional(item)?));
        for label in SCORES {
            record = record.set(label, score(item, label)?);
        }
        let stats = statistics(item).unwrap_or_else(|error| {
            tracing::warn!(
                target: "extraction_failure",
                author_id = author.id,
                category = %Category::Profile,
                error = %error,
                "Unreadable statistics table, filling placeholders"
            );
            STAT_FIELDS
                .iter()
                .flatten()
                .map(|&field| (field, PLACEHOLDER.to_string()))
                .collect()
        });
        for (field, value) in stats {
            record = record.set(field, value);
        }
        record.build()
    }
}
