use std::pin::pin;

use futures::TryStreamExt as _;
use serde::Serialize;

use crate::{
    Error,
    authors::{AuthorIdentity, resolve_author_name},
    config::PortalConfig,
    extract::{Category, ExtractionFailure, PageExtraction, extract_page},
    pagination::fetch_all_pages,
    record::CategoryRecord,
    session::PortalSession,
};

/// An (author, category) unit that was abandoned on a transport error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub author_id: u64,
    pub category: Category,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorCount {
    pub author_id: u64,
    pub records: usize,
    pub skipped: usize,
}

/// Everything one category produced across all authors, in author-list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBatch {
    pub category: Category,
    pub records: Vec<CategoryRecord>,
    pub failures: Vec<ExtractionFailure>,
    pub unit_failures: Vec<UnitFailure>,
    pub counts: Vec<AuthorCount>,
}

impl CategoryBatch {
    fn new(category: Category) -> Self {
        Self {
            category,
            records: Vec::new(),
            failures: Vec::new(),
            unit_failures: Vec::new(),
            counts: Vec::new(),
        }
    }
}

/// Receives each finished category batch.
pub trait RecordSink {
    fn accept(&mut self, batch: &CategoryBatch) -> std::io::Result<()>;
}

impl RecordSink for Vec<CategoryBatch> {
    fn accept(&mut self, batch: &CategoryBatch) -> std::io::Result<()> {
        self.push(batch.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub records: usize,
    pub skipped: usize,
    pub failed_units: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub categories: Vec<CategorySummary>,
}

impl RunSummary {
    pub fn total_records(&self) -> usize {
        self.categories.iter().map(|c| c.records).sum()
    }
}

/// Drives authors × categories over one validated session, strictly in order.
pub struct SintaCore<'a> {
    session: &'a PortalSession,
    config: &'a PortalConfig,
    authors: Vec<AuthorIdentity>,
}

impl<'a> SintaCore<'a> {
    pub fn new(session: &'a PortalSession, config: &'a PortalConfig, author_ids: &[u64]) -> Self {
        Self {
            session,
            config,
            authors: author_ids.iter().copied().map(AuthorIdentity::new).collect(),
        }
    }

    pub fn authors(&self) -> &[AuthorIdentity] {
        &self.authors
    }

    /// Name of author `index`, fetched on first use and reused afterwards.
    async fn identity(&mut self, index: usize) -> AuthorIdentity {
        let author = &self.authors[index];
        if author.name.is_none() {
            let name = resolve_author_name(self.session, self.config, author.id).await;
            self.authors[index].name = Some(name);
        }
        self.authors[index].clone()
    }

    /// All pages of one unit. Records from pages fetched before a transport error are kept.
    async fn scrape_unit(
        &self,
        author: &AuthorIdentity,
        category: Category,
        batch: &mut CategoryBatch,
    ) -> Result<(), Error> {
        let extractor = category.extractor();
        let mut pages = pin!(fetch_all_pages(
            self.session,
            self.config,
            author.id,
            category
        ));
        while let Some(page) = pages.try_next().await? {
            let PageExtraction { records, failures } =
                extract_page(extractor, &page.html, page.number, author);
            batch.records.extend(records);
            batch.failures.extend(failures);
        }
        Ok(())
    }

    #[tracing::instrument(level = tracing::Level::INFO, skip(self), fields(category = %category))]
    pub async fn collect(&mut self, category: Category) -> CategoryBatch {
        let mut batch = CategoryBatch::new(category);
        for index in 0..self.authors.len() {
            let author = self.identity(index).await;
            tracing::info!(author_id = author.id, author = %author.display_name(), "Processing author");
            let (records_before, skipped_before) = (batch.records.len(), batch.failures.len());
            if let Err(e) = self.scrape_unit(&author, category, &mut batch).await {
                tracing::error!(author_id = author.id, category = %category, error = %e, "Unit failed");
                batch.unit_failures.push(UnitFailure {
                    author_id: author.id,
                    category,
                    error: e.to_string(),
                });
            }
            let count = AuthorCount {
                author_id: author.id,
                records: batch.records.len() - records_before,
                skipped: batch.failures.len() - skipped_before,
            };
            tracing::info!(
                author_id = count.author_id,
                records = count.records,
                skipped = count.skipped,
                "Author done"
            );
            batch.counts.push(count);
        }
        batch
    }

    /// Collects each category in turn and hands it to `sink` before moving on.
    pub async fn run(
        &mut self,
        categories: &[Category],
        sink: &mut impl RecordSink,
    ) -> Result<RunSummary, Error> {
        let mut summary = RunSummary::default();
        for &category in categories {
            let batch = self.collect(category).await;
            sink.accept(&batch)?;
            let entry = CategorySummary {
                category,
                records: batch.records.len(),
                skipped: batch.failures.len(),
                failed_units: batch.unit_failures.len(),
            };
            tracing::info!(
                category = %category,
                records = entry.records,
                skipped = entry.skipped,
                failed_units = entry.failed_units,
                "Category done"
            );
            summary.categories.push(entry);
        }
        Ok(summary)
    }
}
