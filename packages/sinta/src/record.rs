use indexmap::IndexMap;
use serde::Serialize;

use crate::{ExtractionError, authors::AuthorIdentity};

pub const ID_FIELD: &str = "ID Sinta";
pub const NAME_FIELD: &str = "Nama Sinta";

/// One extracted row. Keys are exactly the category's declared fields, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryRecord(IndexMap<&'static str, String>);

impl CategoryRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug)]
pub struct RecordBuilder {
    declared: &'static [&'static str],
    values: IndexMap<&'static str, String>,
}

impl RecordBuilder {
    pub fn new(declared: &'static [&'static str]) -> Self {
        Self {
            declared,
            values: IndexMap::with_capacity(declared.len()),
        }
    }

    pub fn set(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(field, value.into());
        self
    }

    pub fn author(self, author: &AuthorIdentity) -> Self {
        self.set(ID_FIELD, author.id.to_string())
            .set(NAME_FIELD, author.display_name())
    }

    /// Fails unless every declared field and nothing else was set.
    pub fn build(mut self) -> Result<CategoryRecord, ExtractionError> {
        if let Some(extra) = self
            .values
            .keys()
            .copied()
            .find(|field| !self.declared.contains(field))
        {
            return Err(ExtractionError::UnknownField(extra));
        }
        let mut ordered = IndexMap::with_capacity(self.declared.len());
        for field in self.declared {
            let value = self
                .values
                .swap_remove(field)
                .ok_or(ExtractionError::IncompleteRecord(*field))?;
            ordered.insert(*field, value);
        }
        Ok(CategoryRecord(ordered))
    }
}
