//! Declarative description of where a field lives inside an item block.

use scraper::{ElementRef, Selector};

use crate::{ExtractionError, transform::label_before_colon, utils::ElementRefExt as _};

/// Extra condition on the collapsed text of a candidate element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPredicate {
    Contains(&'static str),
    StartsWith(&'static str),
    /// Text before the first colon equals the label (`"Leader : Budi"` has label `Leader`).
    Label(&'static str),
}

impl TextPredicate {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextPredicate::Contains(needle) => text.contains(needle),
            TextPredicate::StartsWith(prefix) => text.starts_with(prefix),
            TextPredicate::Label(label) => label_before_colon(text) == Some(label),
        }
    }
}

/// Which of the matching elements is meant. Badge rows are positional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Last,
    Nth(usize),
}

/// Read the matched element itself, or step up to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Matched,
    Parent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelector {
    pub field: &'static str,
    pub css: &'static str,
    pub text: Option<TextPredicate>,
    pub position: Position,
    pub target: Target,
}

impl FieldSelector {
    pub const fn new(field: &'static str, css: &'static str) -> Self {
        Self {
            field,
            css,
            text: None,
            position: Position::First,
            target: Target::Matched,
        }
    }

    pub const fn with_text(mut self, predicate: TextPredicate) -> Self {
        self.text = Some(predicate);
        self
    }

    pub const fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub const fn parent(mut self) -> Self {
        self.target = Target::Parent;
        self
    }

    fn compile(&self) -> Result<Selector, ExtractionError> {
        Selector::parse(self.css).map_err(|_| ExtractionError::InvalidSelector {
            field: self.field,
            selector: self.css,
        })
    }

    fn missing(&self) -> ExtractionError {
        ExtractionError::MissingField {
            field: self.field,
            selector: self.css,
        }
    }

    /// Every element matching the css and text predicate, in document order.
    pub fn find_all<'a>(&self, scope: ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, ExtractionError> {
        let selector = self.compile()?;
        Ok(scope
            .select(&selector)
            .filter(|el| {
                self.text
                    .is_none_or(|predicate| predicate.matches(&el.collapsed_text()))
            })
            .collect())
    }

    pub fn find_optional<'a>(
        &self,
        scope: ElementRef<'a>,
    ) -> Result<Option<ElementRef<'a>>, ExtractionError> {
        let matches = self.find_all(scope)?;
        let picked = match self.position {
            Position::First => matches.first(),
            Position::Last => matches.last(),
            Position::Nth(n) => matches.get(n),
        };
        Ok(picked.copied().and_then(|el| match self.target {
            Target::Matched => Some(el),
            Target::Parent => el.parent().and_then(ElementRef::wrap),
        }))
    }

    pub fn find<'a>(&self, scope: ElementRef<'a>) -> Result<ElementRef<'a>, ExtractionError> {
        self.find_optional(scope)?.ok_or_else(|| self.missing())
    }

    /// Collapsed text of the located element.
    pub fn text(&self, scope: ElementRef<'_>) -> Result<String, ExtractionError> {
        Ok(self.find(scope)?.collapsed_text())
    }

    pub fn text_optional(&self, scope: ElementRef<'_>) -> Result<Option<String>, ExtractionError> {
        Ok(self.find_optional(scope)?.map(|el| el.collapsed_text()))
    }

    pub fn attr(&self, scope: ElementRef<'_>, name: &str) -> Result<String, ExtractionError> {
        self.find(scope)?
            .value()
            .attr(name)
            .map(|value| value.trim().to_string())
            .ok_or_else(|| self.missing())
    }
}
