use scraper::ElementRef;

use crate::transform::normalize_whitespace;

pub(crate) trait ElementRefExt {
    /// All descendant text, whitespace-collapsed.
    fn collapsed_text(&self) -> String;
}

impl ElementRefExt for ElementRef<'_> {
    fn collapsed_text(&self) -> String {
        normalize_whitespace(&self.text().collect::<String>())
    }
}
