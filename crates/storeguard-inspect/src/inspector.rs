use crate::catalog::{DetectionRule, PatternCatalog};

/// Checks single values against a [`PatternCatalog`].
///
/// Holds only a shared reference to the catalog, so it is `Copy` and can be used
/// from any number of tasks at once.
#[derive(Debug, Clone, Copy)]
pub struct ContentInspector<'a> {
    catalog: &'a PatternCatalog,
}

impl Default for ContentInspector<'static> {
    fn default() -> Self {
        Self::new(PatternCatalog::builtin())
    }
}

impl<'a> ContentInspector<'a> {
    pub fn new(catalog: &'a PatternCatalog) -> Self {
        Self { catalog }
    }

    /// Return the first rule, in catalog order, that matches `value`.
    ///
    /// Empty and whitespace-only values never match.
    pub fn inspect(&self, value: &str) -> Option<&'a DetectionRule> {
        if value.trim().is_empty() {
            return None;
        }
        self.catalog.rules().iter().find(|rule| rule.is_match(value))
    }
}
