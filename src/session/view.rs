use crate::core::{TableRef, TabulaError};

/// Optional free-text row predicate plus its "applied" marker.
///
/// Invariant: the filter is applied only while the text is non-empty; clearing
/// resets both together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    text: String,
    applied: bool,
}

impl Filter {
    pub fn absent() -> Self {
        Self::default()
    }

    /// Mark the filter applied. Empty text is rejected before any store call.
    pub fn apply(&mut self, text: &str) -> Result<(), TabulaError> {
        if text.trim().is_empty() {
            return Err(TabulaError::InvalidFilter);
        }
        self.text = text.to_string();
        self.applied = true;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.applied = false;
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Predicate text, present only while the filter is applied.
    pub fn as_applied(&self) -> Option<&str> {
        self.applied.then_some(self.text.as_str())
    }
}

/// Single source of truth for what the session currently points at: the
/// selected table, the active filter, whether the loaded snapshot is stale,
/// and the edit-session generation counter scoping the editable surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    table: Option<TableRef>,
    filter: Filter,
    stale: bool,
    generation: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            table: None,
            filter: Filter::absent(),
            stale: true,
            generation: 0,
        }
    }

    pub fn table(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Edit-session generation. Any editable surface bound under an older
    /// generation must be discarded and rebound.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Key the presentation layer binds the editable surface to.
    pub fn binding_key(&self) -> String {
        format!("editor-{}", self.generation)
    }

    /// Select a table: the filter resets and the snapshot becomes stale.
    /// Any syntactically valid identifier is accepted; the store is the
    /// authority on existence.
    pub fn select_table(&mut self, id: TableRef) {
        self.table = Some(id);
        self.filter.clear();
        self.stale = true;
    }

    pub fn apply_filter(&mut self, text: &str) -> Result<(), TabulaError> {
        self.filter.apply(text)?;
        self.stale = true;
        Ok(())
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.stale = true;
    }

    pub fn mark_loaded(&mut self) {
        self.stale = false;
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Mint a new edit session, invalidating every previously bound surface.
    pub fn advance_session(&mut self) {
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_rejects_empty_text() {
        let mut filter = Filter::absent();
        assert_eq!(filter.apply(""), Err(TabulaError::InvalidFilter));
        assert_eq!(filter.apply("   "), Err(TabulaError::InvalidFilter));
        assert!(!filter.is_applied());
    }

    #[test]
    fn test_filter_applied_only_when_nonempty() {
        let mut filter = Filter::absent();
        filter.apply("status = 'active'").unwrap();
        assert_eq!(filter.as_applied(), Some("status = 'active'"));

        filter.clear();
        assert_eq!(filter.as_applied(), None);
        assert!(!filter.is_applied());
    }

    #[test]
    fn test_select_table_resets_filter_and_marks_stale() {
        let mut view = ViewState::new();
        view.select_table(TableRef::new("SALES", "ORDERS"));
        view.apply_filter("amount > 100").unwrap();
        view.mark_loaded();

        view.select_table(TableRef::new("SALES", "CUSTOMERS"));
        assert!(view.is_stale());
        assert!(!view.filter().is_applied());
        assert_eq!(view.table().unwrap().name, "CUSTOMERS");
    }

    #[test]
    fn test_advance_session_changes_binding_key() {
        let mut view = ViewState::new();
        let before = view.binding_key();
        view.advance_session();
        assert_ne!(view.binding_key(), before);
        assert_eq!(view.generation(), 1);
    }

    #[test]
    fn test_clear_filter_idempotent() {
        let mut view = ViewState::new();
        view.select_table(TableRef::new("SALES", "ORDERS"));
        view.apply_filter("id = 1").unwrap();

        view.clear_filter();
        let after_once = view.clone();
        view.clear_filter();
        assert_eq!(view, after_once);
    }
}
