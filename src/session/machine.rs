use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::core::{TableRef, TabulaError};
use crate::session::ViewState;
use crate::store::TableStore;

/// Resting states of the load/edit/commit machine. Commit, rollback and
/// import are transient: each runs to completion inside a single transition
/// call and terminates back in `Stale`, which the same call resolves by
/// reloading into `Editing`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing loaded yet and nothing pending.
    #[default]
    Clean,
    /// A filter application was requested but the filtered read has not
    /// succeeded yet.
    FilterPending,
    /// The snapshot no longer reflects the store; a reload is required
    /// before the edit surface is valid.
    Stale,
    /// Snapshot loaded and bound to the current edit session.
    Editing,
}

/// One-shot outcome notice, surfaced to the user exactly once by whoever
/// receives the [`Transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Committed,
    RolledBack,
    Imported,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Notice::Committed => "Changes saved (COMMIT).",
            Notice::RolledBack => "Changes discarded (ROLLBACK); data reloaded from the store.",
            Notice::Imported => "Table replaced with imported data.",
        };
        f.write_str(msg)
    }
}

/// Result of a transition: the resting phase, the edit-session generation
/// the surface must be bound under, and at most one notice to display.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub phase: Phase,
    pub generation: u64,
    pub notice: Option<Notice>,
}

/// Read-only projection handed to the presentation layer on render.
#[derive(Debug, Clone)]
pub struct RenderView {
    pub phase: Phase,
    pub generation: u64,
    pub binding_key: String,
    pub table: Option<TableRef>,
    pub filter: Option<String>,
    pub snapshot: Option<RecordBatch>,
}

/// The single interactive edit session: view state plus the snapshot of the
/// selected table as of the last successful load.
///
/// Every transition runs to completion before the next one is accepted (the
/// caller serializes them); the machine itself performs no synchronization.
/// Notices are returned as effects, never stored, so they cannot be surfaced
/// twice.
pub struct Session {
    view: ViewState,
    snapshot: Option<RecordBatch>,
    phase: Phase,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            view: ViewState::new(),
            snapshot: None,
            phase: Phase::Clean,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn snapshot(&self) -> Option<&RecordBatch> {
        self.snapshot.as_ref()
    }

    /// Select a table. The filter resets, the previous snapshot is discarded
    /// (never shared across tables), and the new table is loaded. A load
    /// failure leaves the selection in place with the session stale.
    pub async fn select_table(
        &mut self,
        store: &dyn TableStore,
        id: TableRef,
    ) -> Result<Transition, TabulaError> {
        self.view.select_table(id);
        self.snapshot = None;
        self.phase = Phase::Stale;
        self.reload(store).await?;
        Ok(self.transition(None))
    }

    /// Apply a row filter. The reload is unconditional: applying the same
    /// text twice still triggers a fresh read. A filter application always
    /// wins over a pending stale reload because the reload target is taken
    /// from the filter state at read time.
    pub async fn apply_filter(
        &mut self,
        store: &dyn TableStore,
        text: &str,
    ) -> Result<Transition, TabulaError> {
        if self.view.table().is_none() {
            return Err(TabulaError::NoTableSelected);
        }
        self.view.apply_filter(text)?;
        self.phase = Phase::FilterPending;
        self.reload(store).await?;
        Ok(self.transition(None))
    }

    /// Drop the filter and reload unfiltered. Idempotent; succeeds even with
    /// no table selected.
    pub async fn clear_filter(
        &mut self,
        store: &dyn TableStore,
    ) -> Result<Transition, TabulaError> {
        if self.view.table().is_none() {
            self.view.clear_filter();
            return Ok(self.transition(None));
        }
        self.view.clear_filter();
        self.phase = Phase::Stale;
        self.reload(store).await?;
        Ok(self.transition(None))
    }

    /// Discard all in-progress edits by re-reading from the store (honoring
    /// the active filter). This is reload-from-authority, not undo: whatever
    /// the store holds now is what reappears. On success the edit session
    /// advances, invalidating the previous surface.
    pub async fn rollback(&mut self, store: &dyn TableStore) -> Result<Transition, TabulaError> {
        if self.view.table().is_none() {
            return Err(TabulaError::NoTableSelected);
        }
        self.view.mark_stale();
        self.phase = Phase::Stale;
        self.reload(store).await?;
        self.view.advance_session();
        Ok(self.transition(Some(Notice::RolledBack)))
    }

    /// Destructive full replace of the table with the edited snapshot.
    pub async fn commit(
        &mut self,
        store: &dyn TableStore,
        edited: RecordBatch,
    ) -> Result<Transition, TabulaError> {
        self.replace_table(store, edited, Notice::Committed).await
    }

    /// Same replace semantics as commit, with externally supplied data.
    pub async fn import_replace(
        &mut self,
        store: &dyn TableStore,
        imported: RecordBatch,
    ) -> Result<Transition, TabulaError> {
        self.replace_table(store, imported, Notice::Imported).await
    }

    /// Projection for rendering. Resolves a pending reload first, so the
    /// returned snapshot always reflects the current filter and table.
    pub async fn render(&mut self, store: &dyn TableStore) -> Result<RenderView, TabulaError> {
        if self.view.table().is_some() && self.view.is_stale() {
            self.reload(store).await?;
        }
        Ok(RenderView {
            phase: self.phase,
            generation: self.view.generation(),
            binding_key: self.view.binding_key(),
            table: self.view.table().cloned(),
            filter: self.view.filter().as_applied().map(str::to_string),
            snapshot: self.snapshot.clone(),
        })
    }

    async fn replace_table(
        &mut self,
        store: &dyn TableStore,
        data: RecordBatch,
        notice: Notice,
    ) -> Result<Transition, TabulaError> {
        let id = self
            .view
            .table()
            .cloned()
            .ok_or(TabulaError::NoTableSelected)?;

        if let Err(err) = store.overwrite_table(&id, &data).await {
            // No state advance: the surface keeps the submitted data under
            // the unchanged generation so the user can retry without loss.
            self.snapshot = Some(data);
            self.view.mark_loaded();
            self.phase = Phase::Editing;
            return Err(err);
        }

        // The write is durable at this point; the generation advances even
        // if the follow-up reload fails.
        self.view.advance_session();
        self.view.mark_stale();
        self.phase = Phase::Stale;
        self.reload(store).await?;
        Ok(self.transition(Some(notice)))
    }

    /// Re-read the selected table, filtered when a filter is applied. State
    /// is only touched after the read succeeds, so a failure leaves the last
    /// successful snapshot bound.
    async fn reload(&mut self, store: &dyn TableStore) -> Result<(), TabulaError> {
        let Some(id) = self.view.table().cloned() else {
            return Ok(());
        };
        let batch = match self.view.filter().as_applied() {
            Some(predicate) => store.load_table_filtered(&id, predicate).await?,
            None => store.load_table(&id).await?,
        };
        self.snapshot = Some(batch);
        self.view.mark_loaded();
        self.phase = Phase::Editing;
        Ok(())
    }

    fn transition(&self, notice: Option<Notice>) -> Transition {
        Transition {
            phase: self.phase,
            generation: self.view.generation(),
            notice,
        }
    }
}
