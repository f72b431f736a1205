use std::borrow::Cow;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::feed::NewsRecord;
use crate::news::{Aggregation, FilterMode, NewsService, SourceOutcome};

/// Seconds a status bar message stays visible.
const STATUS_TTL_SECS: u64 = 3;

/// Whether keys drive navigation or edit the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Browse,
    EditingQuery,
}

/// Results of background work, delivered to the event loop.
pub enum AppEvent {
    /// A refresh finished. `generation` identifies which refresh it was.
    NewsLoaded {
        generation: u64,
        aggregation: Aggregation,
    },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

/// Dashboard state.
pub struct App {
    pub service: Arc<NewsService>,

    /// Search text of the last applied refresh.
    pub query: String,
    /// Search box contents while editing.
    pub query_input: String,
    pub filter: FilterMode,
    pub input_mode: InputMode,

    /// Merged records, newest first.
    pub records: Vec<NewsRecord>,
    /// Per-source result of the last refresh.
    pub outcomes: Vec<SourceOutcome>,
    pub selected: usize,

    /// True between starting a refresh and receiving its result.
    pub loading: bool,
    /// Bumped on every refresh; results from older refreshes are dropped.
    pub generation: u64,
    pub refresh_handle: Option<JoinHandle<()>>,
    pub spinner_frame: usize,

    pub summary_max_chars: usize,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(
        service: Arc<NewsService>,
        query: String,
        filter: FilterMode,
        summary_max_chars: usize,
    ) -> Self {
        Self {
            service,
            query_input: query.clone(),
            query,
            filter,
            input_mode: InputMode::Browse,
            records: Vec::new(),
            outcomes: Vec::new(),
            selected: 0,
            loading: false,
            generation: 0,
            refresh_handle: None,
            spinner_frame: 0,
            summary_max_chars,
            status_message: None,
            needs_redraw: true,
        }
    }

    pub fn selected_record(&self) -> Option<&NewsRecord> {
        self.records.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.records.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.records.len().saturating_sub(1);
    }

    pub fn start_editing(&mut self) {
        self.query_input = self.query.clone();
        self.input_mode = InputMode::EditingQuery;
    }

    pub fn cancel_editing(&mut self) {
        self.query_input = self.query.clone();
        self.input_mode = InputMode::Browse;
    }

    /// Commits the search box; returns true when the query changed.
    pub fn commit_query(&mut self) -> bool {
        self.input_mode = InputMode::Browse;
        let committed = self.query_input.trim().to_string();
        let changed = committed != self.query;
        self.query = committed;
        changed
    }

    /// Applies a finished refresh unless a newer one has been started since.
    /// Returns false for stale results.
    pub fn apply_news(&mut self, generation: u64, aggregation: Aggregation) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "Discarding stale refresh result"
            );
            return false;
        }
        self.loading = false;
        self.refresh_handle = None;
        self.records = aggregation.records;
        self.outcomes = aggregation.outcomes;
        self.selected = self.selected.min(self.records.len().saturating_sub(1));
        true
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}
