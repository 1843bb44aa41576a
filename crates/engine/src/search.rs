//! Streaming search pipeline.
//!
//! Results are emitted individually (live-update consumers) and accumulated
//! into fixed-size batches (bulk consumers); the item budget is the only
//! bound on unbounded result sets. Cancellation is cooperative and observed
//! between emissions, never mid-batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::Backend;
use crate::error::SearchError;
use crate::model::{parse_address, Measurement};
use crate::query::{Query, SearchField};

/// Shared flag a caller flips to stop a running search.
pub type CancelToken = Arc<AtomicBool>;

/// Events emitted over the lifetime of one search stream.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    Started { field: SearchField, text: String },
    /// One record, emitted as soon as it clears the budget check.
    Item(Measurement),
    /// A full batch (`batch_size` records), or the final partial batch.
    Batch(Vec<Measurement>),
    /// Natural completion. Never emitted for a cancelled stream.
    Done(SearchSummary),
}

/// Terminal summary of a completed (uncancelled) search.
#[derive(Debug, Clone)]
pub struct SearchSummary {
    pub found: usize,
    /// True when the stream stopped early because the item budget ran out.
    pub capped: bool,
    pub elapsed: Duration,
}

impl std::fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.capped {
            write!(f, "max entries found {} in {:.2} seconds", self.found, self.elapsed.as_secs_f64())
        } else {
            write!(f, "found {} items in {:.2} seconds", self.found, self.elapsed.as_secs_f64())
        }
    }
}

/// Run one search against a backend, streaming events into `sink`.
///
/// Returns `Ok(Some(summary))` on natural completion, `Ok(None)` when the
/// cancel token was observed (no `Done` event is emitted in that case), and
/// `Err` for an unparsable address query or a backend failure — both yield
/// an empty stream, never partial results.
pub fn run_search(
    backend: &dyn Backend,
    query: &Query,
    cancel: &CancelToken,
    sink: &mut dyn FnMut(SearchEvent),
) -> Result<Option<SearchSummary>, SearchError> {
    let started = Instant::now();
    sink(SearchEvent::Started { field: query.field, text: query.text.clone() });

    let results = match query.field {
        SearchField::Name => backend.find_by_name(&query.text, query.position)?,
        SearchField::Description => backend.find_by_description(&query.text, query.position)?,
        SearchField::Address => {
            let address = parse_address(&query.text)
                .ok_or_else(|| SearchError::InvalidQuery(query.text.clone()))?;
            backend.find_by_address(address, query.position)?
        }
    };

    let capped = results.len() > query.max_items;
    let mut batch: Vec<Measurement> = Vec::with_capacity(query.batch_size.min(256));
    let mut emitted = 0usize;

    for m in results {
        if cancel.load(Ordering::Relaxed) {
            return Ok(None);
        }
        if emitted == query.max_items {
            break;
        }
        sink(SearchEvent::Item(m.clone()));
        batch.push(m);
        emitted += 1;
        if batch.len() == query.batch_size {
            sink(SearchEvent::Batch(std::mem::take(&mut batch)));
        }
    }

    if !batch.is_empty() {
        sink(SearchEvent::Batch(batch));
    }

    let summary = SearchSummary { found: emitted, capped, elapsed: started.elapsed() };
    sink(SearchEvent::Done(summary.clone()));
    Ok(Some(summary))
}

/// Run a search to completion and collect the emitted records.
/// Used by the reconciliation engine, which needs each lookup fully
/// finished before the next one starts.
pub fn collect(backend: &dyn Backend, query: &Query) -> Result<Vec<Measurement>, SearchError> {
    let cancel: CancelToken = Arc::new(AtomicBool::new(false));
    let mut out = Vec::new();
    run_search(backend, query, &cancel, &mut |event| {
        if let SearchEvent::Item(m) = event {
            out.push(m);
        }
    })?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Single-flight guard
// ---------------------------------------------------------------------------

/// At most one task may hold the flight at a time; a second start request is
/// rejected, not queued. Release happens when the guard drops.
#[derive(Default)]
pub struct SingleFlight {
    active: AtomicBool,
}

impl SingleFlight {
    pub const fn new() -> Self {
        Self { active: AtomicBool::new(false) }
    }

    pub fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { flag: &self.active })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

pub struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
