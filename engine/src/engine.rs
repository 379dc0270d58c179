//! The engine facade: the one piece of this crate that owns a thread.
//!
//! `Engine` wraps a position and a transposition table behind a small,
//! non-blocking API: `search()` spawns a worker and returns immediately,
//! progress and the final result arrive through callbacks, and `stop()`
//! asks the worker to wind down and waits for it. Unlike a detached
//! fire-and-forget thread, the `JoinHandle` is kept around so `stop()` (and
//! `Drop`) can guarantee the worker has actually exited before returning,
//! rather than merely having asked it to.

use crate::position::Position;
use crate::search::{SearchData, SearchReport};
use crate::transpositions::TTable;
use chess::board::Board;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

pub use crate::search::SearchLimits;

/// One ply of recursion costs roughly this much stack on a 64-bit target
/// with this crate's frame sizes; `MAX_PLY` deep recursion comfortably fits
/// in a 1 MiB worker stack with headroom to spare.
const SEARCH_STACK_SIZE: usize = 1 << 20;

/// A progress or final report from a search in flight.
#[derive(Debug, Clone, Default)]
pub struct SearchEvent {
    pub report: SearchReport,
    pub is_final: bool,
}

pub struct Engine {
    position: Position,
    tt: Arc<Mutex<TTable>>,
    aborted: Arc<AtomicBool>,
    searching: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn new(tt_size_mb: usize) -> Self {
        Self {
            position: Position::new(Board::default()),
            tt: Arc::new(Mutex::new(TTable::with_capacity(tt_size_mb))),
            aborted: Arc::new(AtomicBool::new(false)),
            searching: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Silently ignored while a search is running: mutating the position
    /// out from under an in-flight search would break the "position stays
    /// constant for the lifetime of a node" guarantee the search kernel
    /// relies on.
    pub fn set_position(&mut self, board: Board) {
        if self.is_searching() {
            return;
        }

        self.position = Position::new(board);
    }

    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::Relaxed)
    }

    /// Start a search on a background thread. A no-op (reentry guard) if a
    /// search is already running — starting a second search concurrently
    /// isn't supported, and misuse like this is defined to be silent
    /// rather than an error.
    pub fn search(
        &mut self,
        limits: SearchLimits,
        mut on_progress: impl FnMut(SearchEvent) + Send + 'static,
        mut on_finish: impl FnMut(SearchEvent) + Send + 'static,
    ) {
        if self.is_searching() {
            return;
        }

        self.searching.store(true, Ordering::Relaxed);
        self.aborted.store(false, Ordering::Relaxed);

        let position = self.position.clone();
        let tt = Arc::clone(&self.tt);
        let aborted = Arc::clone(&self.aborted);
        let searching = Arc::clone(&self.searching);

        let builder = std::thread::Builder::new()
            .name("gambit-search".into())
            .stack_size(SEARCH_STACK_SIZE);

        let handle = builder
            .spawn(move || {
                let mut tt = tt.lock().expect("transposition table mutex poisoned");
                tt.increment_age();

                let mut data = SearchData::new(position, limits, &mut tt, Arc::clone(&aborted));

                let final_report = data.run(|report| {
                    on_progress(SearchEvent {
                        report: report.clone(),
                        is_final: false,
                    });
                });

                on_finish(SearchEvent {
                    report: final_report,
                    is_final: true,
                });

                // Cleared after the finish callback returns, not before: a
                // caller that polls `is_searching()` from inside its own
                // `on_finish` must still observe `true`.
                searching.store(false, Ordering::Relaxed);
            })
            .expect("failed to spawn search worker thread");

        self.worker = Some(handle);
    }

    /// Ask the in-flight search to stop and block until its worker thread
    /// has exited. A no-op if nothing is searching.
    pub fn stop(&mut self) {
        self.aborted.store(true, Ordering::Relaxed);
        self.join();
    }

    /// Block until the current (or most recently started) search's worker
    /// has returned, without requesting cancellation. Search limits end
    /// searches on their own; this is for tests and callers that just want
    /// to wait for that to happen.
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(16)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::board::Board;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn search_runs_to_completion_and_reports_finish_exactly_once() {
        let mut engine = Engine::new(1);
        let (tx, rx) = mpsc::channel();

        let limits = SearchLimits {
            max_depth: Some(3),
            ..Default::default()
        };

        engine.search(limits, |_| {}, move |event| {
            tx.send(event).unwrap();
        });

        let event = rx.recv_timeout(Duration::from_secs(5)).expect("search never finished");
        assert!(event.is_final);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        engine.join();
        assert!(!engine.is_searching());
    }

    #[test]
    fn reentrant_search_call_is_ignored() {
        let mut engine = Engine::new(1);
        let limits = SearchLimits {
            max_depth: Some(20),
            ..Default::default()
        };

        engine.search(limits.clone(), |_| {}, |_| {});
        assert!(engine.is_searching());

        // A second call while one is already running must be a silent
        // no-op, not a panic or a second worker thread.
        engine.search(limits, |_| {}, |_| {});

        engine.stop();
        assert!(!engine.is_searching());
    }

    #[test]
    fn set_position_is_ignored_mid_search() {
        let mut engine = Engine::new(1);
        let limits = SearchLimits {
            max_depth: Some(20),
            ..Default::default()
        };

        engine.search(limits, |_| {}, |_| {});
        engine.set_position(Board::default());
        engine.stop();
    }
}
