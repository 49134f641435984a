//! Presentation state with request tagging.
//!
//! A [`ViewCell`] holds one view's `{ loading, data, error }`. Every fetch
//! starts with [`ViewCell::begin`], which returns a [`RequestTag`] carrying
//! the period code and a per-cell generation. [`ViewCell::finish`] applies a
//! response only if its tag is the latest one issued *and* its code is still
//! the selected period; anything else is discarded. Responses may arrive in
//! any order.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

use crate::period::PeriodCode;
use crate::types::DashboardResult;

/// Identity of one outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub code: PeriodCode,
    pub generation: u64,
}

/// What [`ViewCell::finish`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Failed,
    Discarded,
}

/// Snapshot of a view's presentation state.
#[derive(Debug, Clone)]
pub struct ViewState<T> {
    pub loading: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Period whose data is shown.
    pub period: Option<PeriodCode>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            loading: false,
            data: None,
            error: None,
            period: None,
        }
    }
}

/// Progress counters published after every state change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStatus {
    pub loading: bool,
    /// Responses received so far, applied or not.
    pub settled: u64,
}

struct Inner<T> {
    state: ViewState<T>,
    generation: u64,
    settled: u64,
}

pub struct ViewCell<T> {
    name: &'static str,
    inner: Mutex<Inner<T>>,
    status: watch::Sender<CellStatus>,
}

impl<T: Clone> ViewCell<T> {
    pub fn new(name: &'static str) -> Self {
        let (status, _) = watch::channel(CellStatus::default());
        Self {
            name,
            inner: Mutex::new(Inner {
                state: ViewState::default(),
                generation: 0,
                settled: 0,
            }),
            status,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Mark the cell loading and tag a new request for `code`.
    pub fn begin(&self, code: PeriodCode) -> RequestTag {
        let (tag, settled) = {
            let mut inner = self.inner();
            inner.generation += 1;
            inner.state.loading = true;
            (
                RequestTag {
                    code,
                    generation: inner.generation,
                },
                inner.settled,
            )
        };
        tracing::debug!(
            "[{}] request #{} for period {}",
            self.name,
            tag.generation,
            tag.code
        );
        self.status.send_replace(CellStatus {
            loading: true,
            settled,
        });
        tag
    }

    /// Apply or discard a response. `selected` is the period selected now.
    ///
    /// The loading flag is cleared whenever the response belongs to the
    /// latest request, even if it is discarded, so the view never stays
    /// stuck loading.
    pub fn finish(
        &self,
        tag: RequestTag,
        selected: Option<PeriodCode>,
        result: DashboardResult<T>,
    ) -> Outcome {
        let mut failure = None;
        let (outcome, status) = {
            let mut inner = self.inner();
            inner.settled += 1;
            let latest = tag.generation == inner.generation;
            let current = selected == Some(tag.code);

            if latest {
                inner.state.loading = false;
            }

            let outcome = if !(latest && current) {
                Outcome::Discarded
            } else {
                inner.state.period = Some(tag.code);
                match result {
                    Ok(data) => {
                        inner.state.data = Some(data);
                        inner.state.error = None;
                        Outcome::Applied
                    }
                    Err(e) => {
                        let message = e.to_string();
                        inner.state.data = None;
                        inner.state.error = Some(message.clone());
                        failure = Some(message);
                        Outcome::Failed
                    }
                }
            };

            (
                outcome,
                CellStatus {
                    loading: inner.state.loading,
                    settled: inner.settled,
                },
            )
        };

        match outcome {
            Outcome::Applied => {
                tracing::debug!("[{}] applied period {}", self.name, tag.code)
            }
            Outcome::Failed => tracing::warn!(
                "[{}] fetch for period {} failed: {}",
                self.name,
                tag.code,
                failure.unwrap_or_default()
            ),
            Outcome::Discarded => tracing::debug!(
                "[{}] discarded stale response #{} for period {}",
                self.name,
                tag.generation,
                tag.code
            ),
        }

        self.status.send_replace(status);
        outcome
    }

    /// Replace the data directly (for derived edits that need no fetch).
    pub fn set(&self, data: Option<T>) {
        let status = {
            let mut inner = self.inner();
            inner.state.data = data;
            inner.state.error = None;
            CellStatus {
                loading: inner.state.loading,
                settled: inner.settled,
            }
        };
        self.status.send_replace(status);
    }

    pub fn snapshot(&self) -> ViewState<T> {
        self.inner().state.clone()
    }

    pub fn data(&self) -> Option<T> {
        self.inner().state.data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner().state.loading
    }

    pub fn status(&self) -> CellStatus {
        *self.status.borrow()
    }

    /// Wait until no request is outstanding.
    pub async fn wait_idle(&self) {
        let mut rx = self.status.subscribe();
        // Sender lives as long as self, so wait_for cannot fail here.
        let _ = rx.wait_for(|s| !s.loading).await;
    }

    /// Wait until at least `count` responses have been received.
    pub async fn wait_settled(&self, count: u64) {
        let mut rx = self.status.subscribe();
        let _ = rx.wait_for(|s| s.settled >= count).await;
    }
}
