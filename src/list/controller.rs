use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use super::state::{ListSnapshot, ListState, LoadOutcome};
use crate::config::SyncConfig;
use crate::error::TransportError;
use crate::feed::{ChangeFeed, ListEvent, ListStatus};
use crate::pagination::PageSummary;
use crate::query::{PageQuery, PageResult};
use crate::resource::Resource;
use crate::search::SearchDebouncer;
use crate::transport::Transport;

struct Inner<R, T: ?Sized> {
    transport: Arc<T>,
    state: Mutex<ListState<R>>,
    debouncer: SearchDebouncer,
    feed: ChangeFeed,
}

/// List controller for resource `R`, fetching through transport `T`.
///
/// Cheap to clone; clones drive the same list. Dropping the last handle
/// cancels a pending search commit.
pub struct ResourceList<R, T: ?Sized> {
    inner: Arc<Inner<R, T>>,
}

impl<R, T: ?Sized> Clone for ResourceList<R, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, T> ResourceList<R, T>
where
    R: Resource,
    T: Transport + ?Sized + 'static,
{
    pub fn new(transport: Arc<T>, config: &SyncConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                state: Mutex::new(ListState::new(config.page_size)),
                debouncer: SearchDebouncer::new(config.search_delay()),
                feed: ChangeFeed::new(),
            }),
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.inner.transport
    }

    /// Fetch the page described by `query` and make it authoritative.
    ///
    /// If another load is issued before this one completes, this response
    /// is discarded. A failure keeps the current rows and records the error.
    /// A page past the end (404 on page > 1, e.g. after the last row of the
    /// last page was deleted) steps back one page and loads again.
    pub async fn load(&self, mut query: PageQuery) -> LoadOutcome {
        loop {
            let (generation, event) = {
                let mut state = self.state();
                let generation = state.begin(&query);
                (generation, state.event(R::PATH))
            };
            self.inner.feed.publish(&event);
            debug!("{} load #{} page {}", R::PATH, generation, query.page_number);

            let result = match self.inner.transport.list(R::PATH, &query).await {
                Ok(body) => PageResult::<R>::decode(body),
                Err(err) => Err(err),
            };

            let settled = {
                let mut state = self.state();
                if state.generation != generation {
                    debug!(
                        "{} dropping stale response #{} (current #{})",
                        R::PATH,
                        generation,
                        state.generation
                    );
                    return LoadOutcome::Stale;
                }
                match result {
                    Err(err) if err.is_not_found() && query.page_number > 1 => None,
                    Ok(page) => {
                        state.apply(page.items, page.total_count);
                        Some((LoadOutcome::Applied, state.event(R::PATH)))
                    }
                    Err(err) => {
                        warn!("{} load #{} failed: {}", R::PATH, generation, err);
                        state.fail(err.clone());
                        Some((LoadOutcome::Failed(err), state.event(R::PATH)))
                    }
                }
            };

            match settled {
                Some((outcome, event)) => {
                    self.inner.feed.publish(&event);
                    return outcome;
                }
                None => {
                    debug!(
                        "{} page {} no longer exists, stepping back",
                        R::PATH,
                        query.page_number
                    );
                    query = query.with_page(query.page_number - 1);
                }
            }
        }
    }

    /// Re-issue the last query.
    pub async fn refresh(&self) -> LoadOutcome {
        let query = self.state().query.clone();
        self.load(query).await
    }

    /// Set (`Some`) or clear (`None`) a filter and reload from page 1.
    pub async fn apply_filter(&self, key: &str, value: Option<String>) -> LoadOutcome {
        let query = self.state().query.with_filter(key, value);
        self.load(query).await
    }

    /// Move to page `n`, clamped to the known page range.
    ///
    /// The upper bound is only known once a load of the current filters and
    /// search has been applied; until then `n` is taken as is and a page
    /// past the end steps back on load. Returns `None` without fetching when
    /// the page is already current. An actual page change drops any pending
    /// search commit.
    pub async fn set_page(&self, n: u32) -> Option<LoadOutcome> {
        let query = {
            let mut state = self.state();
            if !state.move_to(n) {
                return None;
            }
            let page = state.pagination.page_number();
            state.query.with_page(page)
        };
        self.inner.debouncer.cancel();
        Some(self.load(query).await)
    }

    pub async fn next_page(&self) -> Option<LoadOutcome> {
        let current = self.state().pagination.page_number();
        self.set_page(current.saturating_add(1)).await
    }

    pub async fn previous_page(&self) -> Option<LoadOutcome> {
        let current = self.state().pagination.page_number();
        self.set_page(current.saturating_sub(1)).await
    }

    /// Change the page size and reload from page 1.
    pub async fn set_page_size(&self, size: u32) -> Option<LoadOutcome> {
        let query = {
            let mut state = self.state();
            if !state.pagination.set_page_size(size) {
                return None;
            }
            let size = state.pagination.page_size();
            state.query.with_page_size(size)
        };
        Some(self.load(query).await)
    }

    /// Feed one keystroke of the search box. The term is committed after
    /// the configured quiet period.
    pub fn input_search(&self, text: impl Into<String>) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.debouncer.on_input(text, move |term| async move {
            if let Some(inner) = weak.upgrade() {
                let list = ResourceList { inner };
                list.run_search(term).await;
            }
        });
    }

    /// Commit `term` now, skipping the debounce. Always lands on page 1.
    pub async fn commit_search(&self, term: impl Into<String>) -> LoadOutcome {
        self.inner.debouncer.cancel();
        self.run_search(term.into()).await
    }

    /// Drop a typed but not yet committed search term.
    pub fn cancel_search(&self) -> bool {
        self.inner.debouncer.cancel()
    }

    pub fn is_search_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// Dismiss the error banner. The rows are unaffected.
    pub fn clear_error(&self) -> bool {
        let (cleared, event) = {
            let mut state = self.state();
            let cleared = state.clear_error();
            (cleared, state.event(R::PATH))
        };
        if cleared {
            self.inner.feed.publish(&event);
        }
        cleared
    }

    pub fn status(&self) -> ListStatus {
        self.state().status
    }

    pub fn is_loading(&self) -> bool {
        self.status() == ListStatus::Loading
    }

    pub fn items(&self) -> Vec<R> {
        self.state().items.clone()
    }

    /// Row with the given id on the current page.
    pub fn find(&self, id: &str) -> Option<R> {
        self.state().items.iter().find(|row| row.id() == id).cloned()
    }

    pub fn error(&self) -> Option<TransportError> {
        self.state().error.clone()
    }

    pub fn query(&self) -> PageQuery {
        self.state().query.clone()
    }

    pub fn page(&self) -> PageSummary {
        self.state().pagination.describe()
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn snapshot(&self) -> ListSnapshot<R> {
        self.state().snapshot()
    }

    /// Subscribe to state transitions. Returns the listener id.
    pub fn on_change<F>(&self, listener: F) -> String
    where
        F: Fn(ListEvent) + Send + Sync + 'static,
    {
        self.inner.feed.on_change(listener)
    }

    pub fn remove_listener(&self, listener_id: &str) -> bool {
        self.inner.feed.remove(listener_id)
    }

    async fn run_search(&self, term: String) -> LoadOutcome {
        let query = self.state().query.with_search(term);
        self.load(query).await
    }

    fn state(&self) -> MutexGuard<'_, ListState<R>> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
