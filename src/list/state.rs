use crate::error::TransportError;
use crate::feed::{ListEvent, ListStatus};
use crate::pagination::{PageSummary, Pagination};
use crate::query::PageQuery;

/// What happened to one `load`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The page replaced the list.
    Applied,
    /// A newer load was issued first; the response was discarded.
    Stale,
    /// The fetch failed; the previous rows are still shown.
    Failed(TransportError),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied)
    }
}

/// Point-in-time copy of a list's state.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<R> {
    pub status: ListStatus,
    pub items: Vec<R>,
    pub page: PageSummary,
    pub query: PageQuery,
    pub generation: u64,
    pub error: Option<TransportError>,
}

pub(crate) struct ListState<R> {
    pub status: ListStatus,
    pub items: Vec<R>,
    pub pagination: Pagination,
    pub query: PageQuery,
    pub generation: u64,
    pub applied_once: bool,
    /// Query whose count `pagination` currently holds.
    pub counted: Option<PageQuery>,
    pub error: Option<TransportError>,
}

impl<R: Clone> ListState<R> {
    pub fn new(page_size: u32) -> Self {
        Self {
            status: ListStatus::Idle,
            items: Vec::new(),
            pagination: Pagination::new(page_size),
            query: PageQuery::new(page_size),
            generation: 0,
            applied_once: false,
            counted: None,
            error: None,
        }
    }

    /// Stamp a new fetch and return its generation.
    pub fn begin(&mut self, query: &PageQuery) -> u64 {
        self.generation += 1;
        self.status = ListStatus::Loading;
        self.pagination.follow(query.page_number, query.page_size);
        self.query = query.clone();
        self.generation
    }

    pub fn apply(&mut self, items: Vec<R>, total_count: u64) {
        self.items = items;
        self.pagination.set_total_count(total_count);
        self.status = ListStatus::Populated;
        self.applied_once = true;
        self.counted = Some(self.query.clone());
        self.error = None;
    }

    /// Move the current page to `n`. Clamped to the known page range only
    /// when the known count belongs to the current query.
    pub fn move_to(&mut self, n: u32) -> bool {
        let counted = self
            .counted
            .as_ref()
            .is_some_and(|counted| counted.same_collection(&self.query));
        if counted {
            return self.pagination.set_page(n);
        }
        let target = n.max(1);
        if target == self.pagination.page_number() {
            return false;
        }
        let size = self.pagination.page_size();
        self.pagination.follow(target, size);
        true
    }

    /// Record a failure. Rows are left untouched.
    pub fn fail(&mut self, err: TransportError) {
        self.status = ListStatus::Errored;
        self.error = Some(err);
    }

    pub fn clear_error(&mut self) -> bool {
        if self.error.take().is_none() {
            return false;
        }
        if self.status == ListStatus::Errored {
            self.status = if self.applied_once {
                ListStatus::Populated
            } else {
                ListStatus::Idle
            };
        }
        true
    }

    pub fn event(&self, resource: &str) -> ListEvent {
        ListEvent {
            resource: resource.to_string(),
            status: self.status,
            generation: self.generation,
            total_count: self.pagination.total_count(),
            item_count: self.items.len(),
            error: ListEvent::error_from(self.error.as_ref()),
        }
    }

    pub fn snapshot(&self) -> ListSnapshot<R> {
        ListSnapshot {
            status: self.status,
            items: self.items.clone(),
            page: self.pagination.describe(),
            query: self.query.clone(),
            generation: self.generation,
            error: self.error.clone(),
        }
    }
}
