use crate::error::TransportError;
use crate::nested::NestedEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
    View,
}

/// Why the last session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Committed,
    /// The server failed mid-write; the list was refreshed to find out.
    Uncertain,
    Cancelled,
    /// The record being edited was deleted.
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    /// No session. Carries how the previous one ended, if any.
    Closed(Option<CloseReason>),
    Opening,
    Open,
    Submitting,
}

impl FormStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, FormStatus::Open)
    }
}

/// How a submit settled.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<R> {
    /// Persisted. Carries the server's copy when it decoded.
    Committed(Option<R>),
    /// 5xx: the session closed and the list was refreshed anyway.
    Uncertain(TransportError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    /// 5xx: the list was refreshed to find out whether the record is gone.
    Uncertain(TransportError),
}

pub(crate) struct FormState<R> {
    pub status: FormStatus,
    pub mode: FormMode,
    /// Bumped on every open and cancel; late detail responses for an older
    /// session are discarded.
    pub session: u64,
    pub draft: Option<R>,
    pub nested: Option<NestedEditor>,
    /// Whether the draft came from the detail record rather than the list row.
    pub hydrated: bool,
    pub error: Option<TransportError>,
    pub pending_delete: Option<R>,
    pub deleting: bool,
    pub delete_error: Option<TransportError>,
}

impl<R> Default for FormState<R> {
    fn default() -> Self {
        Self {
            status: FormStatus::Closed(None),
            mode: FormMode::View,
            session: 0,
            draft: None,
            nested: None,
            hydrated: false,
            error: None,
            pending_delete: None,
            deleting: false,
            delete_error: None,
        }
    }
}

impl<R> FormState<R> {
    pub fn begin(&mut self, mode: FormMode, status: FormStatus) -> u64 {
        self.session += 1;
        self.status = status;
        self.mode = mode;
        self.draft = None;
        self.nested = None;
        self.hydrated = false;
        self.error = None;
        self.session
    }

    pub fn close(&mut self, reason: CloseReason) {
        self.session += 1;
        self.status = FormStatus::Closed(Some(reason));
        self.draft = None;
        self.nested = None;
        self.hydrated = false;
        self.error = None;
    }
}
