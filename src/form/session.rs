use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use serde_json::Value;

use super::state::{CloseReason, DeleteOutcome, FormMode, FormState, FormStatus, SubmitOutcome};
use crate::error::{ErrorClass, FormError, TransportError};
use crate::list::ResourceList;
use crate::nested::{NestedEditor, NestedItem};
use crate::resource::{Resource, UpdateMethod};
use crate::transport::Transport;

/// Modal workflow bound to one [`ResourceList`].
///
/// Clones share the same session.
pub struct FormSession<R, T: ?Sized> {
    list: ResourceList<R, T>,
    state: Arc<Mutex<FormState<R>>>,
}

impl<R, T: ?Sized> Clone for FormSession<R, T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<R, T> FormSession<R, T>
where
    R: Resource,
    T: Transport + ?Sized + 'static,
{
    pub fn new(list: ResourceList<R, T>) -> Self {
        Self {
            list,
            state: Arc::new(Mutex::new(FormState::default())),
        }
    }

    pub fn list(&self) -> &ResourceList<R, T> {
        &self.list
    }

    /// Start a create session seeded with `initial`.
    pub fn open_create(&self, initial: R) -> Result<(), FormError> {
        let mut state = self.state();
        if state.status == FormStatus::Submitting {
            return Err(FormError::Busy);
        }
        state.begin(FormMode::Create, FormStatus::Open);
        state.nested = R::NESTED_FIELD
            .map(|_| NestedEditor::of::<R>(String::new(), nested_of(&initial).unwrap_or_default()));
        state.draft = Some(initial);
        Ok(())
    }

    /// Start an edit session for a list row.
    pub async fn open_edit(&self, summary: R) -> Result<(), FormError> {
        self.open_detail(summary, FormMode::Edit).await
    }

    /// Start a read-only session for a list row.
    pub async fn open_view(&self, summary: R) -> Result<(), FormError> {
        self.open_detail(summary, FormMode::View).await
    }

    /// Abandon the open session. Nothing is sent.
    ///
    /// Returns `false` when there is nothing to cancel or a submit is in
    /// flight.
    pub fn cancel(&self) -> bool {
        let mut state = self.state();
        match state.status {
            FormStatus::Opening | FormStatus::Open => {
                state.close(CloseReason::Cancelled);
                true
            }
            FormStatus::Submitting | FormStatus::Closed(_) => false,
        }
    }

    /// Apply `change` to the draft record.
    pub fn edit_draft<F, O>(&self, change: F) -> Result<O, FormError>
    where
        F: FnOnce(&mut R) -> O,
    {
        let mut state = self.state();
        writable(&state)?;
        let draft = state.draft.as_mut().ok_or(FormError::NotOpen)?;
        Ok(change(draft))
    }

    /// Apply `change` to the nested editor. `None` when `R` has no nested
    /// collection.
    pub fn edit_nested<F, O>(&self, change: F) -> Result<Option<O>, FormError>
    where
        F: FnOnce(&mut NestedEditor) -> O,
    {
        let mut state = self.state();
        writable(&state)?;
        Ok(state.nested.as_mut().map(change))
    }

    /// Write the draft.
    ///
    /// Creates go through `create`. Edits of records with a nested
    /// collection go through the nested editor's commit; other edits use
    /// `update` or `partial_update` depending on the resource.
    pub async fn submit(&self) -> Result<SubmitOutcome<R>, FormError> {
        let (mode, draft, mut nested) = {
            let mut state = self.state();
            writable(&state)?;
            let draft = state.draft.clone().ok_or(FormError::NotOpen)?;
            state.status = FormStatus::Submitting;
            state.error = None;
            (state.mode, draft, state.nested.clone())
        };

        let result = self.write(mode, &draft, nested.as_mut()).await;

        match result {
            Ok(response) => {
                self.state().close(CloseReason::Committed);
                info!("{} {:?} committed", R::PATH, mode);
                self.list.refresh().await;
                Ok(SubmitOutcome::Committed(serde_json::from_value(response).ok()))
            }
            Err(err) if err.class() == ErrorClass::Uncertain => {
                self.state().close(CloseReason::Uncertain);
                warn!("{} {:?} outcome unknown, refreshing: {}", R::PATH, mode, err);
                self.list.refresh().await;
                Ok(SubmitOutcome::Uncertain(err))
            }
            Err(err) => {
                let mut state = self.state();
                state.status = FormStatus::Open;
                state.error = Some(err.clone());
                if nested.is_some() {
                    state.nested = nested;
                }
                debug!("{} {:?} rejected: {}", R::PATH, mode, err);
                Err(FormError::Transport(err))
            }
        }
    }

    /// Stage `record` for deletion. Nothing is sent until
    /// [`confirm_delete`](Self::confirm_delete).
    pub fn request_delete(&self, record: R) -> Result<(), FormError> {
        let mut state = self.state();
        if state.deleting {
            return Err(FormError::Busy);
        }
        state.pending_delete = Some(record);
        state.delete_error = None;
        Ok(())
    }

    /// Discard the staged deletion. Returns whether one was staged.
    pub fn cancel_delete(&self) -> bool {
        let mut state = self.state();
        if state.deleting {
            return false;
        }
        state.delete_error = None;
        state.pending_delete.take().is_some()
    }

    /// Delete the staged record and refresh the list.
    ///
    /// A 4xx or network failure keeps the deletion staged so it can be
    /// retried or cancelled.
    pub async fn confirm_delete(&self) -> Result<DeleteOutcome, FormError> {
        let target = {
            let mut state = self.state();
            if state.deleting {
                return Err(FormError::Busy);
            }
            let target = state.pending_delete.clone().ok_or(FormError::NoPendingDelete)?;
            state.deleting = true;
            state.delete_error = None;
            target
        };

        let result = self.list.transport().remove(R::PATH, target.id()).await;

        let outcome = {
            let mut state = self.state();
            state.deleting = false;
            match result {
                Ok(()) => {
                    state.pending_delete = None;
                    close_if_editing(&mut state, target.id());
                    info!("{}{} deleted", R::PATH, target.id());
                    Ok(DeleteOutcome::Deleted)
                }
                Err(err) if err.class() == ErrorClass::Uncertain => {
                    state.pending_delete = None;
                    warn!("{}{} delete outcome unknown: {}", R::PATH, target.id(), err);
                    Ok(DeleteOutcome::Uncertain(err))
                }
                Err(err) => {
                    warn!("{}{} delete failed: {}", R::PATH, target.id(), err);
                    state.delete_error = Some(err.clone());
                    Err(FormError::Transport(err))
                }
            }
        };

        if outcome.is_ok() {
            self.list.refresh().await;
        }
        outcome
    }

    pub fn status(&self) -> FormStatus {
        self.state().status
    }

    pub fn mode(&self) -> FormMode {
        self.state().mode
    }

    pub fn draft(&self) -> Option<R> {
        self.state().draft.clone()
    }

    pub fn nested(&self) -> Option<NestedEditor> {
        self.state().nested.clone()
    }

    /// `false` when the detail fetch failed and the list row is shown.
    pub fn is_hydrated(&self) -> bool {
        self.state().hydrated
    }

    pub fn error(&self) -> Option<TransportError> {
        self.state().error.clone()
    }

    /// Per-field messages of the last rejected submit.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        self.state()
            .error
            .as_ref()
            .and_then(TransportError::field_errors)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    pub fn pending_delete(&self) -> Option<R> {
        self.state().pending_delete.clone()
    }

    pub fn delete_error(&self) -> Option<TransportError> {
        self.state().delete_error.clone()
    }

    pub fn is_deleting(&self) -> bool {
        self.state().deleting
    }

    async fn open_detail(&self, summary: R, mode: FormMode) -> Result<(), FormError> {
        let session = {
            let mut state = self.state();
            if state.status == FormStatus::Submitting {
                return Err(FormError::Busy);
            }
            state.begin(mode, FormStatus::Opening)
        };

        let id = summary.id().to_string();
        let transport = self.list.transport().as_ref();
        let detail = match transport.get_by_id(R::PATH, &id).await {
            Ok(body) => serde_json::from_value::<R>(body).map_err(TransportError::from),
            Err(err) => Err(err),
        };
        let (record, hydrated) = match detail {
            Ok(record) => (record, true),
            Err(err) => {
                warn!("{}{} detail unavailable, showing list row: {}", R::PATH, id, err);
                (summary, false)
            }
        };

        let nested = match R::NESTED_FIELD {
            Some(_) => Some(self.hydrate_nested(&id, &record).await),
            None => None,
        };

        let mut state = self.state();
        if state.session != session {
            debug!("{}{} opened after the session moved on", R::PATH, id);
            return Ok(());
        }
        state.status = FormStatus::Open;
        state.draft = Some(record);
        state.nested = nested;
        state.hydrated = hydrated;
        Ok(())
    }

    /// Stops from `listNested`, falling back to the record's own field.
    async fn hydrate_nested(&self, id: &str, record: &R) -> NestedEditor {
        let transport = self.list.transport().as_ref();
        match NestedEditor::fetch::<R, T>(transport, id).await {
            Ok(editor) => editor,
            Err(err) => {
                warn!("{}{} nested items unavailable: {}", R::PATH, id, err);
                NestedEditor::of::<R>(id, nested_of(record).unwrap_or_default())
            }
        }
    }

    async fn write(
        &self,
        mode: FormMode,
        draft: &R,
        nested: Option<&mut NestedEditor>,
    ) -> Result<Value, TransportError> {
        let transport = self.list.transport().as_ref();
        let mut body = draft.to_body()?;

        match (mode, nested) {
            (FormMode::Edit, Some(editor)) => {
                if let (Some(field), Value::Object(map)) = (R::NESTED_FIELD, &mut body) {
                    map.remove(field);
                }
                editor.commit(transport, body).await
            }
            (FormMode::Create, nested) => {
                if let (Some(editor), Some(field), Value::Object(map)) =
                    (nested, R::NESTED_FIELD, &mut body)
                {
                    map.insert(field.to_string(), serde_json::to_value(editor.batch())?);
                }
                transport.create(R::PATH, body).await
            }
            _ => match R::UPDATE {
                UpdateMethod::Full => transport.update(R::PATH, draft.id(), body).await,
                UpdateMethod::Partial => transport.partial_update(R::PATH, draft.id(), body).await,
            },
        }
    }

    fn state(&self) -> MutexGuard<'_, FormState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn writable<R>(state: &FormState<R>) -> Result<(), FormError> {
    match state.status {
        FormStatus::Open if state.mode == FormMode::View => Err(FormError::ReadOnly),
        FormStatus::Open => Ok(()),
        FormStatus::Submitting => Err(FormError::Busy),
        FormStatus::Opening | FormStatus::Closed(_) => Err(FormError::NotOpen),
    }
}

fn close_if_editing<R: Resource>(state: &mut FormState<R>, id: &str) {
    let editing = state.draft.as_ref().is_some_and(|draft| draft.id() == id);
    if editing && state.status != FormStatus::Submitting {
        state.close(CloseReason::Deleted);
    }
}

/// Nested items carried on the record itself.
fn nested_of<R: Resource>(record: &R) -> Option<Vec<NestedItem>> {
    let field = R::NESTED_FIELD?;
    let value = serde_json::to_value(record).ok()?;
    serde_json::from_value(value.get(field)?.clone()).ok()
}
