use log::{debug, info, warn};
use serde_json::{Map, Value};

use super::NestedItem;
use crate::error::TransportError;
use crate::query::PageResult;
use crate::resource::Resource;
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
struct DraftItem {
    key: String,
    item: NestedItem,
    removed: bool,
}

/// Staged edits to the nested collection of one parent record.
///
/// Items are addressed by key: the server id for stored items, a local
/// `draft-N` key for items added in this session. Every operation is local
/// until [`commit`](NestedEditor::commit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedEditor {
    parent_path: &'static str,
    field: &'static str,
    parent_id: String,
    items: Vec<DraftItem>,
    next_local: u32,
    dirty: bool,
}

impl NestedEditor {
    pub fn new(
        parent_path: &'static str,
        field: &'static str,
        parent_id: impl Into<String>,
        items: Vec<NestedItem>,
    ) -> Self {
        let mut editor = Self {
            parent_path,
            field,
            parent_id: parent_id.into(),
            items: Vec::new(),
            next_local: 0,
            dirty: false,
        };
        editor.replace(items);
        editor
    }

    /// Editor for the nested field of resource `R`.
    pub fn of<R: Resource>(parent_id: impl Into<String>, items: Vec<NestedItem>) -> Self {
        Self::new(R::PATH, R::NESTED_FIELD.unwrap_or("items"), parent_id, items)
    }

    /// Load the stored children of `parent_id` through `listNested`.
    pub async fn fetch<R: Resource, T: Transport + ?Sized>(
        transport: &T,
        parent_id: &str,
    ) -> Result<Self, TransportError> {
        let body = transport.list_nested(parent_id).await?;
        let page = PageResult::<NestedItem>::decode(body)?;
        Ok(Self::of::<R>(parent_id, page.items))
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Live items in draft order.
    pub fn items(&self) -> Vec<&NestedItem> {
        self.items
            .iter()
            .filter(|draft| !draft.removed)
            .map(|draft| &draft.item)
            .collect()
    }

    /// Keys of the live items, in draft order.
    pub fn keys(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|draft| !draft.removed)
            .map(|draft| draft.key.as_str())
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&NestedItem> {
        self.live(key).map(|index| &self.items[index].item)
    }

    /// Ids of stored items marked for deletion.
    pub fn removed(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|draft| draft.removed)
            .filter_map(|draft| draft.item.id.as_deref())
            .collect()
    }

    /// Append a new stop. Returns its local key.
    pub fn add(&mut self, reference_id: impl Into<String>, order: u32) -> String {
        self.next_local += 1;
        let key = format!("draft-{}", self.next_local);
        let mut item = NestedItem::new(reference_id, order);
        item.parent_id = self.parent_id.clone();
        self.items.push(DraftItem {
            key: key.clone(),
            item,
            removed: false,
        });
        self.dirty = true;
        key
    }

    /// Last write wins; siblings are never renumbered.
    pub fn set_order(&mut self, key: &str, order: u32) -> bool {
        self.update(key, |item| item.order = order)
    }

    pub fn toggle_visited(&mut self, key: &str) -> bool {
        self.update(key, |item| item.visited = !item.visited)
    }

    pub fn toggle_skipped(&mut self, key: &str) -> bool {
        self.update(key, |item| item.skipped = !item.skipped)
    }

    /// Mark an item for removal.
    ///
    /// Stored items stay in the draft as pending deletions; unsaved items
    /// are dropped outright. Removing twice is harmless. Returns `false`
    /// for an unknown key.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(index) = self.items.iter().position(|draft| draft.key == key) else {
            return false;
        };
        if self.items[index].removed {
            return true;
        }
        if self.items[index].item.is_persisted() {
            self.items[index].removed = true;
        } else {
            self.items.remove(index);
        }
        self.dirty = true;
        true
    }

    /// The list submitted on commit.
    pub fn batch(&self) -> Vec<NestedItem> {
        self.items().into_iter().cloned().collect()
    }

    /// Persist the draft.
    ///
    /// Sends one deletion per removed stored item (a 404 counts as already
    /// removed), then a partial update of the parent carrying `parent_fields`
    /// plus the full live list. The response's nested list, when present,
    /// becomes the new draft.
    pub async fn commit<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        parent_fields: Value,
    ) -> Result<Value, TransportError> {
        let removed: Vec<String> = self.removed().into_iter().map(str::to_string).collect();
        for id in removed {
            match transport.remove_nested(&id).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    debug!("nested item {} already removed", id);
                }
                Err(err) => return Err(err),
            }
            self.items
                .retain(|draft| !(draft.removed && draft.item.id.as_deref() == Some(id.as_str())));
        }

        let mut body = match parent_fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert(self.field.to_string(), serde_json::to_value(self.batch())?);

        let response = transport
            .partial_update(self.parent_path, &self.parent_id, Value::Object(body))
            .await?;
        info!(
            "committed {} nested items for {}{}",
            self.items.len(),
            self.parent_path,
            self.parent_id
        );

        match response.get(self.field).cloned() {
            Some(nested) => match serde_json::from_value::<Vec<NestedItem>>(nested) {
                Ok(items) => self.replace(items),
                Err(err) => {
                    warn!("keeping local nested draft, response did not decode: {}", err);
                }
            },
            None => debug!("response carried no {} field, keeping draft", self.field),
        }
        self.dirty = false;

        Ok(response)
    }

    fn replace(&mut self, items: Vec<NestedItem>) {
        self.items = items
            .into_iter()
            .map(|mut item| {
                item.parent_id = self.parent_id.clone();
                let key = match &item.id {
                    Some(id) => id.clone(),
                    None => {
                        self.next_local += 1;
                        format!("draft-{}", self.next_local)
                    }
                };
                DraftItem {
                    key,
                    item,
                    removed: false,
                }
            })
            .collect();
    }

    fn live(&self, key: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|draft| draft.key == key && !draft.removed)
    }

    fn update(&mut self, key: &str, change: impl FnOnce(&mut NestedItem)) -> bool {
        match self.live(key) {
            Some(index) => {
                change(&mut self.items[index].item);
                self.dirty = true;
                true
            }
            None => false,
        }
    }
}
