use serde::Serialize;

use super::checklist::{checklist, ChecklistItem, ChecklistRow};
use super::entry::{Entry, EntryStore};
use crate::error::CureError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum View {
    Loading,
    Checklist,
    Detail(ChecklistItem),
    /// The entry could not be fetched. `load` may be called again.
    LoadFailed(String),
}

/// Navigation between the checklist and the sub-form of one item. The
/// workflow only ever replaces its entry with one returned by the store.
pub struct Workflow<S: EntryStore> {
    store: S,
    entry_id: i32,
    entry: Option<Entry>,
    view: View,
}

impl<S: EntryStore> Workflow<S> {
    pub fn new(store: S, entry_id: i32) -> Self {
        Workflow {
            store,
            entry_id,
            entry: None,
            view: View::Loading,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    pub async fn load(&mut self) -> Result<&Entry, CureError> {
        self.view = View::Loading;
        match self.store.get(self.entry_id).await {
            Ok(entry) => {
                self.view = View::Checklist;
                Ok(self.entry.insert(entry))
            }
            Err(e) => {
                log::warn!("Failed to load entry {}: {}", self.entry_id, e);
                self.view = View::LoadFailed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn rows(&self) -> Vec<ChecklistRow> {
        match &self.entry {
            Some(entry) => checklist(entry),
            None => vec![],
        }
    }

    /// Open the sub-form of an item.
    pub fn select(&mut self, item: ChecklistItem) -> Result<&Entry, CureError> {
        match &self.entry {
            Some(entry) => {
                self.view = View::Detail(item);
                Ok(entry)
            }
            None => Err(CureError::Validation(format!(
                "Entry {} is not loaded",
                self.entry_id
            ))),
        }
    }

    pub fn back(&mut self) {
        if self.entry.is_some() {
            self.view = View::Checklist;
        }
    }

    /// Hand back the entry a sub-form received from the store and return to the checklist.
    pub fn complete(&mut self, updated: Entry) -> Result<Vec<ChecklistRow>, CureError> {
        if updated.id != self.entry_id {
            return Err(CureError::Validation(format!(
                "Expected entry {}, got {}",
                self.entry_id, updated.id
            )));
        }
        self.entry = Some(updated);
        self.view = View::Checklist;
        Ok(self.rows())
    }
}
