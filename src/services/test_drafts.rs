use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::services::question_filter::SelectionSet;

/// Per-caller selections for the create-test form.
///
/// A selection survives failed submissions so the form can be corrected and
/// resent; it is dropped on success or explicit reset.
#[derive(Clone, Default)]
pub(crate) struct TestDrafts {
    selections: Arc<Mutex<HashMap<String, SelectionSet>>>,
}

impl TestDrafts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Toggles `question_id` in the caller's selection and returns the new state.
    pub(crate) async fn toggle(&self, principal: &str, question_id: &str) -> SelectionSet {
        let mut selections = self.selections.lock().await;
        let selection = selections.entry(principal.to_string()).or_default();
        selection.toggle(question_id);
        let snapshot = selection.clone();

        if snapshot.is_empty() {
            selections.remove(principal);
        }
        snapshot
    }

    pub(crate) async fn selection(&self, principal: &str) -> SelectionSet {
        self.selections.lock().await.get(principal).cloned().unwrap_or_default()
    }

    pub(crate) async fn discard(&self, principal: &str) {
        self.selections.lock().await.remove(principal);
    }

    /// Clears the ids that went into a created test. Ids toggled on after
    /// the submission read the selection stay selected.
    pub(crate) async fn clear_submitted(&self, principal: &str, submitted: &[String]) {
        let mut selections = self.selections.lock().await;
        let Some(selection) = selections.get_mut(principal) else {
            return;
        };

        selection.remove_all(submitted);
        if selection.is_empty() {
            selections.remove(principal);
        }
    }
}
