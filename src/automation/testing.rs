//! Scripted in-memory driver for flow tests.

use super::driver::{By, ElementId, UiDriver};
use super::error::AppiumError;
use super::locator::TEXT_VIEW_CLASS;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Click(String),
    Clear(String),
    Keys(String, String),
}

/// Elements are keyed by selector and never change, except those registered
/// with [`FakeDriver::with_delayed`], which show up after a number of misses.
#[derive(Default)]
pub(crate) struct FakeDriver {
    elements: HashMap<String, (Vec<ElementId>, usize)>,
    texts: HashMap<ElementId, String>,
    lookups: Mutex<HashMap<String, usize>>,
    actions: Mutex<Vec<Action>>,
}

impl FakeDriver {
    pub(crate) fn with(self, by: By, ids: &[&str]) -> Self {
        self.with_delayed(by, ids, 0)
    }

    pub(crate) fn with_delayed(mut self, by: By, ids: &[&str], misses: usize) -> Self {
        let ids = ids.iter().map(|id| ElementId::new(*id)).collect();
        self.elements.insert(by.to_string(), (ids, misses));
        self
    }

    pub(crate) fn with_text(mut self, id: &str, text: &str) -> Self {
        self.texts.insert(ElementId::new(id), text.to_string());
        self
    }

    /// A `TextView` showing `text`.
    pub(crate) fn with_label(mut self, id: &str, text: &str) -> Self {
        let key = By::class_name(TEXT_VIEW_CLASS).to_string();
        self.elements
            .entry(key)
            .or_default()
            .0
            .push(ElementId::new(id));
        self.with_text(id, text)
    }

    pub(crate) fn lookups(&self, by: &By) -> usize {
        self.lookups
            .lock()
            .unwrap()
            .get(&by.to_string())
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    pub(crate) fn clicked(&self, id: &str) -> bool {
        self.actions()
            .iter()
            .any(|action| matches!(action, Action::Click(clicked) if clicked == id))
    }

    /// Text typed into `id`, concatenated in order.
    pub(crate) fn typed(&self, id: &str) -> String {
        self.actions()
            .iter()
            .filter_map(|action| match action {
                Action::Keys(target, text) if target == id => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: Action) {
        self.actions.lock().unwrap().push(action);
    }
}

impl UiDriver for FakeDriver {
    async fn find_elements(&self, by: &By) -> Result<Vec<ElementId>, AppiumError> {
        let key = by.to_string();
        let seen = {
            let mut lookups = self.lookups.lock().unwrap();
            let count = lookups.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };

        Ok(match self.elements.get(&key) {
            Some((ids, misses)) if seen > *misses => ids.clone(),
            _ => Vec::new(),
        })
    }

    async fn click(&self, element: &ElementId) -> Result<(), AppiumError> {
        self.record(Action::Click(element.to_string()));
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> Result<(), AppiumError> {
        self.record(Action::Clear(element.to_string()));
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), AppiumError> {
        self.record(Action::Keys(element.to_string(), text.to_string()));
        Ok(())
    }

    async fn text(&self, element: &ElementId) -> Result<String, AppiumError> {
        Ok(self.texts.get(element).cloned().unwrap_or_default())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AppiumError> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }
}
