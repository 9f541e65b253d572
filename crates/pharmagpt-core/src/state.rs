//! UI-agnostic session state.
//!
//! [`SessionState`] is a plain value with pure transitions; [`SessionStore`]
//! owns one, applies transitions on behalf of the orchestrator and the input
//! editor, and tells subscribers what changed. [`SearchStore`] is the same
//! idea for the symptom-search panel, whose "history" is the result list.
//!
//! Nothing here is persisted. A store lives as long as its panel.

use crate::models::{HistoryEntry, Message, SearchResult, Source};

/// What a store mutation changed
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    HistoryChanged { len: usize },
    ResultsChanged { len: usize },
    LoadingChanged(bool),
    ErrorChanged(Option<String>),
    DraftChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SessionEvent) + Send>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

impl Listeners {
    fn add(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    fn emit(&mut self, event: SessionEvent) {
        for (_, listener) in self.entries.iter_mut() {
            listener(&event);
        }
    }
}

/// State of one chat conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub history: Vec<Message>,
    pub draft_input: String,
    pub loading: bool,
    pub error_message: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_message(mut self, content: impl Into<String>) -> Self {
        self.history.push(Message::user(content));
        self
    }

    pub fn with_assistant_message(
        mut self,
        content: impl Into<String>,
        sources: Vec<Source>,
    ) -> Self {
        self.history.push(Message::assistant(content, sources));
        self
    }

    pub fn with_loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error_message = error;
        self
    }

    pub fn with_draft(mut self, draft: impl Into<String>) -> Self {
        self.draft_input = draft.into();
        self
    }

    /// History as the service expects it: role and content, no sources
    pub fn history_snapshot(&self) -> Vec<HistoryEntry> {
        self.history.iter().map(HistoryEntry::from).collect()
    }
}

/// Owner of a chat [`SessionState`]
#[derive(Default)]
pub struct SessionStore {
    state: SessionState,
    listeners: Listeners,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &[Message] {
        &self.state.history
    }

    pub fn draft(&self) -> &str {
        &self.state.draft_input
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.state.error_message.as_deref()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    fn transition(&mut self, apply: impl FnOnce(SessionState) -> SessionState) {
        let state = std::mem::take(&mut self.state);
        self.state = apply(state);
    }

    pub fn append_user_message(&mut self, content: impl Into<String>) {
        self.transition(|s| s.with_user_message(content));
        let len = self.state.history.len();
        self.listeners.emit(SessionEvent::HistoryChanged { len });
    }

    pub fn append_assistant_message(&mut self, content: impl Into<String>, sources: Vec<Source>) {
        self.transition(|s| s.with_assistant_message(content, sources));
        let len = self.state.history.len();
        self.listeners.emit(SessionEvent::HistoryChanged { len });
    }

    pub fn set_loading(&mut self, loading: bool) {
        if self.state.loading == loading {
            return;
        }
        self.transition(|s| s.with_loading(loading));
        self.listeners.emit(SessionEvent::LoadingChanged(loading));
    }

    pub fn set_error(&mut self, error: Option<String>) {
        if self.state.error_message == error {
            return;
        }
        self.transition(|s| s.with_error(error.clone()));
        self.listeners.emit(SessionEvent::ErrorChanged(error));
    }

    /// Apply an input-editing action to the draft
    pub fn edit_draft(&mut self, edit: impl FnOnce(&mut String)) {
        edit(&mut self.state.draft_input);
        self.listeners.emit(SessionEvent::DraftChanged);
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        let draft = draft.into();
        self.edit_draft(|d| *d = draft);
    }

    /// Confirmed history in request form. Taken before the message being
    /// submitted is appended, so it never contains that message.
    pub fn current_history_snapshot(&self) -> Vec<HistoryEntry> {
        self.state.history_snapshot()
    }
}

/// State of the symptom-search panel
#[derive(Default)]
pub struct SearchStore {
    query: String,
    results: Vec<SearchResult>,
    loading: bool,
    error_message: Option<String>,
    listeners: Listeners,
}

impl SearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    pub fn edit_query(&mut self, edit: impl FnOnce(&mut String)) {
        edit(&mut self.query);
        self.listeners.emit(SessionEvent::DraftChanged);
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.edit_query(|q| *q = query);
    }

    pub fn replace_results(&mut self, results: Vec<SearchResult>) {
        self.results = results;
        let len = self.results.len();
        self.listeners.emit(SessionEvent::ResultsChanged { len });
    }

    pub fn set_loading(&mut self, loading: bool) {
        if self.loading == loading {
            return;
        }
        self.loading = loading;
        self.listeners.emit(SessionEvent::LoadingChanged(loading));
    }

    pub fn set_error(&mut self, error: Option<String>) {
        if self.error_message == error {
            return;
        }
        self.error_message = error.clone();
        self.listeners.emit(SessionEvent::ErrorChanged(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_transitions_are_pure_values() {
        let start = SessionState::new();
        let next = start
            .clone()
            .with_user_message("Is ibuprofen safe?")
            .with_loading(true);

        assert!(start.history.is_empty());
        assert!(!start.loading);
        assert_eq!(next.history.len(), 1);
        assert_eq!(next.history[0].role, Role::User);
        assert!(next.loading);
    }

    #[test]
    fn test_snapshot_strips_sources() {
        let state = SessionState::new()
            .with_user_message("q")
            .with_assistant_message("a", vec![Source::named("Leaflet")]);

        let snapshot = state.history_snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "user", "content": "q"},
                {"role": "assistant", "content": "a"},
            ])
        );
    }

    #[test]
    fn test_store_notifies_subscribers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = SessionStore::new();
        let sink = Arc::clone(&seen);
        store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        store.append_user_message("hello");
        store.set_loading(true);
        store.set_loading(true);
        store.set_error(Some("Server error 500".to_string()));
        store.set_loading(false);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                SessionEvent::HistoryChanged { len: 1 },
                SessionEvent::LoadingChanged(true),
                SessionEvent::ErrorChanged(Some("Server error 500".to_string())),
                SessionEvent::LoadingChanged(false),
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let count = Arc::new(Mutex::new(0));
        let mut store = SessionStore::new();
        let counter = Arc::clone(&count);
        let id = store.subscribe(move |_| *counter.lock().unwrap() += 1);

        store.append_user_message("one");
        assert!(store.unsubscribe(id));
        store.append_user_message("two");

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn test_search_store_replaces_results_wholesale() {
        let mut store = SearchStore::new();
        let result = SearchResult {
            name: "Cetirizine".to_string(),
            benefits: "Allergy relief".to_string(),
            side_effects: "Drowsiness".to_string(),
            safety_advice: "Avoid alcohol".to_string(),
            relevance_score: 0.7,
        };
        store.replace_results(vec![result.clone(), result.clone()]);
        store.replace_results(vec![result]);
        assert_eq!(store.results().len(), 1);
    }
}
