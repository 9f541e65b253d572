//! Request orchestration for the chat and search panels.
//!
//! A submit runs in three steps so a front end can keep drawing while the
//! network call is pending:
//!
//! 1. `begin_*` validates the input and performs the synchronous state
//!    changes (clear error, optimistic append, `loading = true`), returning
//!    a flight that owns the request body.
//! 2. The flight's `send` is the only suspension point. It owns everything
//!    it needs, so it can be spawned.
//! 3. `finish_*` applies the outcome. `loading` is reset by a guard that
//!    runs on every exit path of the finish step.
//!
//! `submit_*` runs all three in sequence.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::client::PharmaBackend;
use crate::error::{RequestError, SubmitError};
use crate::models::{ChatRequest, ChatResponse, SearchRequest, SearchResult};
use crate::state::{SearchStore, SessionStore};

/// Number of medicines requested per search
pub const SEARCH_TOP_K: u32 = 5;

pub type ChatOutcome = Result<ChatResponse, RequestError>;
pub type SearchOutcome = Result<Vec<SearchResult>, RequestError>;

/// A store whose `loading` flag can be reset by [`LoadingGuard`]
pub trait Loading {
    fn set_loading(&mut self, loading: bool);
}

impl Loading for SessionStore {
    fn set_loading(&mut self, loading: bool) {
        SessionStore::set_loading(self, loading);
    }
}

impl Loading for SearchStore {
    fn set_loading(&mut self, loading: bool) {
        SearchStore::set_loading(self, loading);
    }
}

/// Clears `loading` when dropped
struct LoadingGuard<'a, S: Loading>(&'a mut S);

impl<S: Loading> Deref for LoadingGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.0
    }
}

impl<S: Loading> DerefMut for LoadingGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.0
    }
}

impl<S: Loading> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        self.0.set_loading(false);
    }
}

fn validate(raw: &str, loading: bool) -> Result<String, SubmitError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(SubmitError::EmptyInput);
    }
    if loading {
        return Err(SubmitError::Busy);
    }
    Ok(text.to_string())
}

#[must_use = "a flight must be sent and finished or the session stays loading"]
pub struct ChatFlight<B: ?Sized> {
    backend: Arc<B>,
    request: ChatRequest,
}

impl<B: PharmaBackend + ?Sized> ChatFlight<B> {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    pub async fn send(self) -> ChatOutcome {
        self.backend.chat(&self.request).await
    }
}

#[must_use = "a flight must be sent and finished or the session stays loading"]
pub struct SearchFlight<B: ?Sized> {
    backend: Arc<B>,
    request: SearchRequest,
}

impl<B: PharmaBackend + ?Sized> SearchFlight<B> {
    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    pub async fn send(self) -> SearchOutcome {
        self.backend.search(&self.request).await
    }
}

pub struct RequestOrchestrator<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: ?Sized> Clone for RequestOrchestrator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: PharmaBackend + ?Sized> RequestOrchestrator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Validate and stage a chat message.
    ///
    /// On success the user message is already in the history and will stay
    /// there whatever the outcome. Errors leave the store untouched.
    pub fn begin_chat(
        &self,
        store: &mut SessionStore,
        raw: &str,
    ) -> Result<ChatFlight<B>, SubmitError> {
        let message = validate(raw, store.is_loading())?;

        store.set_error(None);
        let history = store.current_history_snapshot();
        store.append_user_message(message.clone());
        store.set_draft(String::new());
        store.set_loading(true);

        tracing::info!(history_len = history.len(), "sending chat message");
        Ok(ChatFlight {
            backend: Arc::clone(&self.backend),
            request: ChatRequest { message, history },
        })
    }

    pub fn finish_chat(&self, store: &mut SessionStore, outcome: ChatOutcome) {
        apply_chat(&mut LoadingGuard(store), outcome);
    }

    /// Runs the whole round trip. `loading` is reset even if this future is
    /// dropped while the request is pending.
    pub async fn submit_chat(&self, store: &mut SessionStore, raw: &str) -> Result<(), SubmitError> {
        let flight = self.begin_chat(store, raw)?;
        let mut store = LoadingGuard(store);
        let outcome = flight.send().await;
        apply_chat(&mut store, outcome);
        Ok(())
    }

    /// Validate and stage a search. Previous results are cleared now and
    /// replaced wholesale when the response arrives.
    pub fn begin_search(
        &self,
        store: &mut SearchStore,
        raw: &str,
    ) -> Result<SearchFlight<B>, SubmitError> {
        let text = validate(raw, store.is_loading())?;

        store.set_error(None);
        store.replace_results(Vec::new());
        store.set_loading(true);

        tracing::info!(top_k = SEARCH_TOP_K, "searching medicines");
        Ok(SearchFlight {
            backend: Arc::clone(&self.backend),
            request: SearchRequest {
                text,
                top_k: SEARCH_TOP_K,
            },
        })
    }

    pub fn finish_search(&self, store: &mut SearchStore, outcome: SearchOutcome) {
        apply_search(&mut LoadingGuard(store), outcome);
    }

    /// Runs the whole round trip. `loading` is reset even if this future is
    /// dropped while the request is pending.
    pub async fn submit_search(&self, store: &mut SearchStore, raw: &str) -> Result<(), SubmitError> {
        let flight = self.begin_search(store, raw)?;
        let mut store = LoadingGuard(store);
        let outcome = flight.send().await;
        apply_search(&mut store, outcome);
        Ok(())
    }
}

fn apply_chat(store: &mut SessionStore, outcome: ChatOutcome) {
    match outcome {
        Ok(response) => {
            let sources = response.sources.unwrap_or_default();
            tracing::info!(sources = sources.len(), "chat answer received");
            store.append_assistant_message(response.answer, sources);
        }
        Err(err) => {
            tracing::warn!(error = %err, "chat request failed");
            store.set_error(Some(err.to_string()));
        }
    }
}

fn apply_search(store: &mut SearchStore, outcome: SearchOutcome) {
    match outcome {
        Ok(results) => {
            tracing::info!(results = results.len(), "search results received");
            store.replace_results(results);
        }
        Err(err) => {
            tracing::warn!(error = %err, "search request failed");
            store.set_error(Some(err.to_string()));
        }
    }
}
