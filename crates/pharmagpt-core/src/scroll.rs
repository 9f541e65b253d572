//! Keeps a transcript view pinned to its newest content.
//!
//! A [`ScrollFollower`] is registered as a subscription on a
//! [`SessionStore`]; whenever the history or the loading flag changes it asks
//! its [`ScrollTarget`] to scroll to the bottom. It never blocks and never
//! reports failure: a target that cannot scroll yet is simply skipped.

use thiserror::Error;

use crate::state::{SessionEvent, SessionStore, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrollError {
    #[error("no scrollable view is attached yet")]
    NoTarget,
    #[error("scroll target unavailable: {0}")]
    Unavailable(String),
}

/// Something that can be scrolled to its newest content
pub trait ScrollTarget: Send {
    fn scroll_to_newest(&mut self, behavior: ScrollBehavior) -> Result<(), ScrollError>;
}

pub struct ScrollFollower<T> {
    target: T,
    behavior: ScrollBehavior,
}

impl<T: ScrollTarget + 'static> ScrollFollower<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            behavior: ScrollBehavior::Smooth,
        }
    }

    pub fn with_behavior(mut self, behavior: ScrollBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Subscribe to `store`; returns the id to detach with
    pub fn attach(mut self, store: &mut SessionStore) -> SubscriptionId {
        store.subscribe(move |event| self.observe(event))
    }

    pub fn observe(&mut self, event: &SessionEvent) {
        let relevant = matches!(
            event,
            SessionEvent::HistoryChanged { .. } | SessionEvent::LoadingChanged(_)
        );
        if !relevant {
            return;
        }
        if let Err(err) = self.target.scroll_to_newest(self.behavior) {
            tracing::trace!(error = %err, "scroll follow skipped");
        }
    }
}
