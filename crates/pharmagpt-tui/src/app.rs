use std::sync::{Arc, Mutex};

use pharmagpt_core::orchestrator::{ChatOutcome, SearchOutcome};
use pharmagpt_core::scroll::ScrollError;
use pharmagpt_core::{
    PharmaClient, RequestError, RequestOrchestrator, ScrollBehavior, ScrollFollower, ScrollTarget,
    SearchStore, SessionStore,
};
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Search,
    Chat,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Search => "Symptom Search",
            Tab::Chat => "Chat with PharmaGPT",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Tab::Search => Tab::Chat,
            Tab::Chat => Tab::Search,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Transcript area as last drawn, shared with the scroll follower
#[derive(Debug, Default)]
pub struct ChatViewport {
    pub height: u16,
    pub width: u16,
    pub follow: Option<ScrollBehavior>,
}

/// Scroll target handed to the core's [`ScrollFollower`]
struct ViewportTarget(Arc<Mutex<ChatViewport>>);

impl ScrollTarget for ViewportTarget {
    fn scroll_to_newest(&mut self, behavior: ScrollBehavior) -> Result<(), ScrollError> {
        let mut viewport = self
            .0
            .lock()
            .map_err(|err| ScrollError::Unavailable(err.to_string()))?;
        if viewport.height == 0 {
            return Err(ScrollError::NoTarget);
        }
        viewport.follow = Some(behavior);
        Ok(())
    }
}

pub struct App {
    pub should_quit: bool,
    pub tab: Tab,
    pub input_mode: InputMode,

    // Search panel
    pub search: SearchStore,
    pub search_cursor: usize,
    pub search_state: ListState,
    pub search_task: Option<JoinHandle<SearchOutcome>>,

    // Chat panel
    pub chat: SessionStore,
    pub chat_cursor: usize,
    pub chat_task: Option<JoinHandle<ChatOutcome>>,
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub scroll_target: Option<u16>,
    pub chat_viewport: Arc<Mutex<ChatViewport>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub orchestrator: RequestOrchestrator<PharmaClient>,
}

impl App {
    pub fn new(client: PharmaClient) -> Self {
        let chat_viewport = Arc::new(Mutex::new(ChatViewport::default()));
        let mut chat = SessionStore::new();
        ScrollFollower::new(ViewportTarget(Arc::clone(&chat_viewport))).attach(&mut chat);

        Self {
            should_quit: false,
            tab: Tab::Search,
            input_mode: InputMode::Editing,

            search: SearchStore::new(),
            search_cursor: 0,
            search_state: ListState::default(),
            search_task: None,

            chat,
            chat_cursor: 0,
            chat_task: None,
            chat_scroll: 0,
            chat_max_scroll: 0,
            scroll_target: None,
            chat_viewport,

            animation_frame: 0,

            orchestrator: RequestOrchestrator::new(Arc::new(client)),
        }
    }

    pub fn base_url(&self) -> &str {
        self.orchestrator.backend().base_url()
    }

    pub fn can_submit_search(&self) -> bool {
        !self.search.is_loading() && !self.search.query().trim().is_empty()
    }

    pub fn can_submit_chat(&self) -> bool {
        !self.chat.is_loading() && !self.chat.draft().trim().is_empty()
    }

    pub fn submit_search(&mut self) {
        if self.search_task.is_some() {
            return;
        }
        let query = self.search.query().to_string();
        match self.orchestrator.begin_search(&mut self.search, &query) {
            Ok(flight) => {
                self.search_state.select(None);
                self.search_task = Some(tokio::spawn(flight.send()));
            }
            Err(err) => tracing::debug!(error = %err, "search not submitted"),
        }
    }

    pub fn submit_chat(&mut self) {
        if self.chat_task.is_some() {
            return;
        }
        let draft = self.chat.draft().to_string();
        match self.orchestrator.begin_chat(&mut self.chat, &draft) {
            Ok(flight) => {
                self.chat_cursor = 0;
                self.chat_task = Some(tokio::spawn(flight.send()));
            }
            Err(err) => tracing::debug!(error = %err, "chat message not submitted"),
        }
    }

    /// Apply the outcome of any request that has completed
    pub async fn poll_tasks(&mut self) {
        if self.search_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.search_task.take() {
                let outcome = task.await.unwrap_or_else(|err| Err(join_failure(err)));
                self.orchestrator.finish_search(&mut self.search, outcome);
                if !self.search.results().is_empty() {
                    self.search_state.select(Some(0));
                }
            }
        }

        if self.chat_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.chat_task.take() {
                let outcome = task.await.unwrap_or_else(|err| Err(join_failure(err)));
                self.orchestrator.finish_chat(&mut self.chat, outcome);
            }
        }
    }

    /// Tick animation frame and advance any smooth scroll (called by Tick event)
    pub fn tick(&mut self) {
        if self.search.is_loading() || self.chat.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.step_scroll();
    }

    fn step_scroll(&mut self) {
        let Some(target) = self.scroll_target else {
            return;
        };
        let target = target.min(self.chat_max_scroll);
        if self.chat_scroll == target {
            self.scroll_target = None;
            return;
        }
        let distance = self.chat_scroll.abs_diff(target);
        let step = (distance / 2).max(1);
        self.chat_scroll = if self.chat_scroll < target {
            self.chat_scroll + step
        } else {
            self.chat_scroll - step
        };
    }

    /// Called by the renderer once the transcript height is known
    pub fn update_chat_metrics(&mut self, total_lines: u16, height: u16, width: u16) {
        self.chat_max_scroll = total_lines.saturating_sub(height);

        let follow = match self.chat_viewport.lock() {
            Ok(mut viewport) => {
                viewport.height = height;
                viewport.width = width;
                viewport.follow.take()
            }
            Err(_) => None,
        };
        match follow {
            Some(ScrollBehavior::Smooth) => self.scroll_target = Some(self.chat_max_scroll),
            Some(ScrollBehavior::Instant) => {
                self.scroll_target = None;
                self.chat_scroll = self.chat_max_scroll;
            }
            None => {}
        }

        self.chat_scroll = self.chat_scroll.min(self.chat_max_scroll);
    }

    // Manual scrolling cancels any follow in progress
    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.scroll_target = None;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.scroll_target = None;
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        self.scroll_target = None;
        self.chat_scroll = self.chat_max_scroll;
    }

    pub fn search_nav_down(&mut self) {
        let len = self.search.results().len();
        if len > 0 {
            let i = self.search_state.selected().unwrap_or(0);
            self.search_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn search_nav_up(&mut self) {
        let i = self.search_state.selected().unwrap_or(0);
        self.search_state.select(Some(i.saturating_sub(1)));
    }

    pub fn switch_tab(&mut self) {
        self.tab = self.tab.toggle();
    }
}

fn join_failure(err: tokio::task::JoinError) -> RequestError {
    tracing::error!(error = %err, "request task did not complete");
    RequestError::Network(err.to_string())
}
