use std::time::{Duration, Instant};

use tracing::warn;

use crate::client::AssistantClient;
use crate::history::{ChatHistory, Message};
use crate::request::{Outcome, RequestSlot};
use crate::reveal::{Reveal, Step};

/// One character of an assistant reply is revealed per interval.
pub const REVEAL_INTERVAL: Duration = Duration::from_millis(20);

/// How long the transient error banner stays up.
const ERROR_BANNER_TTL: Duration = Duration::from_secs(5);

const ERROR_MESSAGE: &str = "Failed to generate response. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct ErrorBanner {
    pub message: String,
    pub raised_at: Instant,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Query input
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Chat state
    pub history: ChatHistory,
    pub requests: RequestSlot,
    reveal: Option<Reveal>,
    client: AssistantClient,

    // Transient error banner
    pub error: Option<ErrorBanner>,

    // Transcript scrolling (updated during render)
    pub scroll: u16,
    pub follow: bool,
    pub transcript_height: u16,
    pub transcript_lines: u16,

    // Animation state: 0-2 for ellipsis animation
    pub animation_frame: u8,
}

impl App {
    pub fn new(client: AssistantClient, history: ChatHistory) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            input: String::new(),
            cursor: 0,

            history,
            requests: RequestSlot::default(),
            reveal: None,
            client,

            error: None,

            scroll: 0,
            follow: true,
            transcript_height: 0,
            transcript_lines: 0,

            animation_frame: 0,
        }
    }

    pub fn loading(&self) -> bool {
        self.requests.in_flight()
    }

    pub fn reveal_active(&self) -> bool {
        self.reveal.is_some()
    }

    /// The revealed prefix of the currently revealing message, if any.
    pub fn reveal_prefix(&self) -> Option<&str> {
        self.reveal.as_ref().map(|r| r.prefix())
    }

    /// Send the current input to the assistant. Refused silently when the
    /// trimmed query is empty, a request is in flight, or a reveal is still
    /// running. The user message lands in the log before the request goes out.
    pub fn submit_query(&mut self) {
        let query = self.input.trim().to_string();
        if query.is_empty() || self.loading() || self.reveal_active() {
            return;
        }

        self.history.append(Message::user(query.clone()));
        self.input.clear();
        self.cursor = 0;
        self.error = None;
        self.follow = true;

        let client = self.client.clone();
        self.requests.submit(async move { client.generate(&query).await });
    }

    pub fn on_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success(text) => {
                self.history.append_revealing(text.clone());
                self.reveal = Some(Reveal::new(text));
                self.follow = true;
            }
            Outcome::Failed(err) => {
                warn!(%err, "assistant request failed");
                self.error = Some(ErrorBanner {
                    message: ERROR_MESSAGE.to_string(),
                    raised_at: Instant::now(),
                });
            }
            // Deliberate supersession, not a failure.
            Outcome::Cancelled => {}
        }
    }

    /// One reveal timer tick: grow the prefix by a character, and mark the
    /// message complete when the full text is out.
    pub fn advance_reveal(&mut self) {
        let Some(reveal) = self.reveal.as_mut() else {
            return;
        };
        match reveal.advance() {
            Some(Step::Progress) => {}
            Some(Step::Done) | None => {
                if let Some(index) = self.history.revealing_index() {
                    self.history.mark_complete(index);
                }
                self.reveal = None;
            }
        }
        self.follow = true;
    }

    /// "Stop generating": freeze the visible prefix and mark the message
    /// complete. The stored content keeps the full response text.
    pub fn stop_reveal(&mut self) {
        if let Some(reveal) = self.reveal.as_mut() {
            reveal.cancel();
        }
        if let Some(index) = self.history.revealing_index() {
            self.history.mark_complete(index);
        }
        self.reveal = None;
    }

    /// Bulk-clear the conversation, aborting anything still running.
    pub fn clear_chat(&mut self) {
        self.requests.cancel();
        self.stop_reveal();
        self.history.clear();
        self.error = None;
        self.scroll = 0;
        self.follow = true;
    }

    /// Periodic tick: thinking animation and banner timeout.
    pub fn tick(&mut self) {
        if self.loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if let Some(banner) = &self.error {
            if banner.raised_at.elapsed() >= ERROR_BANNER_TTL {
                self.error = None;
            }
        }
    }

    // Transcript scrolling. Scrolling up detaches from the bottom; scrolling
    // back down to the end re-engages follow mode.
    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.transcript_lines.saturating_sub(self.transcript_height);
        self.scroll = self.scroll.saturating_add(lines).min(max);
        if self.scroll == max {
            self.follow = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.follow = false;
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Sender;
    use tempfile::tempdir;

    fn test_app() -> (tempfile::TempDir, App) {
        let dir = tempdir().unwrap();
        let history = ChatHistory::load(dir.path().join("history.json"));
        // Port 9 (discard) is never a live backend; the spawned request task
        // fails fast and tests never await it unless they mean to.
        let client = AssistantClient::new("http://localhost:9", None);
        (dir, App::new(client, history))
    }

    #[tokio::test]
    async fn submit_appends_user_message_before_request() {
        let (_dir, mut app) = test_app();
        app.input = "how do I sort a list?".to_string();
        app.submit_query();

        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history.messages()[0].sender, Sender::User);
        assert!(app.loading());
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn whitespace_query_is_refused() {
        let (_dir, mut app) = test_app();
        app.input = "   \n ".to_string();
        app.submit_query();
        assert!(app.history.is_empty());
        assert!(!app.loading());
    }

    #[tokio::test]
    async fn submit_while_loading_is_a_no_op() {
        let (_dir, mut app) = test_app();
        app.input = "first".to_string();
        app.submit_query();
        assert_eq!(app.history.len(), 1);

        app.input = "second".to_string();
        app.submit_query();
        // Log length unchanged, input untouched.
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.input, "second");
    }

    #[tokio::test]
    async fn submit_while_revealing_is_a_no_op() {
        let (_dir, mut app) = test_app();
        app.on_outcome(Outcome::Success("an answer".to_string()));
        assert!(app.reveal_active());

        app.input = "next question".to_string();
        app.submit_query();
        assert_eq!(app.history.len(), 1);
    }

    #[tokio::test]
    async fn failed_outcome_raises_banner_and_appends_nothing() {
        let (_dir, mut app) = test_app();
        app.history.append(Message::user("q"));
        app.on_outcome(Outcome::Failed("boom".to_string()));

        assert!(app.error.is_some());
        // The user message is not rolled back.
        assert_eq!(app.history.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_outcome_is_silent() {
        let (_dir, mut app) = test_app();
        app.on_outcome(Outcome::Cancelled);
        assert!(app.error.is_none());
        assert!(app.history.is_empty());
    }

    #[tokio::test]
    async fn success_starts_a_reveal() {
        let (_dir, mut app) = test_app();
        app.on_outcome(Outcome::Success("hi".to_string()));

        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history.revealing_index(), Some(0));
        assert_eq!(app.reveal_prefix(), Some(""));
    }

    #[tokio::test]
    async fn reveal_runs_to_completion() {
        let (_dir, mut app) = test_app();
        app.on_outcome(Outcome::Success("ab".to_string()));

        app.advance_reveal();
        assert_eq!(app.reveal_prefix(), Some("a"));
        app.advance_reveal();
        assert!(!app.reveal_active());
        assert_eq!(app.history.revealing_index(), None);
        assert_eq!(app.history.messages()[0].content, "ab");
    }

    #[tokio::test]
    async fn stop_reveal_keeps_full_text_in_log() {
        let (_dir, mut app) = test_app();
        app.on_outcome(Outcome::Success("a longer answer".to_string()));
        app.advance_reveal();
        app.stop_reveal();

        assert!(!app.reveal_active());
        assert_eq!(app.history.revealing_index(), None);
        // Only the visual reveal was interrupted.
        assert_eq!(app.history.messages()[0].content, "a longer answer");
    }

    #[tokio::test]
    async fn clear_chat_empties_everything() {
        let (_dir, mut app) = test_app();
        app.history.append(Message::user("q"));
        app.on_outcome(Outcome::Success("a".to_string()));
        app.clear_chat();

        assert!(app.history.is_empty());
        assert!(!app.reveal_active());
        assert!(!app.loading());
    }

    #[tokio::test]
    async fn error_banner_expires_after_ttl() {
        let (_dir, mut app) = test_app();
        app.error = Some(ErrorBanner {
            message: ERROR_MESSAGE.to_string(),
            raised_at: Instant::now() - ERROR_BANNER_TTL - Duration::from_millis(1),
        });
        app.tick();
        assert!(app.error.is_none());
    }
}
