/// Outcome of one reveal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The prefix grew by one character; more remain.
    Progress,
    /// The prefix grew to the full text. Emitted exactly once per reveal.
    Done,
}

/// Progressive disclosure of a message's text, one character per timer tick.
///
/// The stored message always holds the full response; `Reveal` only tracks
/// how much of it is currently shown. Cancelling freezes the prefix and
/// suppresses the `Done` signal. Pure state, cannot fail.
#[derive(Debug)]
pub struct Reveal {
    text: String,
    shown_bytes: usize,
    finished: bool,
}

impl Reveal {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shown_bytes: 0,
            finished: false,
        }
    }

    /// Grow the visible prefix by one character. Returns `None` once the
    /// reveal has finished or been cancelled.
    pub fn advance(&mut self) -> Option<Step> {
        if self.finished {
            return None;
        }
        match self.text[self.shown_bytes..].chars().next() {
            Some(c) => {
                self.shown_bytes += c.len_utf8();
                if self.shown_bytes == self.text.len() {
                    self.finished = true;
                    Some(Step::Done)
                } else {
                    Some(Step::Progress)
                }
            }
            // Empty text: nothing to grow, complete immediately.
            None => {
                self.finished = true;
                Some(Step::Done)
            }
        }
    }

    /// Freeze the current prefix. No further steps and no `Done` signal.
    pub fn cancel(&mut self) {
        self.finished = true;
    }

    pub fn is_active(&self) -> bool {
        !self.finished
    }

    /// The currently revealed prefix, always on a char boundary.
    pub fn prefix(&self) -> &str {
        &self.text[..self.shown_bytes]
    }
}
