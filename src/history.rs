use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub sender: Sender,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender: Sender::User,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender: Sender::Assistant,
        }
    }
}

/// Insertion-ordered message log, written back to disk after every mutation.
///
/// Reveal state is session-local and never serialized, so a reload always
/// comes back fully revealed. At most one message is revealing at a time;
/// starting a new reveal displaces the previous one. Load failures (missing
/// or malformed file) silently yield an empty log.
pub struct ChatHistory {
    messages: Vec<Message>,
    revealing: Option<usize>,
    path: PathBuf,
}

/// Default history location: `<data_dir>/codequill/history.json`.
pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| anyhow!("could not determine data directory"))?;
    Ok(data_dir.join("codequill").join("history.json"))
}

impl ChatHistory {
    pub fn load(path: PathBuf) -> Self {
        let messages = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            messages,
            revealing: None,
            path,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.save();
    }

    /// Append an assistant message and mark it as the revealing one.
    /// Any previous reveal is displaced.
    pub fn append_revealing(&mut self, content: impl Into<String>) -> usize {
        self.messages.push(Message::assistant(content));
        let index = self.messages.len() - 1;
        self.revealing = Some(index);
        self.save();
        index
    }

    pub fn revealing_index(&self) -> Option<usize> {
        self.revealing
    }

    /// Flip a message's reveal state back to complete. Idempotent.
    pub fn mark_complete(&mut self, index: usize) {
        if self.revealing == Some(index) {
            self.revealing = None;
            self.save();
        }
    }

    /// Empty the log and erase the persisted file.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.revealing = None;
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), %err, "failed to erase chat history");
            }
        }
    }

    fn save(&self) {
        let write = || -> Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let raw = serde_json::to_string_pretty(&self.messages)?;
            fs::write(&self.path, raw)?;
            Ok(())
        };
        if let Err(err) = write() {
            warn!(path = %self.path.display(), %err, "failed to persist chat history");
        }
    }
}
