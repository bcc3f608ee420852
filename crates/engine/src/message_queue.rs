// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered, best-effort narration delivery.
//!
//! Ordering is encoded with an `mpsc` channel drained by a single writer
//! task, not by sleeping between sends. `add()` returns immediately; the
//! background task is the sole caller of `ConversationLog::append`, so
//! per-process total order falls out of FIFO channel delivery.

use pipulate_core::MessageRole;
use pipulate_storage::ConversationLog;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Turns a non-verbatim narration prompt into the text actually appended to
/// the conversation. The real implementation talks to an LLM; that
/// collaborator is out of scope here; only its interface is specified.
pub trait NarrationBackend: Send + Sync {
    fn respond(&self, prompt: &str) -> Result<String, anyhow::Error>;
}

/// Narration backend that treats every prompt as already-final content.
/// Used when no LLM is configured, and as the fallback when one fails.
pub struct VerbatimNarrationBackend;

impl NarrationBackend for VerbatimNarrationBackend {
    fn respond(&self, prompt: &str) -> Result<String, anyhow::Error> {
        Ok(prompt.to_string())
    }
}

struct Narration {
    content: String,
    verbatim: bool,
    role: MessageRole,
}

/// Fire-and-forget ordered narration queue. Never awaited on the request
/// path.
pub struct MessageQueue {
    sender: mpsc::UnboundedSender<Narration>,
}

impl MessageQueue {
    pub fn new(conversation: Arc<ConversationLog>, backend: Arc<dyn NarrationBackend>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Narration>();

        tokio::spawn(async move {
            while let Some(msg) = receiver.recv().await {
                let content = if msg.verbatim {
                    msg.content
                } else {
                    match backend.respond(&msg.content) {
                        Ok(resp) => resp,
                        Err(error) => {
                            warn!(%error, "narration backend failed, using canned fallback");
                            msg.content
                        }
                    }
                };

                if let Err(error) = conversation.append(msg.role, &content) {
                    warn!(%error, "failed to persist narration");
                }
            }
        });

        Self { sender }
    }

    /// Enqueue a narration. In verbatim mode `content` is appended exactly;
    /// otherwise it is treated as a prompt resolved via the narration
    /// backend before appending.
    pub fn add(&self, content: impl Into<String>, verbatim: bool, role: MessageRole) {
        let narration = Narration {
            content: content.into(),
            verbatim,
            role,
        };
        if self.sender.send(narration).is_err() {
            warn!("message queue writer task is gone, dropping narration");
        }
    }
}
