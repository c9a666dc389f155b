//! Chat widget state: transcript, pending flag and the reply channel.
//! Rendering is left to the front-end.

use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::agent::{ChatAgent, Reply, ReplySource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
    pub source: Option<ReplySource>,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            timestamp: Local::now(),
            source: None,
        }
    }

    fn assistant(content: &str, source: Option<ReplySource>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            timestamp: Local::now(),
            source,
        }
    }
}

pub struct ChatSession {
    id: Uuid,
    agent: Arc<Mutex<ChatAgent>>,
    greeting: String,
    messages: Vec<ChatMessage>,
    is_loading: bool,
    // one channel per turn; a task that dies drops its sender
    response_receiver: Option<std_mpsc::Receiver<Reply>>,
    failure_reply: Reply,
}

impl ChatSession {
    pub fn new(agent: ChatAgent, greeting: &str) -> Self {
        let id = Uuid::new_v4();
        log::info!("📍 Chat session {}", id);
        let failure_reply = agent.topics_reply();

        Self {
            id,
            agent: Arc::new(Mutex::new(agent)),
            greeting: greeting.to_string(),
            messages: vec![ChatMessage::assistant(greeting, None)],
            is_loading: false,
            response_receiver: None,
            failure_reply,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn agent(&self) -> Arc<Mutex<ChatAgent>> {
        Arc::clone(&self.agent)
    }

    /// Queues a message for the agent. Returns false when the input is blank
    /// or a reply is still pending. Must be called inside a tokio runtime.
    pub fn submit(&mut self, input: &str) -> bool {
        let trimmed = input.trim();
        if trimmed.is_empty() || self.is_loading {
            return false;
        }

        self.messages.push(ChatMessage::user(trimmed));
        self.is_loading = true;

        let agent = Arc::clone(&self.agent);
        let (sender, receiver) = std_mpsc::channel();
        self.response_receiver = Some(receiver);
        let user_input = trimmed.to_string();
        let session_id = self.id;

        tokio::spawn(async move {
            let mut agent = agent.lock().await;
            let reply = agent.respond(&user_input).await;
            log::info!("💬 [{}] reply from {}", session_id, reply.source);

            if let Err(e) = sender.send(reply) {
                log::error!("Could not deliver reply: {}", e);
            }
        });

        true
    }

    /// Moves a ready reply into the transcript. Returns how many arrived.
    pub fn poll(&mut self) -> usize {
        let Some(receiver) = self.response_receiver.as_ref() else {
            return 0;
        };

        match receiver.try_recv() {
            Ok(reply) => {
                self.push_reply(reply);
                1
            }
            Err(std_mpsc::TryRecvError::Empty) => 0,
            Err(std_mpsc::TryRecvError::Disconnected) => {
                self.push_failure();
                1
            }
        }
    }

    /// Blocks until the pending reply arrives or `timeout` passes.
    /// Do not call from a runtime worker thread.
    pub fn wait_for_reply(&mut self, timeout: Duration) -> Option<&ChatMessage> {
        let receiver = self.response_receiver.as_ref()?;

        match receiver.recv_timeout(timeout) {
            Ok(reply) => self.push_reply(reply),
            Err(std_mpsc::RecvTimeoutError::Timeout) => return None,
            Err(std_mpsc::RecvTimeoutError::Disconnected) => self.push_failure(),
        }
        self.messages.last()
    }

    /// Resets the transcript to the greeting and makes the remote
    /// provider forget the conversation.
    pub fn clear(&mut self) {
        self.messages = vec![ChatMessage::assistant(&self.greeting, None)];

        match self.agent.try_lock() {
            Ok(mut agent) => agent.reset(),
            Err(_) => {
                // a reply is still being computed; reset once it is done
                let agent = Arc::clone(&self.agent);
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            agent.lock().await.reset();
                        });
                    }
                    Err(e) => log::warn!("Could not reset remote conversation: {}", e),
                }
            }
        }

        log::info!("🗑️ [{}] transcript cleared", self.id);
    }

    fn push_reply(&mut self, reply: Reply) {
        self.messages
            .push(ChatMessage::assistant(&reply.text, Some(reply.source)));
        self.is_loading = false;
        self.response_receiver = None;
    }

    fn push_failure(&mut self) {
        log::error!("[{}] reply task ended without an answer", self.id);
        let reply = self.failure_reply.clone();
        self.push_reply(reply);
    }
}
