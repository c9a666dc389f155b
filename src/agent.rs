use std::fmt;
use std::sync::Arc;

use crate::ai::{GeminiClient, LocalMatcher, RemoteProvider};
use crate::config::Config;
use crate::error::ChatError;
use crate::knowledge::KnowledgeBase;

/// Which stage produced a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    Remote { provider: String },
    Knowledge { category: String },
    Topics,
}

impl fmt::Display for ReplySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplySource::Remote { provider } => write!(f, "{provider}"),
            ReplySource::Knowledge { category } => write!(f, "knowledge base: {category}"),
            ReplySource::Topics => write!(f, "topics"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Answers one message at a time: remote provider first, then the local
/// knowledge base, then the list of known topics.
pub struct ChatAgent {
    provider: Option<Box<dyn RemoteProvider>>,
    matcher: LocalMatcher,
    empty_reply: String,
    contact_hint: String,
}

impl ChatAgent {
    /// Creates the agent and, if a key is configured, the Gemini session.
    /// A session that fails to start is not retried.
    pub fn new(config: &Config, knowledge: Arc<KnowledgeBase>) -> Self {
        let provider: Option<Box<dyn RemoteProvider>> = match GeminiClient::new(config) {
            Ok(client) => {
                log::info!("✓ Gemini session ready (model {})", client.model());
                Some(Box::new(client))
            }
            Err(e) => {
                log::warn!("⚠️ {}; answering from the knowledge base only", e);
                None
            }
        };

        Self::with_provider(config, knowledge, provider)
    }

    pub fn with_provider(
        config: &Config,
        knowledge: Arc<KnowledgeBase>,
        provider: Option<Box<dyn RemoteProvider>>,
    ) -> Self {
        Self {
            provider,
            matcher: LocalMatcher::new(knowledge),
            empty_reply: config.empty_reply.clone(),
            contact_hint: config.contact_hint.clone(),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.provider.is_some()
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        self.matcher.knowledge()
    }

    /// Starts a fresh conversation with the remote provider
    pub fn reset(&mut self) {
        if let Some(provider) = self.provider.as_mut() {
            provider.reset();
            log::info!("🗑️ {} conversation reset", provider.name());
        }
    }

    pub async fn respond(&mut self, user_input: &str) -> Reply {
        match self.ask_remote(user_input).await {
            Ok(reply) => return reply,
            Err(ChatError::ProviderUnavailable(_)) => {
                log::debug!("📡 No remote provider, using the knowledge base");
            }
            Err(e) => {
                log::warn!("⚠️ {}, falling back to the knowledge base", e);
            }
        }

        match self.ask_local(user_input) {
            Ok(reply) => reply,
            Err(e) => {
                log::debug!("📡 {}", e);
                self.topics_reply()
            }
        }
    }

    async fn ask_remote(&mut self, user_input: &str) -> Result<Reply, ChatError> {
        let provider = self
            .provider
            .as_mut()
            .ok_or_else(|| ChatError::ProviderUnavailable("not configured".to_string()))?;

        let text = provider.send_message(user_input).await?;
        let text = if text.is_empty() {
            self.empty_reply.clone()
        } else {
            text
        };

        log::debug!("📡 Answered by {}", provider.name());
        Ok(Reply {
            text,
            source: ReplySource::Remote {
                provider: provider.name().to_string(),
            },
        })
    }

    fn ask_local(&self, user_input: &str) -> Result<Reply, ChatError> {
        let hit = self
            .matcher
            .search(user_input)
            .ok_or(ChatError::NoLocalMatch)?;

        log::info!(
            "📚 Knowledge base answer from \"{}\" (score {})",
            hit.category,
            hit.score
        );
        Ok(Reply {
            text: hit.entry.a.clone(),
            source: ReplySource::Knowledge {
                category: hit.category.to_string(),
            },
        })
    }

    /// Reply used when nothing else answered
    pub fn topics_reply(&self) -> Reply {
        Reply {
            text: format!(
                "I couldn't find a specific answer for that. Try asking about one of these topics: {}. {}",
                self.knowledge().topics(),
                self.contact_hint
            ),
            source: ReplySource::Topics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::knowledge::{KnowledgeSection, QaEntry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RemoteProvider for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn send_message(&mut self, _message: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(text.to_string()),
                None => Err(ChatError::ProviderCallFailed(anyhow::anyhow!("quota exceeded"))),
            }
        }
    }

    fn knowledge() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::new(vec![
            KnowledgeSection {
                category: "Civil Documents".to_string(),
                keywords: vec!["birth".to_string(), "certificate".to_string()],
                qa: vec![QaEntry {
                    q: "How to obtain a birth certificate?".to_string(),
                    a: "Visit your local Divisional Secretariat.".to_string(),
                }],
            },
            KnowledgeSection {
                category: "Health Services".to_string(),
                keywords: vec!["ambulance".to_string()],
                qa: vec![QaEntry {
                    q: "How do I call an ambulance?".to_string(),
                    a: "Dial 1990.".to_string(),
                }],
            },
        ]))
    }

    fn agent(reply: Option<&'static str>) -> (ChatAgent, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Scripted {
            reply,
            calls: Arc::clone(&calls),
        };
        let agent =
            ChatAgent::with_provider(&Config::default(), knowledge(), Some(Box::new(provider)));
        (agent, calls)
    }

    #[tokio::test]
    async fn remote_answer_wins() {
        let (mut agent, calls) = agent(Some("Go to the Divisional Secretariat."));
        let reply = agent.respond("birth certificate").await;

        assert_eq!(reply.text, "Go to the Divisional Secretariat.");
        assert_eq!(
            reply.source,
            ReplySource::Remote {
                provider: "Scripted".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_remote_text_gets_fixed_reply() {
        let (mut agent, _) = agent(Some(""));
        let reply = agent.respond("anything").await;
        assert_eq!(reply.text, "Sorry, I could not generate a response.");
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_knowledge() {
        let (mut agent, calls) = agent(None);
        let reply = agent.respond("how do I get a birth certificate").await;

        assert_eq!(reply.text, "Visit your local Divisional Secretariat.");
        assert_eq!(
            reply.source,
            ReplySource::Knowledge {
                category: "Civil Documents".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // the session survives a failed call
        agent.respond("ambulance please").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_provider_goes_straight_to_knowledge() {
        let mut agent = ChatAgent::with_provider(&Config::default(), knowledge(), None);
        assert!(!agent.has_remote());

        let reply = agent.respond("I need an ambulance").await;
        assert_eq!(reply.text, "Dial 1990.");
    }

    #[tokio::test]
    async fn unmatched_query_lists_topics() {
        let mut agent = ChatAgent::with_provider(&Config::default(), knowledge(), None);

        for query in ["   ", "what's the weather like?"] {
            let reply = agent.respond(query).await;
            assert_eq!(reply.source, ReplySource::Topics);
            assert_eq!(
                reply.text,
                "I couldn't find a specific answer for that. Try asking about one of these \
                 topics: Civil Documents, Health Services. You can also call 1919 \
                 (Government Information Center) for help."
            );
        }
    }

    #[test]
    fn missing_key_leaves_agent_local_only() {
        let agent = ChatAgent::new(&Config::default(), knowledge());
        assert!(!agent.has_remote());
    }
}
