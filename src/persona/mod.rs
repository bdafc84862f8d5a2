//! System context assembled from user facts and the persona files in the
//! knowledge store.

use crate::config::{GuiltLevel, UserConfig};
use crate::knowledge::KnowledgeGateway;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const PROTOCOL_PATH: &str = "memory/spark/protocol.md";
pub const PROFILE_PATH: &str = "memory/profile.md";
pub const LEARNED_PATH: &str = "memory/spark/learned.md";

const FALLBACK_PROTOCOL: &str = "\
You are Spark, a proactive accountability coach.
Read memory/spark/protocol.md to learn how to behave. If it is missing, be helpful and brief.";

fn guilt_note(level: GuiltLevel) -> &'static str {
    match level {
        GuiltLevel::Chill => "go easy on them",
        GuiltLevel::Medium => "normal guilt trips",
        GuiltLevel::Savage => "be ruthless",
    }
}

/// Static persona context is built once and cached until [`Persona::reload`];
/// learned preferences are read fresh on every call.
pub struct Persona {
    gateway: Arc<KnowledgeGateway>,
    user: UserConfig,
    cached: RwLock<Option<Arc<str>>>,
}

impl Persona {
    pub fn new(gateway: Arc<KnowledgeGateway>, user: UserConfig) -> Self {
        Self {
            gateway,
            user,
            cached: RwLock::new(None),
        }
    }

    pub fn user(&self) -> &UserConfig {
        &self.user
    }

    fn user_facts(&self) -> String {
        let mut facts = vec![
            format!("Name: {}", self.user.name),
            format!("Pronouns: {}", self.user.pronouns),
            format!("Guilt level: {}", guilt_note(self.user.guilt_level)),
        ];
        if let Some(style) = self.user.style.as_deref().filter(|s| !s.trim().is_empty()) {
            facts.push(format!("Style: {}", style.trim()));
        }
        format!("# User\n{}", facts.join(", "))
    }

    async fn build_static(&self) -> String {
        let mut parts = vec![self.user_facts()];
        match self.gateway.read_optional(PROTOCOL_PATH).await {
            Some(protocol) => parts.push(protocol),
            None => {
                tracing::warn!(path = PROTOCOL_PATH, "Protocol file not found, using fallback");
                parts.push(FALLBACK_PROTOCOL.to_string());
            }
        }
        if let Some(profile) = self.gateway.read_optional(PROFILE_PATH).await {
            parts.push(format!("---\n\n# User Profile\n\n{profile}"));
        }
        parts.join("\n\n")
    }

    /// User facts, protocol, and profile.
    pub async fn static_context(&self) -> Arc<str> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            return Arc::clone(cached);
        }
        let mut slot = self.cached.write().await;
        if let Some(cached) = slot.as_ref() {
            return Arc::clone(cached);
        }
        let built: Arc<str> = Arc::from(self.build_static().await);
        tracing::info!(chars = built.len(), "Loaded persona context");
        *slot = Some(Arc::clone(&built));
        built
    }

    /// Static context plus the current learned preferences.
    pub async fn system_context(&self) -> String {
        let base = self.static_context().await;
        match self.gateway.read_optional(LEARNED_PATH).await {
            Some(learned) if !learned.trim().is_empty() => {
                format!("{base}\n\n---\n\n# Learned Preferences\n\n{learned}")
            }
            _ => base.to_string(),
        }
    }

    /// Drop the cached static context so the next turn rereads the files.
    pub async fn reload(&self) {
        *self.cached.write().await = None;
        tracing::info!("Persona context invalidated");
    }
}
