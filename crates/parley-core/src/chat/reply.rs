//! ReplyGenerator trait and the shipped template implementation.
//!
//! The assistant reply is produced behind this seam so a real generator can
//! be substituted without touching the messaging service's persistence or
//! quota logic.

use parley_types::error::ReplyError;

/// Trait for assistant reply backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations must be deterministic or not at their own discretion;
/// the messaging service only requires a reply string for a given input.
pub trait ReplyGenerator: Send + Sync {
    /// Human-readable generator name (e.g., "template").
    fn name(&self) -> &str;

    /// Produce the assistant reply for a user message.
    fn generate(
        &self,
        content: &str,
    ) -> impl std::future::Future<Output = Result<String, ReplyError>> + Send;
}

/// Deterministic placeholder generator echoing the input.
///
/// This is the only generator in scope: the application has no real AI
/// integration, and the reply template is part of the observable contract.
#[derive(Debug, Clone, Default)]
pub struct TemplateReplyGenerator;

impl TemplateReplyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ReplyGenerator for TemplateReplyGenerator {
    fn name(&self) -> &str {
        "template"
    }

    async fn generate(&self, content: &str) -> Result<String, ReplyError> {
        Ok(format!(
            "AI Response to: \"{content}\". This is a placeholder AI response."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_template_reply_is_deterministic() {
        let generator = TemplateReplyGenerator::new();
        let a = generator.generate("hello").await.unwrap();
        let b = generator.generate("hello").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a,
            "AI Response to: \"hello\". This is a placeholder AI response."
        );
    }

    #[test]
    fn test_template_name() {
        assert_eq!(TemplateReplyGenerator::new().name(), "template");
    }
}
