//! Focus advice from an optional AI assistant.
//!
//! The assistant is an external collaborator. Any failure or empty answer is
//! logged and replaced with a fixed fallback line.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::AssistantConfig;
use crate::error::FocusError;
use crate::features::tasks::Task;

mod http;

pub use http::HttpAdvisor;

/// Reply used whenever the assistant has nothing usable.
pub const FALLBACK_ADVICE: &str = "🤷 No advice available right now.";

/// Answers a prompt with advice text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Ask for advice.
    ///
    /// # Errors
    ///
    /// Returns `Advice` if the assistant is unreachable or answers nothing.
    async fn advise(&self, prompt: &str) -> Result<String, FocusError>;
}

/// Advisor used when no assistant is configured.
pub struct NoAdvisor;

#[async_trait]
impl Advisor for NoAdvisor {
    async fn advise(&self, _prompt: &str) -> Result<String, FocusError> {
        Err(FocusError::Advice("assistant disabled".to_string()))
    }
}

/// Pick the advisor described by `config`.
///
/// A misconfigured assistant falls back to `NoAdvisor` with a warning.
pub fn create_advisor(config: &AssistantConfig) -> Arc<dyn Advisor> {
    if !config.enabled {
        debug!("assistant disabled");
        return Arc::new(NoAdvisor);
    }

    match HttpAdvisor::from_config(config) {
        Ok(advisor) => {
            debug!(endpoint = %config.endpoint, model = %config.model, "assistant enabled");
            Arc::new(advisor)
        },
        Err(e) => {
            warn!(error = %e, "assistant unavailable, advice disabled");
            Arc::new(NoAdvisor)
        },
    }
}

/// Build the prompt sent for a user's task list.
#[must_use]
pub fn build_prompt(tasks: &[Task]) -> String {
    let open: Vec<&str> = tasks.iter().filter(|t| !t.done).map(|t| t.text.as_str()).collect();

    if open.is_empty() {
        return "I have no open tasks right now. Give me one short, practical tip for staying focused."
            .to_string();
    }

    let list = open
        .iter()
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "I work in pomodoro sessions. My open tasks are:\n{list}\n\
         Suggest which task to start with and give one short tip for focusing on it."
    )
}

/// Ask `advisor` about `tasks`, never failing.
pub async fn advise_on(advisor: &dyn Advisor, tasks: &[Task]) -> String {
    match advisor.advise(&build_prompt(tasks)).await {
        Ok(answer) if !answer.trim().is_empty() => format!("💡 {}", answer.trim()),
        Ok(_) => {
            warn!("assistant returned an empty answer");
            FALLBACK_ADVICE.to_string()
        },
        Err(e) => {
            warn!(error = %e, "assistant request failed");
            FALLBACK_ADVICE.to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<Task> {
        let mut done = Task::new("file taxes", None);
        done.done = true;
        vec![Task::new("write report", None), done]
    }

    #[test]
    fn test_prompt_lists_only_open_tasks() {
        let prompt = build_prompt(&tasks());
        assert!(prompt.contains("- write report"));
        assert!(!prompt.contains("file taxes"));
    }

    #[test]
    fn test_prompt_without_tasks() {
        assert!(build_prompt(&[]).contains("no open tasks"));
    }

    #[tokio::test]
    async fn test_answer_is_passed_through() {
        let mut advisor = MockAdvisor::new();
        advisor
            .expect_advise()
            .withf(|prompt| prompt.contains("write report"))
            .times(1)
            .returning(|_| Ok("Start with the report.".to_string()));

        assert_eq!(advise_on(&advisor, &tasks()).await, "💡 Start with the report.");
    }

    #[tokio::test]
    async fn test_failure_text_is_never_shown() {
        let mut advisor = MockAdvisor::new();
        advisor
            .expect_advise()
            .returning(|_| Err(FocusError::Advice("HTTP 500: internal trace".to_string())));

        let reply = advise_on(&advisor, &tasks()).await;
        assert_eq!(reply, FALLBACK_ADVICE);
        assert!(!reply.contains("500"));
    }

    #[tokio::test]
    async fn test_blank_answer_falls_back() {
        let mut advisor = MockAdvisor::new();
        advisor.expect_advise().returning(|_| Ok("   ".to_string()));

        assert_eq!(advise_on(&advisor, &tasks()).await, FALLBACK_ADVICE);
    }

    #[tokio::test]
    async fn test_disabled_assistant_falls_back() {
        let advisor = create_advisor(&AssistantConfig::default());
        assert_eq!(advise_on(advisor.as_ref(), &[]).await, FALLBACK_ADVICE);
    }
}
