//! Assessor trait and its upstream implementations

pub mod anthropic;

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::types::{AnswerEvaluation, AnswerEvaluationRequest, Assessment, SkillQuestion, SkillQuestionRequest};

/// Backend that answers the two assessment operations
///
/// Each call performs exactly one upstream request. Implementations hold no
/// per-request state and are shared across handlers behind an `Arc`.
#[async_trait]
pub trait Assessor: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Generate a question slightly above the requested level
    async fn generate_question(
        &self,
        request: &SkillQuestionRequest,
    ) -> Result<Assessment<SkillQuestion>, UpstreamError>;

    /// Judge whether an answer to a question is correct
    async fn evaluate_answer(
        &self,
        request: &AnswerEvaluationRequest,
    ) -> Result<Assessment<AnswerEvaluation>, UpstreamError>;
}
