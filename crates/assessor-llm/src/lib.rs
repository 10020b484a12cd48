//! Upstream model client for skill assessments
//!
//! Builds tool-constrained Messages API requests for question generation and
//! answer evaluation, sends them, and validates the structured reply before
//! handing the untouched upstream body back to the caller.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod error;
pub mod protocol;
pub mod provider;
pub mod tools;
pub mod types;

pub use error::UpstreamError;
pub use provider::Assessor;
pub use provider::anthropic::AnthropicAssessor;
pub use types::{
    AnswerEvaluation, AnswerEvaluationRequest, Assessment, SKILL_LEVEL_RANGE, SkillQuestion, SkillQuestionRequest,
    ToolOutput, normalize_level,
};
