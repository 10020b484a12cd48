//! Assessment request and result types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Inclusive bounds of the skill level scale
pub const SKILL_LEVEL_RANGE: std::ops::RangeInclusive<u32> = 1..=1000;

/// Map a numeric level onto the skill scale
///
/// Any finite positive number is a level. It is rounded to the nearest
/// integer and capped to [`SKILL_LEVEL_RANGE`], so a question ranked above
/// the top of the scale still yields a usable level.
pub fn normalize_level(value: f64) -> Option<u32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let min = f64::from(*SKILL_LEVEL_RANGE.start());
    let max = f64::from(*SKILL_LEVEL_RANGE.end());

    // Clamped into 1..=1000 above, so the cast is exact
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let level = value.round().clamp(min, max) as u32;

    Some(level)
}

impl SkillQuestion {
    /// Difficulty of the question on the skill scale
    pub fn level(&self) -> Option<u32> {
        normalize_level(self.skill_level_of_question)
    }
}

/// Ask for a question slightly above the user's current level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillQuestionRequest {
    /// Current skill level on the 1-1000 scale
    pub current_level: u32,
    /// Name of the skill being assessed
    pub skill: String,
    /// User-supplied description of the skill
    pub description: Option<String>,
}

/// Ask whether an answer to a previously issued question is correct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEvaluationRequest {
    pub question: String,
    pub answer: String,
}

/// Generated assessment question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillQuestion {
    /// Question to put to the user
    pub question: String,
    /// Difficulty of the question on the 1-1000 scale
    pub skill_level_of_question: f64,
    /// Skill description, present when the user gave none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hex color associated with the skill
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Verdict on a submitted answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluation {
    pub is_correct: bool,
    /// Correct answer when the submitted one was wrong
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Why the submitted answer was wrong
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Structured output produced through a tool call
pub trait ToolOutput: DeserializeOwned {
    /// Name of the tool whose input carries this output
    const TOOL_NAME: &'static str;

    /// Check constraints the JSON schema alone cannot express
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated constraint
    fn validate(&self) -> Result<(), String>;
}

impl ToolOutput for SkillQuestion {
    const TOOL_NAME: &'static str = crate::tools::SKILL_QUESTION_TOOL;

    fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question is empty".to_owned());
        }

        let level = self.skill_level_of_question;
        if normalize_level(level).is_none() {
            return Err(format!("skill_level_of_question is not a positive number: {level}"));
        }

        if let Some(ref color) = self.color
            && !is_hex_color(color)
        {
            return Err(format!("color is not a hex color: {color}"));
        }

        Ok(())
    }
}

impl ToolOutput for AnswerEvaluation {
    const TOOL_NAME: &'static str = crate::tools::EVALUATE_ANSWER_TOOL;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Validated upstream reply
///
/// Keeps the upstream body exactly as received next to the typed result
/// extracted from it.
#[derive(Debug, Clone)]
pub struct Assessment<T> {
    /// Typed tool output
    pub result: T,
    /// Upstream response body, unmodified
    pub raw: String,
}

/// Accepts `#rgb` and `#rrggbb`, with or without the leading `#`
fn is_hex_color(value: &str) -> bool {
    let digits = value.trim().strip_prefix('#').unwrap_or_else(|| value.trim());
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}
