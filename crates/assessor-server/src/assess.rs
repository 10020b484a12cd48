//! Assessment endpoint: discriminator dispatch and field validation

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use assessor_llm::{AnswerEvaluationRequest, Assessor, SkillQuestionRequest, normalize_level};
use assessor_telemetry::AssessmentMetrics;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;

use crate::error::AssessError;
use crate::params::{ExtractParams, Params};

/// Shared state for the assessment handler
#[derive(Clone)]
pub struct AssessState {
    pub assessor: Arc<dyn Assessor>,
    pub metrics: AssessmentMetrics,
}

/// Operation selected by the `request` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Question,
    Answer,
}

impl RequestKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }
}

impl FromStr for RequestKind {
    type Err = AssessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question" => Ok(Self::Question),
            "answer" => Ok(Self::Answer),
            other => Err(AssessError::UnknownRequestType(other.to_owned())),
        }
    }
}

/// Metric label for requests rejected before their kind is known
const UNROUTED: &str = "unrouted";

/// Handle an assessment request on any method
///
/// Every request is counted, including bodies the extractor rejects.
pub async fn assess(
    State(state): State<AssessState>,
    params: Result<ExtractParams, AssessError>,
) -> Response {
    let start = Instant::now();
    let (kind, result) = dispatch(&state, params).await;

    let (label, outcome) = metric_labels(kind, &result);
    state.metrics.record(label, outcome, start);

    result.unwrap_or_else(|e| {
        tracing::debug!(
            request = label,
            error = %e,
            value = e.rejected_value(),
            "assessment request failed"
        );
        e.into_response()
    })
}

/// Resolve the request kind and run the matching operation
async fn dispatch(
    state: &AssessState,
    params: Result<ExtractParams, AssessError>,
) -> (Option<RequestKind>, Result<Response, AssessError>) {
    let routed = params.and_then(|ExtractParams(params)| {
        let kind = params
            .get("request")
            .ok_or(AssessError::MissingRequestType)?
            .parse::<RequestKind>()?;
        Ok((kind, params))
    });

    let (kind, params) = match routed {
        Ok(routed) => routed,
        Err(e) => return (None, Err(e)),
    };

    let result = match kind {
        RequestKind::Question => generate_question(state, &params).await,
        RequestKind::Answer => evaluate_answer(state, &params).await,
    };

    (Some(kind), result)
}

fn metric_labels(kind: Option<RequestKind>, result: &Result<Response, AssessError>) -> (&'static str, &'static str) {
    let label = kind.map_or(UNROUTED, RequestKind::as_str);
    let outcome = result.as_ref().map_or_else(AssessError::outcome, |_| "ok");
    (label, outcome)
}

async fn generate_question(state: &AssessState, params: &Params) -> Result<Response, AssessError> {
    let request = question_request(params)?;

    let assessment = state.assessor.generate_question(&request).await?;

    tracing::info!(
        skill = %request.skill,
        current_level = request.current_level,
        question_level = assessment.result.level(),
        "question generated"
    );

    Ok(json_response(assessment.raw))
}

async fn evaluate_answer(state: &AssessState, params: &Params) -> Result<Response, AssessError> {
    let request = answer_request(params)?;

    let assessment = state.assessor.evaluate_answer(&request).await?;

    tracing::info!(is_correct = assessment.result.is_correct, "answer evaluated");

    Ok(json_response(assessment.raw))
}

/// Validate fields for question generation
///
/// Presence is checked before the level is parsed, so a request missing
/// both fields reports the level first.
fn question_request(params: &Params) -> Result<SkillQuestionRequest, AssessError> {
    let raw_level = params.get("currentLevel").ok_or(AssessError::MissingCurrentLevel)?;
    let skill = params.get("skill").ok_or(AssessError::MissingSkill)?;

    Ok(SkillQuestionRequest {
        current_level: parse_level(&raw_level)?,
        skill,
        description: params.get("description"),
    })
}

fn answer_request(params: &Params) -> Result<AnswerEvaluationRequest, AssessError> {
    let question = params.get("question").ok_or(AssessError::MissingQuestion)?;
    let answer = params.get("answer").ok_or(AssessError::MissingAnswer)?;

    Ok(AnswerEvaluationRequest { question, answer })
}

/// Parse a number-like level, rounding and capping it onto the skill scale
fn parse_level(raw: &str) -> Result<u32, AssessError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(normalize_level)
        .ok_or_else(|| AssessError::InvalidCurrentLevel(raw.to_owned()))
}

/// Relay an upstream JSON body as-is
fn json_response(body: String) -> Response {
    ([(CONTENT_TYPE, "application/json")], body).into_response()
}
