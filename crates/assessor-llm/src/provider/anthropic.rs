//! Anthropic Messages API assessor

use assessor_config::{DEFAULT_BASE_URL, UpstreamConfig};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;

use super::Assessor;
use crate::error::UpstreamError;
use crate::protocol::anthropic::{
    AnthropicErrorResponse, AnthropicMessage, AnthropicRequest, AnthropicResponse, AnthropicTool, AnthropicToolChoice,
};
use crate::tools;
use crate::types::{
    AnswerEvaluation, AnswerEvaluationRequest, Assessment, SkillQuestion, SkillQuestionRequest, ToolOutput,
};

/// Assessor backed by the Anthropic Messages API
pub struct AnthropicAssessor {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
    version: String,
}

impl AnthropicAssessor {
    /// Create from upstream configuration
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::Config` if the API key is missing, the timeout
    /// is invalid or the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| UpstreamError::Config("upstream API key is not configured".to_owned()))?;

        let base_url = match config.base_url {
            Some(ref url) => url.clone(),
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| UpstreamError::Config(e.to_string()))?,
        };

        let mut builder = Client::builder().tcp_nodelay(true);
        if let Some(timeout) = config
            .timeout_duration()
            .map_err(|e| UpstreamError::Config(e.to_string()))?
        {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| UpstreamError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            version: config.version.clone(),
        })
    }

    /// Build the messages endpoint URL
    fn messages_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/messages")
    }

    /// Wire request forcing a single tool
    fn wire_request(&self, system: &str, tool: AnthropicTool, content: String) -> AnthropicRequest {
        let tool_choice = AnthropicToolChoice::tool(&tool.name);

        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(system.to_owned()),
            messages: vec![AnthropicMessage::user(content)],
            tools: Some(vec![tool]),
            tool_choice: Some(tool_choice),
        }
    }

    /// Send one request and validate the tool output it carries
    async fn invoke<T: ToolOutput>(&self, wire_request: &AnthropicRequest) -> Result<Assessment<T>, UpstreamError> {
        tracing::debug!(model = %self.model, tool = T::TOOL_NAME, "sending upstream request");

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", &self.version)
            .json(wire_request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(tool = T::TOOL_NAME, error = %e, "upstream request failed");
                UpstreamError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(tool = T::TOOL_NAME, error = %e, "failed to read upstream body");
            UpstreamError::Transport(e.to_string())
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<AnthropicErrorResponse>(&body)
                .map_or_else(|_| body.clone(), |e| format!("{}: {}", e.error.error_type, e.error.message));
            tracing::error!(
                tool = T::TOOL_NAME,
                status = %status,
                detail = %detail,
                "upstream returned error"
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result = extract_tool_output::<T>(&body)?;

        Ok(Assessment { result, raw: body })
    }
}

/// Parse a Messages response and validate the expected tool's input
fn extract_tool_output<T: ToolOutput>(body: &str) -> Result<T, UpstreamError> {
    let tool = T::TOOL_NAME;

    let response: AnthropicResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!(tool, error = %e, "upstream body is not a messages response");
        UpstreamError::Malformed(e.to_string())
    })?;

    let Some(input) = response.tool_input(tool) else {
        tracing::error!(tool, stop_reason = ?response.stop_reason, "upstream response has no tool call");
        return Err(UpstreamError::MissingToolCall { tool });
    };

    let output = T::deserialize(input)
        .map_err(|e| e.to_string())
        .and_then(|output| output.validate().map(|()| output))
        .map_err(|reason| {
            tracing::error!(tool, reason = %reason, "upstream tool output rejected");
            UpstreamError::Schema { tool, reason }
        })?;

    if let Some(usage) = response.usage {
        tracing::debug!(
            tool,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "upstream usage"
        );
    }

    Ok(output)
}

/// User turn for question generation
fn question_prompt(request: &SkillQuestionRequest) -> String {
    let mut prompt = json!({
        "skill": request.skill,
        "current_level": request.current_level,
    });
    if let Some(ref description) = request.description {
        prompt["description"] = json!(description);
    }
    prompt.to_string()
}

/// User turn for answer evaluation
fn answer_prompt(request: &AnswerEvaluationRequest) -> String {
    json!({
        "question": request.question,
        "answer": request.answer,
    })
    .to_string()
}

#[async_trait]
impl Assessor for AnthropicAssessor {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate_question(
        &self,
        request: &SkillQuestionRequest,
    ) -> Result<Assessment<SkillQuestion>, UpstreamError> {
        let wire_request = self.wire_request(
            tools::SKILL_QUESTION_SYSTEM_PROMPT,
            tools::skill_question_tool(),
            question_prompt(request),
        );
        self.invoke(&wire_request).await
    }

    async fn evaluate_answer(
        &self,
        request: &AnswerEvaluationRequest,
    ) -> Result<Assessment<AnswerEvaluation>, UpstreamError> {
        let wire_request = self.wire_request(
            tools::EVALUATE_ANSWER_SYSTEM_PROMPT,
            tools::evaluate_answer_tool(),
            answer_prompt(request),
        );
        self.invoke(&wire_request).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_assessor(base_url: &str) -> AnthropicAssessor {
        let config = UpstreamConfig {
            api_key: Some(SecretString::from("test-key")),
            base_url: Some(Url::parse(base_url).unwrap()),
            ..UpstreamConfig::default()
        };
        AnthropicAssessor::new(&config).unwrap()
    }

    fn tool_reply(tool: &str, input: Value) -> Value {
        json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-sonnet-20240620",
            "content": [
                { "type": "tool_use", "id": "toolu_01", "name": tool, "input": input }
            ],
            "stop_reason": "tool_use",
            "usage": { "input_tokens": 120, "output_tokens": 40 }
        })
    }

    fn chess_request() -> SkillQuestionRequest {
        SkillQuestionRequest {
            current_level: 200,
            skill: "chess".to_owned(),
            description: None,
        }
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let result = AnthropicAssessor::new(&UpstreamConfig::default());
        assert!(matches!(result, Err(UpstreamError::Config(_))));
    }

    #[test]
    fn question_prompt_includes_description_only_when_given() {
        let mut request = chess_request();
        let prompt: Value = serde_json::from_str(&question_prompt(&request)).unwrap();
        assert_eq!(prompt, json!({ "skill": "chess", "current_level": 200 }));

        request.description = Some("board game".to_owned());
        let prompt: Value = serde_json::from_str(&question_prompt(&request)).unwrap();
        assert_eq!(
            prompt,
            json!({ "skill": "chess", "current_level": 200, "description": "board game" })
        );
    }

    #[test]
    fn wire_request_forces_the_single_tool() {
        let assessor = test_assessor("http://localhost:1/v1");
        let wire = assessor.wire_request(
            tools::EVALUATE_ANSWER_SYSTEM_PROMPT,
            tools::evaluate_answer_tool(),
            answer_prompt(&AnswerEvaluationRequest {
                question: "2+2?".to_owned(),
                answer: "4".to_owned(),
            }),
        );
        let value = serde_json::to_value(&wire).unwrap();

        assert_eq!(value["model"], "claude-3-5-sonnet-20240620");
        assert_eq!(value["max_tokens"], 1000);
        assert_eq!(value["tools"].as_array().unwrap().len(), 1);
        assert_eq!(value["tools"][0]["name"], "evaluate_answer");
        assert_eq!(value["tool_choice"], json!({ "type": "tool", "name": "evaluate_answer" }));
        assert_eq!(value["messages"][0]["role"], "user");
        let content: Value = serde_json::from_str(value["messages"][0]["content"].as_str().unwrap()).unwrap();
        assert_eq!(content, json!({ "question": "2+2?", "answer": "4" }));
    }

    #[tokio::test]
    async fn generate_question_sends_expected_request() {
        let server = MockServer::start().await;
        let reply = tool_reply(
            "create_skill_questions",
            json!({
                "question": "What is the Lucena position?",
                "skill_level_of_question": 260,
                "description": "Strategy board game",
                "color": "#8B4513"
            }),
        );

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-3-5-sonnet-20240620",
                "max_tokens": 1000,
                "tool_choice": { "type": "tool", "name": "create_skill_questions" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
            .expect(1)
            .mount(&server)
            .await;

        let assessor = test_assessor(&format!("{}/v1", server.uri()));
        let assessment = assessor.generate_question(&chess_request()).await.unwrap();

        assert_eq!(assessment.result.question, "What is the Lucena position?");
        assert!((assessment.result.skill_level_of_question - 260.0).abs() < f64::EPSILON);
        assert_eq!(assessment.result.color.as_deref(), Some("#8B4513"));
        assert_eq!(serde_json::from_str::<Value>(&assessment.raw).unwrap(), reply);
    }

    #[tokio::test]
    async fn evaluate_answer_returns_verdict() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(tool_reply("evaluate_answer", json!({ "isCorrect": true }))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let assessor = test_assessor(&format!("{}/v1/", server.uri()));
        let assessment = assessor
            .evaluate_answer(&AnswerEvaluationRequest {
                question: "2+2?".to_owned(),
                answer: "4".to_owned(),
            })
            .await
            .unwrap();

        assert!(assessment.result.is_correct);
        assert!(assessment.result.correct_answer.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .mount(&server)
            .await;

        let assessor = test_assessor(&format!("{}/v1", server.uri()));
        let err = assessor.generate_question(&chess_request()).await.unwrap_err();

        assert!(matches!(err, UpstreamError::Status { status: 529, .. }));
    }

    #[tokio::test]
    async fn reply_without_tool_call_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_01",
                "type": "message",
                "role": "assistant",
                "model": "claude-3-5-sonnet-20240620",
                "content": [{ "type": "text", "text": "What is a fork?" }],
                "stop_reason": "end_turn"
            })))
            .mount(&server)
            .await;

        let assessor = test_assessor(&format!("{}/v1", server.uri()));
        let err = assessor.generate_question(&chess_request()).await.unwrap_err();

        assert!(matches!(
            err,
            UpstreamError::MissingToolCall {
                tool: "create_skill_questions"
            }
        ));
    }

    #[tokio::test]
    async fn question_above_the_top_level_is_accepted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_reply(
                "create_skill_questions",
                json!({ "question": "Q?", "skill_level_of_question": 1005 }),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let assessor = test_assessor(&format!("{}/v1", server.uri()));
        let request = SkillQuestionRequest {
            current_level: 1000,
            skill: "chess".to_owned(),
            description: None,
        };
        let assessment = assessor.generate_question(&request).await.unwrap();

        assert!((assessment.result.skill_level_of_question - 1005.0).abs() < f64::EPSILON);
        assert_eq!(assessment.result.level(), Some(1000));
    }

    #[tokio::test]
    async fn tool_input_violating_schema_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(tool_reply("evaluate_answer", json!({ "isCorrect": "yes" }))),
            )
            .mount(&server)
            .await;

        let assessor = test_assessor(&format!("{}/v1", server.uri()));
        let err = assessor
            .evaluate_answer(&AnswerEvaluationRequest {
                question: "2+2?".to_owned(),
                answer: "4".to_owned(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "schema");
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let assessor = test_assessor(&format!("{}/v1", server.uri()));
        let err = assessor.generate_question(&chess_request()).await.unwrap_err();

        assert!(matches!(err, UpstreamError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        // Nothing listens on port 9 locally
        let assessor = test_assessor("http://127.0.0.1:9/v1");
        let err = assessor.generate_question(&chess_request()).await.unwrap_err();

        assert!(matches!(err, UpstreamError::Transport(_)));
    }
}
