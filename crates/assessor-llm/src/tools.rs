//! Tool schemas and system prompts for the two assessment operations

use indoc::indoc;
use serde_json::json;

use crate::protocol::anthropic::AnthropicTool;

/// Tool producing a [`crate::SkillQuestion`]
pub const SKILL_QUESTION_TOOL: &str = "create_skill_questions";

/// Tool producing an [`crate::AnswerEvaluation`]
pub const EVALUATE_ANSWER_TOOL: &str = "evaluate_answer";

pub const SKILL_QUESTION_SYSTEM_PROMPT: &str = indoc! {r#"
    You are a skill tester, you will come up with questions that test the competency of a skill based on a question.
    The user may or may not have any competency in the skill but your test should be designed to find out if they are at a slightly higher level than they are currently at in the skill.
    This is all pure knowledge based, some skill can be easily measured at first like math 1 + 1 is 2, that's like a 1, a 1 year old can know this. A harder question for a skill like "front end development" would be "what is the best way to architect a decentralized chat app", which would rank at level 485.
    A 30 year old with 10 years of experience would say: create a front end app using react or simple html, connect with gunjs and put up some relays for data communication across devices. That answer would be correct and the user would now be at level 485 in front end development.
    Based on all your knowledge come up with a question whose ranking ranges from 1-1000, slightly higher than what the user currently is.
    The question can be open ended or specific, it will be assessed by a very capable large language model on submission to determine if the user answered correctly.
    If no description was given by the user, provide a description for the skill and an associated color in hex.
"#};

pub const EVALUATE_ANSWER_SYSTEM_PROMPT: &str = indoc! {"
    You are an evaluator, you will evaluate an answer that a user has given to a question and determine if the answer is correct or not.
    The question can be open ended or specific, it should be assessed to determine if the user answered correctly, use all your knowledge to determine so.
"};

/// Tool definition for question generation
pub fn skill_question_tool() -> AnthropicTool {
    AnthropicTool {
        name: SKILL_QUESTION_TOOL.to_owned(),
        description: Some(
            "Create a question that tests the user's competency level with a particular skill. Skill levels \
             range from 1 to 1000. Based on the user's current skill level, create a question that exceeds it to \
             test whether they are better at it than before, and include the skill level of the question."
                .to_owned(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to ask the user pertaining to the skill level above where they are at"
                },
                "skill_level_of_question": {
                    "type": "number",
                    "description": "The level at which the question is ranked, given that 1000 is master level and 1 is illiterate at the skill. The level should be slightly higher than the current one."
                },
                "description": {
                    "type": "string",
                    "description": "A brief description of the skill being tested, only provided if one was not included by the user"
                },
                "color": {
                    "type": "string",
                    "description": "A hex color most aligned to the skill, only provided if a description was not included by the user"
                }
            },
            "required": ["question", "skill_level_of_question"]
        }),
    }
}

/// Tool definition for answer evaluation
pub fn evaluate_answer_tool() -> AnthropicTool {
    AnthropicTool {
        name: EVALUATE_ANSWER_TOOL.to_owned(),
        description: Some("Reply true or false on whether the given response correctly answers the question".to_owned()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "isCorrect": {
                    "type": "boolean",
                    "description": "Whether the answer to the question is correct"
                },
                "correctAnswer": {
                    "type": "string",
                    "description": "The correct answer in case the answer is wrong"
                },
                "explanation": {
                    "type": "string",
                    "description": "Explain why the answer was wrong, if it was wrong"
                }
            },
            "required": ["isCorrect"]
        }),
    }
}
