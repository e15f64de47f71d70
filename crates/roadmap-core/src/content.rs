//! Study content returned by structured generation.
//!
//! The model is asked for JSON matching [`ContentPlan::response_schema`]. Its
//! reply is untrusted: [`GeneratedContent::parse`] strips an optional code
//! fence, decodes the JSON, normalizes the legacy single-`quiz` shape into the
//! `quizzes` array, and validates the result before handing it out.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::curriculum::Task;
use crate::error::{PlannerError, Result};

/// Number of answer options every quiz item carries.
pub const QUIZ_OPTION_COUNT: usize = 4;

/// Quiz items requested when no duration hint is given.
pub const FIXED_QUIZ_COUNT: u32 = 1;

/// Example sentences requested when no duration hint is given.
pub const FIXED_EXAMPLE_COUNT: u32 = 3;

const MIN_QUIZZES: u32 = 3;
const MAX_QUIZZES: u32 = 10;
const MIN_EXAMPLES: u32 = 5;
const MAX_EXAMPLES: u32 = 15;

static CODE_FENCE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$").ok());

// ============================================================================
// Content types
// ============================================================================

/// An example sentence with its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleSentence {
    /// English sentence in a business context.
    pub sentence: String,
    /// Korean translation.
    pub translation: String,
}

/// One multiple-choice quiz item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    /// Question text.
    pub question: String,
    /// Answer options, [`QUIZ_OPTION_COUNT`] of them.
    pub options: Vec<String>,
    /// Zero-based index of the correct option.
    pub answer: usize,
    /// Why the correct option is correct.
    pub explanation: String,
}

impl QuizItem {
    /// Returns `true` if `option` is the correct answer.
    #[must_use]
    pub const fn is_correct(&self, option: usize) -> bool {
        self.answer == option
    }
}

/// Lesson, examples and quizzes generated for one study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// Lesson body (Markdown, Korean).
    pub lesson: String,
    /// Example sentences.
    pub examples: Vec<ExampleSentence>,
    /// Quiz items, at least one.
    pub quizzes: Vec<QuizItem>,
}

/// Wire shape accepted from the model before validation.
#[derive(Debug, Deserialize)]
struct RawContent {
    lesson: Option<String>,
    #[serde(default)]
    examples: Vec<ExampleSentence>,
    #[serde(default)]
    quizzes: Option<Vec<QuizItem>>,
    #[serde(default)]
    quiz: Option<QuizItem>,
}

impl GeneratedContent {
    /// Parses and validates a model reply.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::ContentParse` when the text is not JSON of the
    /// expected shape, and `PlannerError::ContentInvalid` when it is but breaks
    /// a content rule (empty lesson, no examples, no quizzes, wrong option
    /// count, answer index out of range).
    pub fn parse(text: &str) -> Result<Self> {
        let body = strip_code_fence(text);
        if body.is_empty() {
            return Err(PlannerError::content_parse("reply is empty"));
        }

        let raw: RawContent =
            serde_json::from_str(body).map_err(|e| PlannerError::content_parse(e.to_string()))?;

        let quizzes = match (raw.quizzes, raw.quiz) {
            (Some(quizzes), _) if !quizzes.is_empty() => quizzes,
            (_, Some(quiz)) => vec![quiz],
            _ => Vec::new(),
        };

        let content = Self {
            lesson: raw.lesson.unwrap_or_default(),
            examples: raw.examples,
            quizzes,
        };
        content.validate()?;
        Ok(content)
    }

    /// Checks the content rules.
    pub fn validate(&self) -> Result<()> {
        if self.lesson.trim().is_empty() {
            return Err(PlannerError::content_invalid("lesson is missing or empty"));
        }
        if self.examples.is_empty() {
            return Err(PlannerError::content_invalid("no example sentences"));
        }
        if self.quizzes.is_empty() {
            return Err(PlannerError::content_invalid("no quiz items"));
        }
        for (index, quiz) in self.quizzes.iter().enumerate() {
            if quiz.question.trim().is_empty() {
                return Err(PlannerError::content_invalid(format!(
                    "quiz {index} has an empty question"
                )));
            }
            if quiz.options.len() != QUIZ_OPTION_COUNT {
                return Err(PlannerError::content_invalid(format!(
                    "quiz {index} has {} options, expected {QUIZ_OPTION_COUNT}",
                    quiz.options.len()
                )));
            }
            if quiz.answer >= quiz.options.len() {
                return Err(PlannerError::content_invalid(format!(
                    "quiz {index} answer index {} is out of range",
                    quiz.answer
                )));
            }
        }
        Ok(())
    }
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let Some(fence) = CODE_FENCE.as_ref() else {
        return text.trim();
    };
    fence
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| text.trim(), |body| body.as_str().trim())
}

// ============================================================================
// Request sizing
// ============================================================================

/// What to ask the model for: a task's identity plus an optional duration hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Estimated duration in minutes.
    pub duration: Option<u32>,
}

impl ContentRequest {
    /// Creates a request without a duration hint.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            duration: None,
        }
    }

    /// Sets the duration hint.
    #[must_use]
    pub const fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = Some(minutes);
        self
    }

    /// Builds the request for a curriculum task, using its duration as the hint.
    #[must_use]
    pub fn for_task(task: &Task) -> Self {
        Self::new(&task.title, &task.description).with_duration(task.duration)
    }

    /// Returns the sizing plan for this request.
    #[must_use]
    pub const fn plan(&self) -> ContentPlan {
        ContentPlan::for_duration(self.duration)
    }
}

/// How many quiz items and example sentences to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPlan {
    /// Requested quiz items.
    pub quiz_count: u32,
    /// Requested example sentences.
    pub example_count: u32,
    /// `true` when sized from a duration hint.
    pub scaled: bool,
}

impl ContentPlan {
    /// Sizes a request from an optional duration in minutes.
    ///
    /// A missing or zero duration yields the fixed shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use roadmap_core::ContentPlan;
    ///
    /// let plan = ContentPlan::for_duration(Some(60));
    /// assert_eq!((plan.quiz_count, plan.example_count), (8, 12));
    ///
    /// let plan = ContentPlan::for_duration(None);
    /// assert_eq!((plan.quiz_count, plan.example_count), (1, 3));
    /// ```
    #[must_use]
    pub const fn for_duration(duration: Option<u32>) -> Self {
        match duration {
            Some(minutes) if minutes > 0 => Self {
                quiz_count: clamp(minutes / 10 + 2, MIN_QUIZZES, MAX_QUIZZES),
                example_count: clamp(minutes / 5, MIN_EXAMPLES, MAX_EXAMPLES),
                scaled: true,
            },
            _ => Self {
                quiz_count: FIXED_QUIZ_COUNT,
                example_count: FIXED_EXAMPLE_COUNT,
                scaled: false,
            },
        }
    }

    /// Response schema constraining the model's JSON output.
    #[must_use]
    pub fn response_schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "lesson": { "type": "STRING" },
                "examples": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "sentence": { "type": "STRING" },
                            "translation": { "type": "STRING" }
                        },
                        "required": ["sentence", "translation"]
                    }
                },
                "quizzes": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "question": { "type": "STRING" },
                            "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                            "answer": { "type": "INTEGER" },
                            "explanation": { "type": "STRING" }
                        },
                        "required": ["question", "options", "answer", "explanation"]
                    }
                }
            },
            "required": ["lesson", "examples", "quizzes"]
        })
    }
}

const fn clamp(value: u32, min: u32, max: u32) -> u32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
