//! Forms and the questions embedded in them
//!
//! Questions are not independent records: they live as an ordered list on the
//! form and every question edit produces a whole new list.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::identity::{EventId, FormId, OptionId, QuestionId};

/// Title given to forms created without one
pub const DEFAULT_FORM_TITLE: &str = "Untitled Form";

/// A dynamic questionnaire attached to exactly one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: FormId,
    /// Fixed at creation
    pub event_id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub created_at: u64,
    pub updated_at: u64,
    /// Maintained by increments, may drift from the true count
    #[serde(default)]
    pub response_count: i64,
}

/// Kind of input a question asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    #[serde(alias = "short")]
    ShortText,
    Paragraph,
    SingleChoice,
    MultiChoice,
    Dropdown,
    Date,
    Time,
    File,
}

impl QuestionType {
    /// Whether answers pick from the question's options
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            QuestionType::SingleChoice | QuestionType::MultiChoice | QuestionType::Dropdown
        )
    }

    /// Stored name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::ShortText => "short-text",
            QuestionType::Paragraph => "paragraph",
            QuestionType::SingleChoice => "single-choice",
            QuestionType::MultiChoice => "multi-choice",
            QuestionType::Dropdown => "dropdown",
            QuestionType::Date => "date",
            QuestionType::Time => "time",
            QuestionType::File => "file",
        }
    }
}

/// A selectable choice of a choice-based question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub value: String,
}

impl QuestionOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: OptionId::generate(),
            value: value.into(),
        }
    }
}

/// A single prompt within a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<QuestionOption>>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Content for appending a question to a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    /// Generated when absent
    #[serde(default)]
    pub id: Option<QuestionId>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<QuestionOption>>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewQuestion {
    pub fn new(question_type: QuestionType, title: impl Into<String>) -> Self {
        Self {
            id: None,
            question_type,
            title: title.into(),
            required: false,
            options: None,
            description: None,
        }
    }

    pub fn with_id(mut self, id: QuestionId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn into_question(self) -> Question {
        Question {
            id: self.id.unwrap_or_else(QuestionId::generate),
            question_type: self.question_type,
            title: self.title,
            required: self.required,
            options: self.options,
            description: self.description,
        }
    }
}

/// Individual question update operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionUpdate {
    Type(QuestionType),
    Title(String),
    Required(bool),
    /// Replace all options with a new list
    SetOptions(Vec<QuestionOption>),
    ClearOptions,
    Description(String),
    ClearDescription,
}

impl Question {
    pub fn apply_update(&mut self, update: QuestionUpdate) {
        match update {
            QuestionUpdate::Type(question_type) => self.question_type = question_type,
            QuestionUpdate::Title(title) => self.title = title,
            QuestionUpdate::Required(required) => self.required = required,
            QuestionUpdate::SetOptions(options) => self.options = Some(options),
            QuestionUpdate::ClearOptions => self.options = None,
            QuestionUpdate::Description(description) => self.description = Some(description),
            QuestionUpdate::ClearDescription => self.description = None,
        }
    }
}

/// Individual form update operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormUpdate {
    Title(String),
    Description(String),
    /// Replace the whole question list
    Questions(Vec<Question>),
}

impl Form {
    /// Build a fresh form; a blank title falls back to `default_title`
    pub fn create(
        id: FormId,
        event_id: EventId,
        title: impl Into<String>,
        description: impl Into<String>,
        default_title: &str,
        now: u64,
    ) -> Self {
        let title = title.into();
        Self {
            id,
            event_id,
            title: if title.trim().is_empty() {
                default_title.to_string()
            } else {
                title
            },
            description: description.into(),
            questions: Vec::new(),
            created_at: now,
            updated_at: now,
            response_count: 0,
        }
    }

    pub fn apply_update(&mut self, update: FormUpdate) {
        match update {
            FormUpdate::Title(title) => self.title = title,
            FormUpdate::Description(description) => self.description = description,
            FormUpdate::Questions(questions) => self.questions = questions,
        }
    }

    /// Apply all updates in order and return the merged copy
    pub fn with_updates(mut self, updates: impl IntoIterator<Item = FormUpdate>) -> Self {
        for update in updates {
            self.apply_update(update);
        }
        self
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    /// Question list with `question` appended
    pub fn questions_with_added(&self, question: NewQuestion) -> ValidationResult<Vec<Question>> {
        let question = question.into_question();
        if self.question(&question.id).is_some() {
            return Err(ValidationError::DuplicateQuestion(question.id.to_string()));
        }
        let mut questions = self.questions.clone();
        questions.push(question);
        Ok(questions)
    }

    /// Question list with the updates applied to question `id`
    pub fn questions_with_updated(
        &self,
        id: &QuestionId,
        updates: impl IntoIterator<Item = QuestionUpdate>,
    ) -> ValidationResult<Vec<Question>> {
        let mut questions = self.questions.clone();
        let question = questions
            .iter_mut()
            .find(|q| &q.id == id)
            .ok_or_else(|| ValidationError::QuestionNotFound(id.to_string()))?;
        for update in updates {
            question.apply_update(update);
        }
        Ok(questions)
    }

    /// Question list without question `id`
    pub fn questions_without(&self, id: &QuestionId) -> ValidationResult<Vec<Question>> {
        if self.question(id).is_none() {
            return Err(ValidationError::QuestionNotFound(id.to_string()));
        }
        Ok(self
            .questions
            .iter()
            .filter(|q| &q.id != id)
            .cloned()
            .collect())
    }
}
