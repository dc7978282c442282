//! Append-only form submissions

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::identity::{EventId, FormId, QuestionId, ResponseId};

/// A submission against a form; never mutated once persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: ResponseId,
    pub form_id: FormId,
    pub event_id: EventId,
    pub answers: Vec<Answer>,
    pub submitted_at: u64,
}

/// The value given for a single question
///
/// `question_id` is a soft reference and is not checked against the form's
/// live question list unless the engine is configured to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: QuestionId,
    pub value: AnswerValue,
}

impl Answer {
    pub fn text(question_id: QuestionId, value: impl Into<String>) -> Self {
        Self {
            question_id,
            value: AnswerValue::Text(value.into()),
        }
    }

    pub fn choices<I, S>(question_id: QuestionId, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question_id,
            value: AnswerValue::Choices(values.into_iter().map(Into::into).collect()),
        }
    }
}

/// A single string, or a set of strings for multi-select questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Choices(BTreeSet<String>),
}

impl Response {
    pub fn answer(&self, question_id: &QuestionId) -> Option<&AnswerValue> {
        self.answers
            .iter()
            .find(|a| &a.question_id == question_id)
            .map(|a| &a.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_answer_values_are_untagged() {
        let q1 = QuestionId::new("q1").unwrap();
        let text = Answer::text(q1.clone(), "Alice");
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json, serde_json::json!({"questionId": "q1", "value": "Alice"}));

        let choices = Answer::choices(q1, ["b", "a", "b"]);
        let json = serde_json::to_value(&choices).unwrap();
        assert_eq!(json["value"], serde_json::json!(["a", "b"]));
    }
}
