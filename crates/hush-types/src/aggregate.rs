//! Disclosed aggregate shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::SurveyId;
use crate::survey::QuestionType;

/// Aggregate statistics for a whole survey.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateData {
    pub survey_id: SurveyId,
    pub survey_title: String,
    pub total_responses: u64,
    pub questions: Vec<QuestionAggregate>,
}

/// Aggregate statistics for one question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAggregate {
    pub question_text: String,
    pub question_type: QuestionType,
    pub option_counts: BTreeMap<String, u64>,
    /// Percent of answered responses for this question, not of all responses.
    pub option_percentages: BTreeMap<String, f64>,
    /// Shuffled; order never reflects submission order.
    pub free_text_answers: Vec<String>,
    pub average_rating: Option<f64>,
}

impl QuestionAggregate {
    pub fn empty(question_text: &str, question_type: QuestionType) -> Self {
        Self {
            question_text: question_text.to_string(),
            question_type,
            option_counts: BTreeMap::new(),
            option_percentages: BTreeMap::new(),
            free_text_answers: Vec::new(),
            average_rating: None,
        }
    }

    /// Number of answers that landed in the option table.
    pub fn answered(&self) -> u64 {
        self.option_counts.values().sum()
    }
}
