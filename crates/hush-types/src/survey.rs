//! Survey and question structures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::{QuestionId, SurveyId};

/// Lifecycle state of a survey.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyStatus {
    Draft,
    Active,
    Closed,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStatus::Draft => "Draft",
            SurveyStatus::Active => "Active",
            SurveyStatus::Closed => "Closed",
        }
    }
}

impl FromStr for SurveyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(SurveyStatus::Draft),
            "Active" => Ok(SurveyStatus::Active),
            "Closed" => Ok(SurveyStatus::Closed),
            other => Err(format!("unknown survey status '{other}'")),
        }
    }
}

/// Closed set of question kinds. Aggregation dispatches exhaustively on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    MultipleChoice,
    FreeText,
    Rating,
    Matrix,
    YesNo,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [
        QuestionType::MultipleChoice,
        QuestionType::FreeText,
        QuestionType::Rating,
        QuestionType::Matrix,
        QuestionType::YesNo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "MultipleChoice",
            QuestionType::FreeText => "FreeText",
            QuestionType::Rating => "Rating",
            QuestionType::Matrix => "Matrix",
            QuestionType::YesNo => "YesNo",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown question type '{s}'"))
    }
}

/// A single question. Immutable once its survey is published.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub text: String,
    pub options: Vec<String>,
    pub required: bool,
    pub order: i32,
}

/// A batch secret as wrapped by the protector. Opaque outside the
/// protect/unprotect boundary; never serialized to clients.
#[derive(Clone, PartialEq, Eq)]
pub struct ProtectedSecret(String);

impl ProtectedSecret {
    pub fn new(envelope: String) -> Self {
        Self(envelope)
    }

    pub fn envelope(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProtectedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProtectedSecret(..)")
    }
}

/// A survey together with its questions and anonymity policy.
#[derive(Clone, Debug)]
pub struct Survey {
    pub id: SurveyId,
    pub title: String,
    pub description: String,
    pub status: SurveyStatus,
    /// Minimum response count before any aggregate is disclosed. Always > 0.
    pub anonymity_threshold: u32,
    /// Jitter window applied to submission timestamps.
    pub jitter_minutes: u32,
    /// Set once at creation.
    pub protected_secret: ProtectedSecret,
    /// Unix seconds.
    pub created_at: u64,
    pub questions: Vec<Question>,
}

impl Survey {
    /// Questions sorted by declared order. Ties keep insertion order.
    pub fn questions_in_order(&self) -> Vec<&Question> {
        let mut ordered: Vec<&Question> = self.questions.iter().collect();
        ordered.sort_by_key(|q| q.order);
        ordered
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn accepts_responses(&self) -> bool {
        self.status == SurveyStatus::Active
    }

    /// Client-facing projection. Never carries the protected secret.
    pub fn view(&self) -> SurveyView {
        SurveyView {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            anonymity_threshold: self.anonymity_threshold,
            timestamp_jitter_minutes: self.jitter_minutes,
            created_at: self.created_at,
            questions: self.questions_in_order().into_iter().cloned().collect(),
        }
    }

    /// Listing projection without questions.
    pub fn summary(&self) -> SurveyView {
        SurveyView {
            questions: Vec::new(),
            ..self.view()
        }
    }
}

/// Client-facing survey shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyView {
    pub id: SurveyId,
    pub title: String,
    pub description: String,
    pub status: SurveyStatus,
    pub anonymity_threshold: u32,
    pub timestamp_jitter_minutes: u32,
    pub created_at: u64,
    pub questions: Vec<Question>,
}
