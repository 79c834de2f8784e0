//! Stored survey responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{QuestionId, ResponseId, SurveyId};

/// One anonymous response.
///
/// Exactly four fields. A respondent id, peer address, user agent, session
/// or token reference must never be added: their absence is what makes a
/// stored response unlinkable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: ResponseId,
    pub survey_id: SurveyId,
    pub answers: BTreeMap<QuestionId, String>,
    /// Jittered Unix seconds.
    pub submitted_at: u64,
}

impl SurveyResponse {
    /// Build a response with a fresh random id.
    pub fn new(survey_id: SurveyId, answers: BTreeMap<QuestionId, String>, submitted_at: u64) -> Self {
        Self {
            id: ResponseId::generate(),
            survey_id,
            answers,
            submitted_at,
        }
    }

    pub fn answer(&self, question: QuestionId) -> Option<&str> {
        self.answers.get(&question).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape_has_exactly_four_fields() {
        let q = QuestionId::generate();
        let response = SurveyResponse::new(
            SurveyId::generate(),
            BTreeMap::from([(q, "Yes".to_string())]),
            1_700_000_000,
        );
        let value = serde_json::to_value(&response).expect("serialize");
        let keys: Vec<&String> = value.as_object().expect("object").keys().collect();
        assert_eq!(keys, vec!["answers", "id", "submittedAt", "surveyId"]);
        assert_eq!(response.answer(q), Some("Yes"));
        assert_eq!(response.answer(QuestionId::generate()), None);
    }
}
