//! Threshold gate.

use hush_types::{AggregateData, ResponseStore, Survey};

use crate::{aggregate, Result};

/// Outcome of a results request.
#[derive(Clone, Debug, PartialEq)]
pub enum Disclosure {
    /// Fewer responses than the threshold.
    Denied { need: u32, have: u64 },
    /// Threshold met; full aggregate.
    Disclosed(AggregateData),
}

impl Disclosure {
    /// Caller-facing denial message, `None` when disclosed.
    pub fn denial_message(&self) -> Option<String> {
        match self {
            Disclosure::Denied { need, have } => Some(insufficient_message(*need, *have)),
            Disclosure::Disclosed(_) => None,
        }
    }
}

/// `"Insufficient responses. Need {need}, have {have}."`
pub fn insufficient_message(need: u32, have: u64) -> String {
    format!("Insufficient responses. Need {need}, have {have}.")
}

/// Whether `have` responses meet `threshold`. The boundary is inclusive.
pub fn meets_threshold(threshold: u32, have: u64) -> bool {
    have >= u64::from(threshold)
}

/// Gate and, if permitted, aggregate a survey's responses.
///
/// The cheap count is checked first. Once it passes, the full snapshot is
/// read and the gate is applied again to the snapshot itself, so the
/// reported total always matches the rows that were aggregated.
pub async fn disclose(survey: &Survey, store: &dyn ResponseStore) -> Result<Disclosure> {
    let need = survey.anonymity_threshold;

    let have = store.count_responses(survey.id).await?;
    if !meets_threshold(need, have) {
        tracing::debug!(survey_id = %survey.id, need, have, "results withheld");
        return Ok(Disclosure::Denied { need, have });
    }

    let responses = store.snapshot_responses(survey.id).await?;
    let have = responses.len() as u64;
    if !meets_threshold(need, have) {
        return Ok(Disclosure::Denied { need, have });
    }

    tracing::info!(survey_id = %survey.id, total = have, "results disclosed");
    Ok(Disclosure::Disclosed(aggregate::aggregate(survey, &responses)))
}
