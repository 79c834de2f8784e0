//! Per-question aggregation.
//!
//! One pure function per [`QuestionType`] variant. Answers that do not fit a
//! question (unknown option, unparsable rating, malformed matrix object) are
//! dropped silently; a missing answer is skipped.

use std::collections::BTreeMap;

use hush_crypto::shuffle::shuffle_in_place;
use hush_types::{AggregateData, Question, QuestionAggregate, QuestionType, Survey, SurveyResponse};

/// Aggregate every question of `survey` over `responses`, in declared order.
pub fn aggregate(survey: &Survey, responses: &[SurveyResponse]) -> AggregateData {
    AggregateData {
        survey_id: survey.id,
        survey_title: survey.title.clone(),
        total_responses: responses.len() as u64,
        questions: survey
            .questions_in_order()
            .into_iter()
            .map(|q| aggregate_question(q, responses))
            .collect(),
    }
}

/// Dispatch on question type.
pub fn aggregate_question(question: &Question, responses: &[SurveyResponse]) -> QuestionAggregate {
    let answers = responses.iter().filter_map(|r| r.answer(question.id));
    let mut agg = seeded(question);

    match question.kind {
        QuestionType::MultipleChoice | QuestionType::YesNo => tally_choices(&mut agg, answers),
        QuestionType::FreeText => collect_free_text(&mut agg, answers),
        QuestionType::Rating => tally_ratings(&mut agg, answers),
        QuestionType::Matrix => tally_matrix(&mut agg, answers),
    }

    fill_percentages(&mut agg);
    agg
}

/// Empty aggregate with every declared option at zero.
fn seeded(question: &Question) -> QuestionAggregate {
    let mut agg = QuestionAggregate::empty(&question.text, question.kind);
    for option in &question.options {
        agg.option_counts.insert(option.clone(), 0);
        agg.option_percentages.insert(option.clone(), 0.0);
    }
    agg
}

fn tally_choices<'a>(agg: &mut QuestionAggregate, answers: impl Iterator<Item = &'a str>) {
    for answer in answers {
        if let Some(count) = agg.option_counts.get_mut(answer) {
            *count += 1;
        }
    }
}

fn collect_free_text<'a>(agg: &mut QuestionAggregate, answers: impl Iterator<Item = &'a str>) {
    let mut texts: Vec<String> = answers.map(str::to_string).collect();
    shuffle_in_place(&mut texts);
    agg.free_text_answers = texts;
}

/// Ratings are both a distribution (keyed by the parsed value) and a mean.
fn tally_ratings<'a>(agg: &mut QuestionAggregate, answers: impl Iterator<Item = &'a str>) {
    let mut sum = 0.0;
    let mut parsed = 0u64;
    for answer in answers {
        let Ok(value) = answer.trim().parse::<f64>() else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        sum += value;
        parsed += 1;
        *agg.option_counts.entry(value.to_string()).or_insert(0) += 1;
    }
    agg.average_rating = (parsed > 0).then(|| sum / parsed as f64);
}

/// Matrix answers are a JSON object of `{row: choice}`. Each choice that is a
/// declared option is tallied under `"row: choice"`.
fn tally_matrix<'a>(agg: &mut QuestionAggregate, answers: impl Iterator<Item = &'a str>) {
    let declared: Vec<String> = agg.option_counts.keys().cloned().collect();
    agg.option_counts.clear();
    agg.option_percentages.clear();

    for answer in answers {
        let Ok(rows) = serde_json::from_str::<BTreeMap<String, String>>(answer) else {
            continue;
        };
        for (row, choice) in rows {
            if declared.contains(&choice) {
                *agg.option_counts.entry(format!("{row}: {choice}")).or_insert(0) += 1;
            }
        }
    }
}

/// Percent of answered responses for this question.
fn fill_percentages(agg: &mut QuestionAggregate) {
    let answered = agg.answered();
    agg.option_percentages = agg
        .option_counts
        .iter()
        .map(|(key, &count)| {
            let pct = if answered == 0 {
                0.0
            } else {
                count as f64 / answered as f64 * 100.0
            };
            (key.clone(), pct)
        })
        .collect();
}
