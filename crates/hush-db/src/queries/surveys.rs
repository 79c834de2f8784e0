//! Survey and question query functions.

use rusqlite::{Connection, OptionalExtension};

use hush_types::{ProtectedSecret, Question, QuestionId, Survey, SurveyId, SurveyStatus};

use super::id_bytes;
use crate::{DbError, Result};

/// Insert a survey and all its questions in one transaction.
pub fn insert(conn: &Connection, survey: &Survey) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO surveys (id, title, description, status, anonymity_threshold,
                              jitter_minutes, protected_secret, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            survey.id.as_bytes().as_slice(),
            survey.title,
            survey.description,
            survey.status.as_str(),
            survey.anonymity_threshold,
            survey.jitter_minutes,
            survey.protected_secret.envelope(),
            survey.created_at as i64,
        ],
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO questions (id, survey_id, kind, text, options, required, ordinal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for q in &survey.questions {
            let options = serde_json::to_string(&q.options)
                .map_err(|e| DbError::Serialization(e.to_string()))?;
            stmt.execute(rusqlite::params![
                q.id.as_bytes().as_slice(),
                survey.id.as_bytes().as_slice(),
                q.kind.as_str(),
                q.text,
                options,
                q.required,
                q.order,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Fetch one survey with its questions.
pub fn get(conn: &Connection, id: SurveyId) -> Result<Option<Survey>> {
    let row = conn
        .query_row(
            "SELECT id, title, description, status, anonymity_threshold, jitter_minutes,
                    protected_secret, created_at
             FROM surveys WHERE id = ?1",
            [id.as_bytes().as_slice()],
            SurveyRow::from_row,
        )
        .optional()?;

    match row {
        Some(row) => {
            let questions = questions_for(conn, id)?;
            Ok(Some(row.into_survey(questions)?))
        }
        None => Ok(None),
    }
}

/// List all surveys, newest first, each with its questions.
pub fn list(conn: &Connection) -> Result<Vec<Survey>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, status, anonymity_threshold, jitter_minutes,
                protected_secret, created_at
         FROM surveys ORDER BY created_at DESC",
    )?;

    let rows = stmt
        .query_map([], SurveyRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|row| {
            let id = SurveyId::from_bytes(id_bytes(row.id.clone())?);
            let questions = questions_for(conn, id)?;
            row.into_survey(questions)
        })
        .collect()
}

/// Update a survey's status. Returns `false` if no such survey exists.
pub fn set_status(conn: &Connection, id: SurveyId, status: SurveyStatus) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE surveys SET status = ?1 WHERE id = ?2",
        rusqlite::params![status.as_str(), id.as_bytes().as_slice()],
    )?;
    Ok(changed == 1)
}

/// Conditional `Draft|Active -> Active`. A closed survey is never reopened.
pub fn activate(conn: &Connection, id: SurveyId) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE surveys SET status = 'Active' WHERE id = ?1 AND status != 'Closed'",
        [id.as_bytes().as_slice()],
    )?;
    Ok(changed == 1)
}

/// Questions for a survey in declared order.
pub fn questions_for(conn: &Connection, survey_id: SurveyId) -> Result<Vec<Question>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, text, options, required, ordinal
         FROM questions WHERE survey_id = ?1 ORDER BY ordinal ASC",
    )?;

    let rows = stmt
        .query_map([survey_id.as_bytes().as_slice()], |row| {
            Ok(QuestionRow {
                id: row.get(0)?,
                kind: row.get(1)?,
                text: row.get(2)?,
                options: row.get(3)?,
                required: row.get(4)?,
                ordinal: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(QuestionRow::into_question).collect()
}

/// A raw survey row from the database.
#[derive(Debug)]
pub struct SurveyRow {
    pub id: Vec<u8>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub anonymity_threshold: u32,
    pub jitter_minutes: u32,
    pub protected_secret: String,
    pub created_at: u64,
}

impl SurveyRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            anonymity_threshold: row.get(4)?,
            jitter_minutes: row.get(5)?,
            protected_secret: row.get(6)?,
            created_at: row.get::<_, i64>(7)? as u64,
        })
    }

    fn into_survey(self, questions: Vec<Question>) -> Result<Survey> {
        let status = self.status.parse::<SurveyStatus>().map_err(DbError::Corrupt)?;
        Ok(Survey {
            id: SurveyId::from_bytes(id_bytes(self.id)?),
            title: self.title,
            description: self.description,
            status,
            anonymity_threshold: self.anonymity_threshold,
            jitter_minutes: self.jitter_minutes,
            protected_secret: ProtectedSecret::new(self.protected_secret),
            created_at: self.created_at,
            questions,
        })
    }
}

/// A raw question row from the database.
#[derive(Debug)]
pub struct QuestionRow {
    pub id: Vec<u8>,
    pub kind: String,
    pub text: String,
    pub options: String,
    pub required: bool,
    pub ordinal: i32,
}

impl QuestionRow {
    fn into_question(self) -> Result<Question> {
        let kind = self.kind.parse().map_err(DbError::Corrupt)?;
        let options: Vec<String> = serde_json::from_str(&self.options)
            .map_err(|e| DbError::Serialization(e.to_string()))?;
        Ok(Question {
            id: QuestionId::from_bytes(id_bytes(self.id)?),
            kind,
            text: self.text,
            options,
            required: self.required,
            order: self.ordinal,
        })
    }
}
