//! SQL schema definitions.

/// Complete schema for hush v1.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Surveys & questions
-- ============================================================

CREATE TABLE IF NOT EXISTS surveys (
    id BLOB PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL CHECK (status IN ('Draft', 'Active', 'Closed')),
    anonymity_threshold INTEGER NOT NULL CHECK (anonymity_threshold > 0),
    jitter_minutes INTEGER NOT NULL CHECK (jitter_minutes >= 0),
    protected_secret TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS questions (
    id BLOB PRIMARY KEY,
    survey_id BLOB NOT NULL REFERENCES surveys(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    text TEXT NOT NULL,
    options TEXT NOT NULL DEFAULT '[]',
    required INTEGER NOT NULL DEFAULT 1,
    ordinal INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_questions_survey ON questions(survey_id, ordinal);

-- ============================================================
-- Responses: exactly four columns, nothing identifying
-- ============================================================

CREATE TABLE IF NOT EXISTS responses (
    id BLOB PRIMARY KEY,
    survey_id BLOB NOT NULL REFERENCES surveys(id) ON DELETE CASCADE,
    answers TEXT NOT NULL,
    submitted_at INTEGER NOT NULL
) WITHOUT ROWID;

CREATE INDEX IF NOT EXISTS idx_responses_survey ON responses(survey_id);

-- ============================================================
-- Token ledger: hash + survey, nothing else
-- ============================================================

CREATE TABLE IF NOT EXISTS used_tokens (
    token_hash TEXT NOT NULL,
    survey_id BLOB NOT NULL,
    PRIMARY KEY (token_hash, survey_id)
) WITHOUT ROWID;
"#;
