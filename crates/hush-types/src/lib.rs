//! # hush-types
//!
//! Shared domain types used across the hush workspace.
//!
//! The anonymity guarantee is partly structural: [`response::SurveyResponse`]
//! has exactly four fields and nothing here links a response to a redeemed
//! token or to a respondent.

pub mod aggregate;
pub mod id;
pub mod response;
pub mod store;
pub mod survey;

pub use aggregate::{AggregateData, QuestionAggregate};
pub use id::{ParseIdError, QuestionId, ResponseId, SurveyId};
pub use response::SurveyResponse;
pub use store::{ResponseStore, StoreError, StoreResult, SurveyStore};
pub use survey::{ProtectedSecret, Question, QuestionType, Survey, SurveyStatus, SurveyView};

/// Default minimum response count before results are disclosed.
pub const DEFAULT_ANONYMITY_THRESHOLD: u32 = 5;

/// Default submission timestamp jitter window, in minutes.
pub const DEFAULT_JITTER_MINUTES: u32 = 10;
