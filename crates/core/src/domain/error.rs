use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("invalid username length: {0}. username must be at most 64 characters")]
    InvalidUsernameLength(usize),
    #[error("contest id must not be empty")]
    EmptyContestId,
    #[error("unknown language tag: {0}")]
    UnknownLanguage(String),
    #[error("unknown submission status: {0}")]
    UnknownStatus(String),
}
