mod contest;
mod error;
mod ids;
mod judge_api;
mod language;
mod submission;
mod submission_status;
mod username;

pub use contest::{
    Contest, Leaderboard, LeaderboardEntry, ProblemDetail, ProblemSummary, SampleTestCase,
};
pub use error::DomainError;
pub use ids::{ContestId, ProblemId, SubmissionId};
pub use judge_api::{JudgeApi, JudgeApiError, StatusReport, SubmissionRequest};
pub use language::Language;
pub use submission::{Submission, SubmissionOutcome};
pub use submission_status::{StatusTone, SubmissionStatus};
pub use username::Username;
