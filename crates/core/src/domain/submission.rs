use super::{ContestId, Language, ProblemId, StatusReport, SubmissionId, SubmissionStatus, Username};

/// The submission currently or most recently tracked by the client.
///
/// `id` is `None` until the judging service has accepted the request and never
/// changes after that; only `status` moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: Option<SubmissionId>,
    pub username: Username,
    pub contest_id: ContestId,
    pub problem_id: ProblemId,
    pub language: Language,
    pub source_code: String,
    pub status: SubmissionStatus,
}

/// Terminal record kept after the tracker detaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub submission_id: Option<SubmissionId>,
    pub problem_id: ProblemId,
    pub status: SubmissionStatus,
    pub report: Option<StatusReport>,
    pub failure: Option<String>,
}
