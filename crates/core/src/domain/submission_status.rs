use std::fmt;

use super::DomainError;

/// Lifecycle of the tracked submission, as displayed to the user.
///
/// `Pending` and `Running` are reported by the judging service and keep the poll
/// loop alive. The four verdicts, `SubmitError` and `PollTimeout` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Pending,
    Running,
    Accepted,
    WrongAnswer,
    RuntimeError,
    TimeLimitExceeded,
    SubmitError,
    PollTimeout,
}

/// Coarse display classification of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Success,
    Failure,
    InProgress,
    Neutral,
}

impl SubmissionStatus {
    /// Parses a status code reported by the judging service.
    ///
    /// Only the server-side vocabulary is accepted; client-only states such as
    /// `Submitting` have no wire form.
    pub fn from_wire(code: &str) -> Result<Self, DomainError> {
        match code {
            "PENDING" => Ok(SubmissionStatus::Pending),
            "RUNNING" => Ok(SubmissionStatus::Running),
            "ACCEPTED" => Ok(SubmissionStatus::Accepted),
            "WRONG_ANSWER" => Ok(SubmissionStatus::WrongAnswer),
            "RUNTIME_ERROR" => Ok(SubmissionStatus::RuntimeError),
            "TIME_LIMIT_EXCEEDED" => Ok(SubmissionStatus::TimeLimitExceeded),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }

    pub fn wire_code(self) -> Option<&'static str> {
        match self {
            SubmissionStatus::Pending => Some("PENDING"),
            SubmissionStatus::Running => Some("RUNNING"),
            SubmissionStatus::Accepted => Some("ACCEPTED"),
            SubmissionStatus::WrongAnswer => Some("WRONG_ANSWER"),
            SubmissionStatus::RuntimeError => Some("RUNTIME_ERROR"),
            SubmissionStatus::TimeLimitExceeded => Some("TIME_LIMIT_EXCEEDED"),
            _ => None,
        }
    }

    /// A judged outcome that changes the leaderboard.
    pub fn is_verdict(self) -> bool {
        matches!(
            self,
            SubmissionStatus::Accepted
                | SubmissionStatus::WrongAnswer
                | SubmissionStatus::RuntimeError
                | SubmissionStatus::TimeLimitExceeded
        )
    }

    pub fn is_terminal(self) -> bool {
        self.is_verdict()
            || matches!(
                self,
                SubmissionStatus::SubmitError | SubmissionStatus::PollTimeout
            )
    }

    pub fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "",
            SubmissionStatus::Submitting => "Submitting...",
            SubmissionStatus::Pending => "Pending",
            SubmissionStatus::SubmitError => "Error submitting",
            SubmissionStatus::PollTimeout => "Timed out waiting for verdict",
            judged => judged.wire_code().unwrap_or_default(),
        }
    }

    pub fn tone(self) -> StatusTone {
        match self {
            SubmissionStatus::Accepted => StatusTone::Success,
            SubmissionStatus::WrongAnswer => StatusTone::Failure,
            SubmissionStatus::Pending | SubmissionStatus::Running => StatusTone::InProgress,
            _ => StatusTone::Neutral,
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_parse_into_server_states() {
        assert_eq!(
            SubmissionStatus::from_wire("PENDING"),
            Ok(SubmissionStatus::Pending)
        );
        assert_eq!(
            SubmissionStatus::from_wire("TIME_LIMIT_EXCEEDED"),
            Ok(SubmissionStatus::TimeLimitExceeded)
        );
        assert_eq!(
            SubmissionStatus::from_wire("COMPILATION_ERROR"),
            Err(DomainError::UnknownStatus("COMPILATION_ERROR".to_string()))
        );
    }

    #[test]
    fn only_verdicts_and_failures_are_terminal() {
        let terminal: Vec<_> = [
            SubmissionStatus::Idle,
            SubmissionStatus::Submitting,
            SubmissionStatus::Pending,
            SubmissionStatus::Running,
            SubmissionStatus::Accepted,
            SubmissionStatus::WrongAnswer,
            SubmissionStatus::RuntimeError,
            SubmissionStatus::TimeLimitExceeded,
            SubmissionStatus::SubmitError,
            SubmissionStatus::PollTimeout,
        ]
        .into_iter()
        .filter(|status| status.is_terminal())
        .collect();

        assert_eq!(terminal.len(), 6);
        assert!(!SubmissionStatus::PollTimeout.is_verdict());
        assert!(!SubmissionStatus::SubmitError.is_verdict());
    }

    #[test]
    fn labels_follow_display_conventions() {
        assert_eq!(SubmissionStatus::Submitting.label(), "Submitting...");
        assert_eq!(SubmissionStatus::SubmitError.label(), "Error submitting");
        assert_eq!(SubmissionStatus::WrongAnswer.label(), "WRONG_ANSWER");
        assert_eq!(SubmissionStatus::Running.tone(), StatusTone::InProgress);
        assert_eq!(SubmissionStatus::Accepted.tone(), StatusTone::Success);
        assert_eq!(SubmissionStatus::RuntimeError.tone(), StatusTone::Neutral);
    }
}
