use contest_core::domain::{StatusTone, SubmissionStatus};
use contest_sync::{ViewEvent, ViewSnapshot};
use tracing::{debug, info, warn};

pub fn log_event(event: &ViewEvent) {
    match event {
        ViewEvent::ContestLoaded {
            contest_id,
            problem_count,
        } => info!(%contest_id, problem_count, "contest loaded"),
        ViewEvent::ProblemSelected { problem_id } => info!(%problem_id, "problem selected"),
        ViewEvent::LeaderboardUpdated { entries, cause } => {
            debug!(entries, ?cause, "leaderboard updated")
        }
        ViewEvent::SubmissionStatusChanged {
            submission_id,
            status,
            ..
        } => log_status(*status, submission_id.map(|id| id.into_inner())),
        ViewEvent::SubmissionSuperseded { submission_id, .. } => {
            info!(submission_id = ?submission_id, "previous submission no longer tracked")
        }
        ViewEvent::SubmissionFinished {
            submission_id,
            status,
            ..
        } => info!(submission_id = ?submission_id, status = status.label(), "submission finished"),
    }
}

fn log_status(status: SubmissionStatus, submission_id: Option<u64>) {
    let label = status.label();
    if label.is_empty() {
        return;
    }
    match status.tone() {
        StatusTone::Failure => warn!(?submission_id, status = label, "submission status"),
        StatusTone::Success | StatusTone::InProgress | StatusTone::Neutral => {
            info!(?submission_id, status = label, "submission status")
        }
    }
}

pub fn log_leaderboard(snapshot: &ViewSnapshot) {
    let top = snapshot.leaderboard_top();
    if top.is_empty() {
        info!("leaderboard is empty");
        return;
    }

    for entry in top {
        info!(
            rank = entry.rank,
            username = %entry.username,
            score = entry.score,
            solved = entry.problems_solved,
            "leaderboard"
        );
    }
    if let Some(rank) = snapshot.my_rank() {
        info!(rank, total = snapshot.leaderboard.len(), "your position");
    }
}
