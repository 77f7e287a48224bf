use chrono::NaiveDateTime;

use super::{ContestId, ProblemId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemSummary {
    pub id: ProblemId,
    pub title: String,
}

/// Fetched once per view session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    pub id: ContestId,
    pub name: String,
    pub description: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub problems: Vec<ProblemSummary>,
}

impl Contest {
    /// The problem auto-selected when the contest is loaded.
    pub fn first_problem(&self) -> Option<&ProblemSummary> {
        self.problems.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleTestCase {
    pub input: String,
    pub expected_output: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDetail {
    pub id: ProblemId,
    pub contest_id: Option<ContestId>,
    pub title: String,
    pub statement: String,
    pub input_format: String,
    pub output_format: String,
    pub sample_test_cases: Vec<SampleTestCase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u32,
    pub problems_solved: u32,
    pub rank: u32,
    pub last_submission_time: Option<NaiveDateTime>,
}

/// Ranking exactly as returned by the service. Never re-sorted client-side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new(entries: Vec<LeaderboardEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self, limit: usize) -> &[LeaderboardEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    pub fn rank_of(&self, username: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.username == username)
            .map(|entry| entry.rank)
    }
}
