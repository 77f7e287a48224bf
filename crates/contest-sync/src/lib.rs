pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod identity;
pub mod leaderboard;
pub mod schedule;
pub mod tracker;
pub mod view;

pub use config::{PollPolicy, SyncConfig};
pub use error::{Result, SyncError};
pub use events::{EventBroadcaster, EventStream, RefreshCause, ViewEvent};
pub use http::HttpJudgeApi;
pub use identity::{FileIdentityStore, IdentityStore, MemoryIdentityStore, join_contest};
pub use leaderboard::LeaderboardRefresher;
pub use schedule::{Backoff, PeriodicTask, Schedule, TickCause};
pub use tracker::{SubmissionDraft, SubmissionTracker, SubmitOutcome, TrackerSnapshot};
pub use view::{ContestView, ViewSnapshot};
