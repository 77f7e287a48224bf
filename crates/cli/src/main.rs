mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use contest_core::domain::{ContestId, Language, ProblemId};
use contest_sync::{
    ContestView, FileIdentityStore, HttpJudgeApi, IdentityStore, SyncConfig, ViewEvent,
    join_contest,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "contest-cli")]
#[command(about = "Follow a contest's leaderboard and submission verdicts from the terminal")]
struct Args {
    /// Sync config file, defaults are used when it does not exist
    #[arg(short, long, default_value = "contest-sync.toml", env = "CONTEST_SYNC_CONFIG")]
    config: PathBuf,

    /// Judge service base URL, overrides the config file
    #[arg(long, env = "CONTEST_API_URL")]
    api_url: Option<String>,

    /// Contest to open
    #[arg(long)]
    contest: String,

    /// Display name; stored for later runs
    #[arg(short, long)]
    username: Option<String>,

    /// Problem to select instead of the contest's first problem
    #[arg(short, long)]
    problem: Option<String>,

    /// Source file to submit once the contest is loaded
    #[arg(short, long)]
    submit: Option<PathBuf>,

    #[arg(short, long, default_value = "java")]
    language: Language,

    /// Exit once the submission reaches a final state
    #[arg(long)]
    exit_after_verdict: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let config = load_config(&args.config, args.api_url.as_deref())?;
    info!(api_base_url = %config.api_base_url, "judge service configured");

    let api = Arc::new(HttpJudgeApi::new(&config).context("failed to build judge client")?);
    let identity: Arc<dyn IdentityStore> = match &config.identity_path {
        Some(path) => Arc::new(FileIdentityStore::new(path)),
        None => Arc::new(
            FileIdentityStore::in_config_dir().context("failed to locate identity file")?,
        ),
    };

    let contest_id = match args.username.as_deref() {
        Some(username) => {
            let (contest_id, _) = join_contest(identity.as_ref(), &args.contest, username)
                .await
                .context("failed to join contest")?;
            contest_id
        }
        None => {
            let contest_id = args.contest.trim();
            anyhow::ensure!(!contest_id.is_empty(), "contest id must not be empty");
            ContestId::from(contest_id)
        }
    };

    let view = ContestView::new(&config, contest_id, api, identity);
    let mut event_stream = view.subscribe_events();
    view.mount().await;

    match view.username().await {
        Some(username) => info!(username = %username, "signed in"),
        None => warn!("no stored display name, pass --username to submit"),
    }

    if let Some(problem) = args.problem.as_deref() {
        view.select_problem(&ProblemId::from(problem)).await;
    }

    if let Some(path) = args.submit.as_deref() {
        let source_code = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read source file: {}", path.display()))?;
        let outcome = view.submit(source_code, args.language).await;
        info!(?outcome, language = %args.language, "submission sent");
    }

    info!("following contest, press Ctrl+C to quit");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            event = event_stream.recv() => {
                let event = match event {
                    Ok(event) => event,
                    // lagged events are skipped inside the stream, so this is a closed view
                    Err(err) => {
                        warn!(error = %err, "view event stream closed");
                        break;
                    }
                };
                render::log_event(&event);
                match event {
                    ViewEvent::LeaderboardUpdated { .. } => {
                        render::log_leaderboard(&view.snapshot().await);
                    }
                    ViewEvent::SubmissionFinished { .. } if args.exit_after_verdict => break,
                    _ => {}
                }
            }
        }
    }

    view.unmount().await;
    info!("contest client stopped");
    Ok(())
}

fn load_config(path: &Path, api_url: Option<&str>) -> anyhow::Result<SyncConfig> {
    let mut config = if path.exists() {
        info!(path = %path.display(), "loading sync config");
        SyncConfig::from_file(path)?
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        SyncConfig::default()
    };

    if let Some(api_url) = api_url {
        config.api_base_url = api_url.to_string();
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_submission_flags() {
        let args = Args::try_parse_from([
            "contest-cli",
            "--contest",
            "c1",
            "--username",
            "alice",
            "--submit",
            "main.py",
            "--language",
            "python",
            "--exit-after-verdict",
        ])
        .expect("args should parse");

        assert_eq!(args.contest, "c1");
        assert_eq!(args.username.as_deref(), Some("alice"));
        assert_eq!(args.language, Language::Python);
        assert!(args.exit_after_verdict);
    }

    #[test]
    fn unknown_language_is_rejected() {
        let result = Args::try_parse_from(["contest-cli", "--contest", "c1", "-l", "rust"]);

        assert!(result.is_err());
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = load_config(
            Path::new("/nonexistent/contest-sync.toml"),
            Some("http://judge.test/api"),
        )
        .expect("defaults should load");

        assert_eq!(config.api_base_url, "http://judge.test/api");
        assert_eq!(config.poll.interval_ms, 2_000);
    }
}
