mod config;
mod terminal;

use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use replydesk_client::api::ReplyDeskApi;
use replydesk_core::board::BoardSnapshot;
use replydesk_core::stats::{CounterWidget, RateWidget, StatsReconciler};
use replydesk_desk::desk::Desk;
use replydesk_events::follower::StatsFollower;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DeskConfig;
use crate::terminal::{LogProgress, TerminalNotifier};

const USAGE: &str = "usage: replydesk-worker <generate|pending> [COMMENT_ID...]";

/// Bulk operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Generate(Vec<String>),
    MarkPending(Vec<String>),
}

impl Command {
    /// Parse `<generate|pending> [ids...]`. No ids means every top-level
    /// comment on the board.
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut args = args.into_iter();
        let Some(name) = args.next() else {
            bail!("missing command\n{USAGE}");
        };
        let ids: Vec<String> = args.collect();
        match name.as_str() {
            "generate" => Ok(Self::Generate(ids)),
            "pending" => Ok(Self::MarkPending(ids)),
            other => bail!("unknown command {other:?}\n{USAGE}"),
        }
    }

    fn ids(&self) -> &[String] {
        match self {
            Self::Generate(ids) | Self::MarkPending(ids) => ids,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "replydesk_worker=debug,replydesk_desk=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = Command::parse(std::env::args().skip(1))?;
    let config = DeskConfig::from_env()?;

    let raw = std::fs::read_to_string(&config.board_file)
        .with_context(|| format!("reading board snapshot {}", config.board_file.display()))?;
    let snapshot: BoardSnapshot =
        serde_json::from_str(&raw).context("parsing board snapshot")?;
    let stats = snapshot.stats;

    tracing::info!(
        server = %config.server_url,
        comments = snapshot.comments.len(),
        unreplied = stats.unreplied,
        pending = stats.pending,
        replied = stats.replied,
        "Board loaded",
    );

    let counters = Arc::new(Mutex::new(CounterWidget::from_snapshot(&stats)));
    let rate = Arc::new(Mutex::new(RateWidget::from_snapshot(&stats)));

    let desk = Desk::new(
        Arc::new(ReplyDeskApi::new(config.server_url.clone())),
        Arc::new(TerminalNotifier::new(config.assume_yes)),
        snapshot,
    )
    .with_widget(counters.clone())
    .with_progress_view(Arc::new(LogProgress))
    .with_bulk_config(config.bulk);

    let follower = tokio::spawn(StatsFollower::run(
        StatsReconciler::new(rate.clone()),
        desk.subscribe(),
    ));

    let ids = if command.ids().is_empty() {
        desk.order()
    } else {
        command.ids().to_vec()
    };
    for id in &ids {
        desk.set_selected(id, true)
            .with_context(|| format!("selecting {id}"))?;
    }

    let result = match command {
        Command::Generate(_) => desk.bulk_generate().await,
        Command::MarkPending(_) => desk.bulk_mark_pending().await,
    };
    let final_stats = desk.stats();
    drop(desk);

    let deltas = follower.await.context("stats follower panicked")?;

    let rate_label = rate
        .lock()
        .map(|w| w.rate_label().to_string())
        .unwrap_or_default();
    match result {
        Some(progress) => tracing::info!(
            succeeded = progress.succeeded(),
            failed = progress.failed(),
            deltas,
            unreplied = final_stats.unreplied,
            pending = final_stats.pending,
            replied = final_stats.replied,
            unreplied_rate = %rate_label,
            "Worker finished",
        ),
        None => tracing::info!("Nothing ran"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_generate_with_ids() {
        let command = Command::parse(args(&["generate", "c1", "c2"])).unwrap();
        assert_eq!(command, Command::Generate(args(&["c1", "c2"])));
    }

    #[test]
    fn parses_pending_without_ids() {
        let command = Command::parse(args(&["pending"])).unwrap();
        assert_eq!(command, Command::MarkPending(Vec::new()));
        assert!(command.ids().is_empty());
    }

    #[test]
    fn rejects_unknown_or_missing_command() {
        assert!(Command::parse(args(&["post", "c1"])).is_err());
        assert!(Command::parse(Vec::new()).is_err());
    }
}
