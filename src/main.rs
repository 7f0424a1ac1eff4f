//! Cricket Scorer Server
//!
//! Match coordination server for live cricket scoring.
//! `cricket-scorer demo` plays a short scripted match instead.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cricket_scorer::{
    network::{GameServer, ServerConfig, SessionManager},
    scoring::{
        delivery::{BallInput, Extras},
        engine::ScoringCommand,
        state::{MatchSetup, Side, Toss, TossChoice},
        wicket::DismissalKind,
    },
    VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Cricket Scorer v{}", VERSION);

    if std::env::args().nth(1).as_deref() == Some("demo") {
        return demo_match().await;
    }

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    info!(
        "Max connections: {}, idle timeout: {:?}",
        config.max_connections, config.idle_timeout
    );

    let server = GameServer::new(config);
    tokio::select! {
        result = server.run() => result.context("server stopped")?,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received");
            server.shutdown();
        }
    }

    Ok(())
}

/// Two innings of two overs each, played through a session manager.
async fn demo_match() -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let sessions = SessionManager::default();
    let setup = MatchSetup::new("Lions", "Tigers", 2, Toss::new(Side::TeamA, TossChoice::Bat));
    let (match_id, _) = sessions.create_match(setup).await?;
    info!("Match ID: {}", match_id);

    let first = vec![
        ScoringCommand::StartInnings {
            striker: "Ali".into(),
            non_striker: "Ben".into(),
            bowler: "Sam".into(),
        },
        ScoringCommand::RecordBall(BallInput::runs(4)),
        ScoringCommand::RecordBall(BallInput::runs(1)),
        ScoringCommand::RecordBall(BallInput::extras(Extras::wide(1))),
        ScoringCommand::RecordBall(BallInput::runs(0)),
        ScoringCommand::RecordBall(BallInput::wicket(DismissalKind::Bowled, "Ben")),
        ScoringCommand::SelectNextBatsman { name: "Cal".into() },
        ScoringCommand::RecordBall(BallInput::runs(2)),
        ScoringCommand::RecordBall(BallInput::runs(6)),
        ScoringCommand::ChangeBowler { name: "Tom".into() },
        ScoringCommand::RecordBall(BallInput::runs(1)),
        ScoringCommand::RecordBall(BallInput::runs(1)),
        ScoringCommand::RecordBall(BallInput::runs(0)),
        ScoringCommand::RecordBall(BallInput::runs(4)),
        ScoringCommand::RecordBall(BallInput::runs(2)),
        ScoringCommand::RecordBall(BallInput::runs(1)),
    ];
    let second = vec![
        ScoringCommand::StartInnings {
            striker: "Dev".into(),
            non_striker: "Eli".into(),
            bowler: "Ali".into(),
        },
        ScoringCommand::RecordBall(BallInput::runs(6)),
        ScoringCommand::RecordBall(BallInput::runs(6)),
        ScoringCommand::RecordBall(BallInput::runs(0)),
        ScoringCommand::RecordBall(BallInput::wicket(DismissalKind::Caught, "Dev")),
        ScoringCommand::SelectNextBatsman { name: "Fin".into() },
        ScoringCommand::RecordBall(BallInput::runs(1)),
        ScoringCommand::RecordBall(BallInput::runs(1)),
        ScoringCommand::ChangeBowler { name: "Ben".into() },
        ScoringCommand::RecordBall(BallInput::runs(2)),
        ScoringCommand::RecordBall(BallInput::runs(0)),
        ScoringCommand::RecordBall(BallInput::runs(1)),
        ScoringCommand::RecordBall(BallInput::runs(0)),
        ScoringCommand::RecordBall(BallInput::runs(2)),
        ScoringCommand::RecordBall(BallInput::runs(1)),
    ];

    for command in first.into_iter().chain(second) {
        let name = command.name();
        let update = sessions.apply(&match_id, command, None).await?;
        for event in &update.events {
            info!("v{} {} -> {}", update.version, name, event.name());
        }
        if update.match_completed {
            break;
        }
    }

    let scoreboard = sessions.scoreboard(&match_id).await?;
    for card in &scoreboard.innings {
        info!(
            "{}: {}/{} ({} ov), extras {}",
            card.team_name.as_deref().unwrap_or("-"),
            card.runs,
            card.wickets,
            card.overs,
            card.extras.total()
        );
    }
    info!("{}", scoreboard.headline());

    let details = sessions.details(&match_id).await?;
    info!("Final state hash: {}", details.state_hash);
    info!("Commands recorded: {}", details.commands_recorded);
    info!("=== Demo Match Complete ===");

    Ok(())
}
