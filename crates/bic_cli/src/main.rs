use anyhow::Context;
use bic_core::{BciConfig, Tab, UserIntent};
use bic_engine::BciEngine;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

use render::DashboardView;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config
    #[arg(short, long, default_value = "bic.toml")]
    config: PathBuf,

    /// Stop after this many seconds (default: run until Ctrl-C or `quit`)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Fixed RNG seed for a reproducible session
    #[arg(long)]
    seed: Option<u64>,

    /// Tab shown on startup
    #[arg(long, default_value = "dashboard", value_parser = parse_tab)]
    tab: Tab,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Print the final session as JSON on exit
    #[arg(long)]
    summary_json: bool,
}

fn parse_tab(s: &str) -> Result<Tab, String> {
    Tab::parse(s).ok_or_else(|| format!("unknown tab '{}'", s))
}

/// A line typed at the prompt
#[derive(Debug, PartialEq)]
enum Command {
    Intent(UserIntent),
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let cmd = match (words.next()?, words.next()) {
        ("quit" | "exit", _) => Command::Quit,
        ("accept", _) => Command::Intent(UserIntent::AcceptSuggestion),
        ("modify", _) => Command::Intent(UserIntent::ModifySuggestion),
        ("tab", Some(name)) => match Tab::parse(name) {
            Some(tab) => Command::Intent(UserIntent::SwitchTab(tab)),
            None => Command::Unknown(line.to_string()),
        },
        _ => Command::Unknown(line.to_string()),
    };
    Some(cmd)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn view(engine: &BciEngine) -> DashboardView {
    DashboardView {
        status: engine.connection_status(),
        tab: engine.active_tab(),
        snapshot: engine.current_snapshot(),
        history: engine.history(),
        state: engine.current_state(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json);

    let mut config = BciConfig::load_or_default(&args.config)
        .context("Failed to load BCI configuration")?;
    if args.seed.is_some() {
        config.generator.seed = args.seed;
    }

    info!("Initializing BCI session...");
    let engine = BciEngine::new(config).context("Invalid BCI configuration")?;
    engine.handle_intent(UserIntent::SwitchTab(args.tab));
    engine
        .on_state_change(|s| info!("Neural state -> {}", s.label))
        .await;

    let mut snapshot_rx = engine.subscribe_snapshot();
    let mut state_rx = engine.subscribe_state();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let deadline = tokio::time::sleep(args.duration.map(Duration::from_secs).unwrap_or_default());
    tokio::pin!(deadline);

    engine.start().await;
    println!("BCI dashboard online. Commands: tab <dashboard|signals|chat|training>, accept, modify, quit");
    println!("{}", render::render(&view(&engine)));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = &mut deadline, if args.duration.is_some() => {
                info!("Session duration elapsed");
                break;
            }
            Ok(()) = snapshot_rx.changed() => {
                snapshot_rx.borrow_and_update();
                println!("{}", render::render(&view(&engine)));
            }
            Ok(()) = state_rx.changed() => {
                state_rx.borrow_and_update();
                println!("{}", render::render(&view(&engine)));
            }
            line = lines.next_line(), if stdin_open => {
                // EOF: stop polling stdin, keep the session running
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                match parse_command(&line) {
                    Some(Command::Quit) => break,
                    Some(Command::Intent(intent)) => {
                        engine.handle_intent(intent);
                        println!("{}", render::render(&view(&engine)));
                    }
                    Some(Command::Unknown(text)) => println!("Unknown command: {}", text),
                    None => {}
                }
            }
        }
    }

    engine.stop().await;

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&view(&engine))?);
    }
    Ok(())
}
