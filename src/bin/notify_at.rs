//! # notify-at
//!
//! Reflection reminders. One-shot flags edit or print the state; `--loop`
//! keeps running and alerts whenever a reflection is due.
//!
//! Usage: `notify-at --wakeup --get-state`, `notify-at --loop --use-voice`

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use dotenvy::dotenv;
use log::info;

use notify_at::{Args, CommandInterpreter, Config, DesktopAlerts, ReflectionLoop, StateStore};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("notify-at: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let store = StateStore::open(&config.state_dir)?;
    let interpreter = CommandInterpreter::new(store.clone(), config.schedule.clone());

    let output = interpreter.execute(&args, &Local::now())?;
    print!("{output}");

    if args.run_loop {
        info!("Starting reflection loop with state in {}", config.state_dir.display());
        let alerts = DesktopAlerts::new(config.alerts.clone());
        let mut reflection_loop = ReflectionLoop::new(store, config.schedule, alerts, args.use_voice);
        reflection_loop.run().await;
    }

    Ok(())
}
