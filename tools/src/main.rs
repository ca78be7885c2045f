//! fraud-runner: headless runner for the card fraud ring simulator.
//!
//! Usage:
//!   fraud-runner --cards 10000 --pos 1000 --transactions 50000 --frauds 10 --reports 0.1
//!   fraud-runner --config config/card_fraud.json --db fraud.db --seed 12345
//!   fraud-runner --db fraud.db --ipc-mode

use anyhow::Result;
use cardfraud_core::{
    config::{GenerateParams, SimConfig},
    engine::FraudEngine,
    error::SimError,
    types::PosId,
};
use serde_json::{json, Value};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GenerateData(GenerateParams),
    ResolvePos { pos: PosId },
    GetCompromisedPos,
    GetFraudulentTransactions,
    GetPosGraph { pos: PosId },
    LatestRun,
    Quit,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let mut config = match arg_value(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::from_env()?,
    };
    if let Some(db) = arg_value(&args, "--db") {
        config.db_path = db.to_string();
    }
    config.seed = parse_arg(&args, "--seed", config.seed);

    let defaults = &mut config.defaults;
    defaults.card_count = parse_arg(&args, "--cards", defaults.card_count);
    defaults.pos_count = parse_arg(&args, "--pos", defaults.pos_count);
    defaults.tx_count = parse_arg(&args, "--transactions", defaults.tx_count);
    defaults.fraud_count = parse_arg(&args, "--frauds", defaults.fraud_count);
    defaults.report_probability = parse_arg(&args, "--reports", defaults.report_probability);

    if !ipc_mode {
        println!("Card fraud ring simulator: fraud-runner");
        println!("  db:            {}", config.db_path);
        println!("  seed:          {}", config.seed);
        println!("  cards:         {}", config.defaults.card_count);
        println!("  pos devices:   {}", config.defaults.pos_count);
        println!("  transactions:  {}", config.defaults.tx_count);
        println!("  frauds:        {}", config.defaults.fraud_count);
        println!("  report prob.:  {}", config.defaults.report_probability);
        println!();
    }

    let params = config.defaults.clone();
    let mut engine = FraudEngine::open(config)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        engine.generate_data(&params)?;
        print_summary(&engine)?;
    }

    engine.shutdown()?;
    Ok(())
}

/// One JSON command per stdin line, one JSON response per stdout line.
/// Engine failures are answered with an error line; the loop keeps going.
fn run_ipc_loop(engine: &mut FraudEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Unreadable command: {e}");
                writeln!(stdout, "{}", json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let response = match handle_command(engine, cmd) {
            Ok(value) => value,
            Err(SimError::InvalidParameter { reason }) => json!({ "error": reason }),
            Err(e) => {
                log::error!("Command failed: {e}");
                json!({ "error": e.to_string() })
            }
        };
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(engine: &mut FraudEngine, cmd: IpcCommand) -> Result<Value, SimError> {
    let value = match cmd {
        IpcCommand::GenerateData(params) => {
            let report = engine.generate_data(&params)?;
            json!({
                "duration": report.duration.as_secs_f64(),
                "run_id": report.run_id,
                "compromised_pos": report.compromised_pos,
                "fraud_reported": report.stats.fraud_reported,
            })
        }
        IpcCommand::ResolvePos { pos } => {
            let report = engine.resolve_pos(pos)?;
            json!({
                "duration": report.duration.as_secs_f64(),
                "cards_cleared": report.counts.cards_cleared,
                "transactions_cleared": report.counts.transactions_cleared,
            })
        }
        IpcCommand::GetCompromisedPos => {
            let ranked = engine.compromised_pos()?;
            Value::Array(
                ranked
                    .iter()
                    .map(|r| json!({ "pos": r.pos_id, "connected_frauds": r.connected_frauds }))
                    .collect(),
            )
        }
        IpcCommand::GetFraudulentTransactions => {
            let frauds = engine.fraudulent_transactions()?;
            let txs: Vec<Value> = frauds.ids.iter().map(|id| json!({ "id": id })).collect();
            json!({ "duration": frauds.duration.as_secs_f64(), "fraudulent_txs": txs })
        }
        IpcCommand::GetPosGraph { pos } => serde_json::to_value(engine.pos_graph(pos)?)?,
        IpcCommand::LatestRun => serde_json::to_value(engine.latest_run()?)?,
        IpcCommand::Quit => Value::Null,
    };
    Ok(value)
}

fn print_summary(engine: &FraudEngine) -> Result<()> {
    let run = engine.latest_run()?;
    let frauds = engine.fraudulent_transactions()?;
    let ranked = engine.compromised_pos()?;

    println!("=== RUN SUMMARY ===");
    if let Some(run) = &run {
        println!("  run_id:           {}", run.run_id);
        println!("  started_at:       {}", run.started_at);
        println!("  duration:         {} ms", run.duration_ms);
        println!("  compromised POS:  {}", run.compromised_pos);
    }
    println!("  reported frauds:  {}", frauds.ids.len());

    println!();
    println!("=== SUSPICIOUS POS (top 10) ===");
    if ranked.is_empty() {
        println!("  (No POS connected to more than one fraud)");
    } else {
        for r in ranked.iter().take(10) {
            println!("  POS {:>6} | connected frauds: {}", r.pos_id, r.connected_frauds);
        }
    }
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
