//! CLI for the Sibyl forked-state call simulator.
//!
//! Pipeline: connect node -> fork block -> run one call -> print output.

use alloy_primitives::{Address, Bytes, U256};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sibyl_core::{SibylError, SibylResult};
use sibyl_provider::Blockchain;
use sibyl_simulator::Simulator;
use std::sync::Arc;
use std::time::Instant;

const DEFAULT_GAS: u64 = 30_000_000;

#[derive(Parser, Debug)]
#[command(name = "sibyl", version, about = "Forked-state EVM call simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the node's current head block.
    Head {
        #[arg(short, long, env = "SIBYL_RPC_URL")]
        rpc_url: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Execute a call against forked state. Changes are discarded on exit.
    Call {
        #[command(flatten)]
        call: CallArgs,

        /// Wei to transfer with the call.
        #[arg(long, default_value_t = U256::ZERO)]
        value: U256,
    },

    /// Execute a read-only call against forked state.
    StaticCall {
        #[command(flatten)]
        call: CallArgs,
    },
}

#[derive(Args, Debug)]
struct CallArgs {
    #[arg(short, long, env = "SIBYL_RPC_URL")]
    rpc_url: String,

    /// Block to fork; defaults to the chain head.
    #[arg(short, long)]
    block: Option<u64>,

    #[arg(long)]
    from: Address,

    #[arg(long)]
    to: Address,

    /// Hex-encoded calldata.
    #[arg(long, default_value = "0x")]
    data: Bytes,

    #[arg(long, default_value_t = DEFAULT_GAS)]
    gas: u64,

    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct CallReport {
    block: u64,
    from: Address,
    to: Address,
    value: U256,
    output: Bytes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Head { rpc_url, json } => {
            let sim = Arc::new(Simulator::connect(&rpc_url).await?);
            let head = blocking(move || sim.chain().head()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&head)?);
            } else {
                println!("{} {}", head.number, head.hash);
            }
        }
        Commands::Call { call, value } => run_call(call, Some(value)).await?,
        Commands::StaticCall { call } => run_call(call, None).await?,
    }

    Ok(())
}

/// Forks and runs one call. `value == None` selects a static call.
async fn run_call(args: CallArgs, value: Option<U256>) -> SibylResult<()> {
    let t0 = Instant::now();
    tracing::info!(rpc_url = %args.rpc_url, block = ?args.block, "starting simulation");

    let sim = Arc::new(Simulator::connect(&args.rpc_url).await?);

    let CallArgs {
        block,
        from,
        to,
        data,
        gas,
        json,
        ..
    } = args;

    let report = blocking(move || {
        let block = match block {
            Some(number) => {
                sim.fork(number)?;
                number
            }
            None => sim.fork_latest()?,
        };

        let output = match value {
            Some(value) => sim.call(from, to, data, gas, value)?,
            None => sim.static_call(from, to, data, gas)?,
        };

        Ok(CallReport {
            block,
            from,
            to,
            value: value.unwrap_or_default(),
            output,
        })
    })
    .await?;

    tracing::info!(
        block = report.block,
        output_len = report.output.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "simulation complete"
    );

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| SibylError::Internal(format!("Failed to render report: {e}")))?;
        println!("{rendered}");
    } else {
        println!("{}", report.output);
    }
    Ok(())
}

/// Runs simulator work on the blocking pool; node reads block on the runtime.
async fn blocking<T, F>(f: F) -> SibylResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> SibylResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SibylError::Internal(format!("spawn_blocking panicked: {e}")))?
}
