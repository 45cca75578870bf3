use anyhow::Result;
use clap::{Parser, Subcommand};
use glyphcast_cli::{commands, ChannelModel};
use glyphcast_core::config::StreamConfigInput;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "glyphcast")]
#[command(about = "Glyphcast - Erasure-coded transport over a one-way optical channel", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML stream configuration; flags override its values
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file into a stream of symbols, one per line
    Send {
        /// Message file to send
        #[arg(short, long)]
        input: String,

        /// Output file for symbol lines
        #[arg(short, long)]
        output: String,

        /// Payload bytes per block
        #[arg(long)]
        block_size: Option<u32>,

        /// Milliseconds between symbols
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Number of symbols to produce (default: twice the source block count)
        #[arg(long)]
        count: Option<u64>,
    },

    /// Recover a file from scanned symbol lines
    Receive {
        /// Input file with one scanned symbol per line
        #[arg(short, long)]
        input: String,

        /// Output file for the recovered message
        #[arg(short, long)]
        output: String,

        /// Size of the message being received, in bytes
        #[arg(long)]
        message_size: Option<u32>,

        /// Payload bytes per block
        #[arg(long)]
        block_size: Option<u32>,

        /// Consecutive foreign frames before giving up (0 never gives up)
        #[arg(long)]
        mismatch_abort_threshold: Option<u32>,

        /// Show a spinner while ingesting
        #[arg(long)]
        progress: bool,
    },

    /// Send a message through a simulated lossy channel and receive it
    Simulate {
        /// Message file (default: random bytes)
        #[arg(short, long)]
        input: Option<String>,

        /// Size of the random message when no input is given
        #[arg(long, default_value = "65536")]
        size: usize,

        /// Payload bytes per block
        #[arg(long)]
        block_size: Option<u32>,

        /// Probability that a symbol is missed
        #[arg(long, default_value = "0.2")]
        loss: f64,

        /// Probability that a symbol is scanned twice
        #[arg(long, default_value = "0.1")]
        duplicate: f64,

        /// Probability that a scan is cut short
        #[arg(long, default_value = "0.02")]
        truncate: f64,

        /// Symbols held back and delivered out of order
        #[arg(long, default_value = "8")]
        reorder_window: usize,

        /// Channel RNG seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Give up after this many symbols
        #[arg(long, default_value = "100000")]
        max_symbols: u64,

        /// Output JSON file for the run report
        #[arg(short, long)]
        report: Option<String>,
    },

    /// List the frame headers carried by symbol lines
    Inspect {
        /// Input file with one symbol per line
        #[arg(short, long)]
        input: String,

        /// Output JSON file for frame headers
        #[arg(short, long)]
        output: Option<String>,

        /// Show statistics only
        #[arg(long)]
        stats_only: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = cli.config.as_deref();

    // Execute command
    match cli.command {
        Commands::Send {
            input,
            output,
            block_size,
            tick_ms,
            count,
        } => {
            let overrides = StreamConfigInput {
                block_size,
                tick_interval_ms: tick_ms,
                ..Default::default()
            };
            commands::send::execute(&input, &output, config, overrides, count).map(drop)
        }

        Commands::Receive {
            input,
            output,
            message_size,
            block_size,
            mismatch_abort_threshold,
            progress,
        } => {
            let overrides = StreamConfigInput {
                block_size,
                message_size,
                mismatch_abort_threshold,
                ..Default::default()
            };
            commands::receive::execute(&input, &output, config, overrides, progress).map(drop)
        }

        Commands::Simulate {
            input,
            size,
            block_size,
            loss,
            duplicate,
            truncate,
            reorder_window,
            seed,
            max_symbols,
            report,
        } => {
            let overrides = StreamConfigInput {
                block_size,
                ..Default::default()
            };
            let channel = ChannelModel {
                loss,
                duplicate,
                truncate,
                reorder_window,
                seed,
            };
            commands::simulate::execute(
                input.as_deref(),
                size,
                config,
                overrides,
                channel,
                max_symbols,
                report.as_deref(),
            )
            .map(drop)
        }

        Commands::Inspect {
            input,
            output,
            stats_only,
        } => commands::inspect::execute(&input, output.as_deref(), stats_only).map(drop),
    }
}
