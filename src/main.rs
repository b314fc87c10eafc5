//! `bplustree <FILE>`: run an instruction file against a fresh tree.
//!
//! Search results go to `output_file.txt` in the working directory; rejected
//! lines are reported on stderr. Set `RUST_LOG` for engine logs.

use std::env;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bplustree::command;
use bplustree::common::config::OUTPUT_FILENAME;

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let [_, input] = args.as_slice() else {
        eprintln!("Usage: bplustree FILENAME");
        return ExitCode::from(2);
    };

    match command::run_file(input, OUTPUT_FILENAME) {
        Ok(summary) => {
            info!(
                executed = summary.executed,
                rejected = summary.rejected,
                output = OUTPUT_FILENAME,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", input, e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
