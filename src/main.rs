use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use taskmaster::{Config, LogWriter, Repl, Supervisor};

#[derive(Parser, Debug)]
#[command(name = "taskmaster", version, about = "Declarative Unix process supervisor")]
struct Args {
    /// Configuration file
    #[arg(
        short = 'f',
        long = "file",
        env = "TASKMASTER_CONFIG",
        value_name = "FILE"
    )]
    file: PathBuf,

    /// Log filter (tracing env-filter syntax, e.g. "info" or "taskmaster=debug")
    #[arg(long = "log", env = "TASKMASTER_LOG", value_name = "FILTER", default_value = "info")]
    log: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr: stdout belongs to the control shell.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(&args.file) {
        Ok(config) => config,
        Err(err) => {
            error!(label = err.as_label(), "cannot load configuration");
            eprintln!("taskmaster: {err}");
            return ExitCode::from(err.exit_code());
        }
    };

    let supervisor = Supervisor::new(config, vec![Arc::new(LogWriter)]);
    let repl = Repl::new(supervisor.handle());
    let shell = tokio::spawn(repl.run());

    match supervisor.run().await {
        Ok(()) => {
            let _ = shell.await;
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(label = err.as_label(), error = %err, "fatal supervisor error");
            ExitCode::from(3)
        }
    }
}
