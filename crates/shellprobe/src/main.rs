//! shellprobe CLI: run the built-in behavioral suite against a shell.
//!
//! Exit codes: 0 when every step passed, 1 when a step failed or the run
//! was aborted, 2 when the shell could not be started or the configuration
//! is invalid.

#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use shellprobe::{EnvConfig, ExpectError, ProbeConfig, Runner, shell_suite};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shellprobe", version, about = "Behavioral tests for an interactive shell over a PTY")]
struct Cli {
    /// Shell executable under test [default: ./build/shell]
    shell: Option<PathBuf>,

    /// Directory the shell runs in and where fixture files are created
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prompt regex used to synchronize steps [default: \$]
    #[arg(long)]
    prompt: Option<String>,

    /// Expect timeout in milliseconds [default: 3000]
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Show details for passing steps and debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut ProbeConfig) {
        if let Some(ref shell) = self.shell {
            config.shell.clone_from(shell);
        }
        if let Some(ref dir) = self.work_dir {
            config.work_dir = Some(dir.clone());
        }
        if let Some(ref prompt) = self.prompt {
            config.prompt.clone_from(prompt);
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "shellprobe=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("shellprobe: {e}");
            if matches!(e, ExpectError::Spawn(_) | ExpectError::Config { .. } | ExpectError::Regex(_)) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: &Cli) -> shellprobe::Result<ExitCode> {
    let mut config = ProbeConfig::layered(cli.config.as_deref(), &EnvConfig::default())?;
    cli.apply(&mut config);
    config.validate()?;

    let work_dir = config.resolved_work_dir()?;
    if !cli.json {
        println!("📂 Test working directory: {}\n", work_dir.display());
    }

    let scenario = shell_suite(&config, &work_dir)?;
    let report = Runner::new(scenario).run().await?;

    if cli.json {
        let json = report
            .to_json()
            .map_err(|e| ExpectError::io_context("serializing report", e.into()))?;
        println!("{json}");
    } else {
        print!("{}", report.render(cli.verbose));
    }

    Ok(if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
