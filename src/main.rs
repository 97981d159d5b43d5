use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use sheetform_verify::config::DEFAULT_TIMEOUT_MS;
use sheetform_verify::scenario::builtin;
use sheetform_verify::{RunnerConfig, Scenario, ScenarioRunner};

/// sheetform-verify: scripted UI checks for the import form, in headless Chrome
#[derive(Parser)]
#[command(name = "sheetform-verify", version, about)]
struct Cli {
    /// Run Chrome with a visible window (default: headless)
    #[arg(long, global = true)]
    headed: bool,

    /// Chrome/Chromium binary (default: auto-detect)
    #[arg(long, global = true)]
    chrome: Option<PathBuf>,

    /// Default timeout for waits and assertions
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Directory holding the pages under test
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,

    /// Write the screenshot here instead of the scenario's own path
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in scenarios
    List,
    /// Run built-in scenarios by name
    Run {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Run scenarios from YAML files
    RunFile {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    // Everything is resolved before a browser is launched.
    let scenarios: Vec<Scenario> = match &cli.command {
        Command::List => {
            for scenario in builtin::all() {
                println!("{:<18} {}", scenario.name, scenario.description);
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Run { names } => names
            .iter()
            .map(|name| builtin::find(name))
            .collect::<Result<_, _>>()?,
        Command::RunFile { files } => files
            .iter()
            .map(|file| Scenario::from_file(file))
            .collect::<Result<_, _>>()?,
    };

    if cli.out.is_some() && scenarios.len() > 1 {
        anyhow::bail!("--out can only be used with a single scenario");
    }

    let runner = ScenarioRunner::new(RunnerConfig {
        headless: !cli.headed,
        chrome_path: cli.chrome,
        timeout_ms: cli.timeout_ms,
        base_dir: cli.base_dir,
        screenshot_override: cli.out,
        ..Default::default()
    });

    let mut failures = 0;
    for scenario in &scenarios {
        let report = tokio::select! {
            report = runner.run(scenario) => report,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received interrupt signal, shutting down");
                return Ok(ExitCode::from(130));
            }
        };
        println!("{}", report.format_output());
        if !report.success() {
            failures += 1;
        }
    }

    tracing::info!(
        "{} scenario(s) run, {} failed",
        scenarios.len(),
        failures
    );
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
