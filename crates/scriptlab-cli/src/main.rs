//! `scriptlab` command line.
//!
//! Runs scripts in the sandbox, steps through a tutorial catalog
//! interactively, highlights scripts and verifies that a catalog's
//! tutorials produce their own expected output.

mod exit_codes;
mod logging;
mod tutor;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scriptlab_tutor::{
    execute_against, highlight, highlight_ansi, load_config, verify_catalog, CatalogProvider,
    CatalogStore, JsonFileProvider, LabConfig, RecordingSink, Sandbox, SampleProvider,
    TutorSession,
};
use std::io::Read;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "scriptlab.toml";

#[derive(Parser)]
#[command(name = "scriptlab", version, about = "Sandboxed script tutorials")]
struct Cli {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Override `sandbox.timeout_ms`.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Override `sandbox.step_limit`.
    #[arg(long, global = true)]
    step_limit: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script file (`-` reads stdin) and print its output.
    Run {
        file: PathBuf,
        /// Expected output; exit 1 when the output differs.
        #[arg(long)]
        expect: Option<String>,
        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Step through a tutorial catalog interactively.
    Tutor {
        /// JSON catalog; overrides `catalog.path`.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Print a highlighted script.
    Highlight {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Ansi)]
        format: Format,
    },
    /// Run every tutorial's code against its expected output.
    Check {
        /// JSON catalog; overrides `catalog.path`.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Ansi,
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::USAGE);
        }
    };

    match run(cli.command, &config) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::USAGE);
        }
    }
}

/// Load the config file and apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<LabConfig> {
    let mut config = load_config(&cli.config)
        .with_context(|| format!("load config {}", cli.config.display()))?;
    if let Some(timeout_ms) = cli.timeout_ms {
        config.sandbox.timeout_ms = timeout_ms;
    }
    if let Some(step_limit) = cli.step_limit {
        config.sandbox.step_limit = step_limit;
    }
    config.validate().context("invalid command-line override")?;
    Ok(config)
}

fn run(command: Command, config: &LabConfig) -> Result<i32> {
    let sandbox = Sandbox::new(config.sandbox_config());
    match command {
        Command::Run { file, expect, json } => {
            // An empty expectation means no check, as for tutorials.
            let expect = expect.as_deref().filter(|e| !e.is_empty());
            cmd_run(&sandbox, &file, expect, json)
        }
        Command::Tutor { catalog } => cmd_tutor(sandbox, config, catalog),
        Command::Highlight { file, format } => cmd_highlight(&file, format),
        Command::Check { catalog, json } => cmd_check(&sandbox, config, catalog, json),
    }
}

fn read_script(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut script = String::new();
        std::io::stdin()
            .read_to_string(&mut script)
            .context("read script from stdin")?;
        return Ok(script);
    }
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// The catalog named on the command line, else the configured one, else
/// the bundled sample.
fn catalog_provider(config: &LabConfig, flag: Option<PathBuf>) -> Box<dyn CatalogProvider> {
    match flag.or_else(|| config.catalog.path.clone()) {
        Some(path) => Box::new(JsonFileProvider::new(path)),
        None => Box::new(SampleProvider),
    }
}

fn cmd_run(sandbox: &Sandbox, file: &Path, expect: Option<&str>, json: bool) -> Result<i32> {
    let script = read_script(file)?;
    let result = execute_against(sandbox, &script, expect);
    tracing::debug!(steps = result.steps, outcome = ?result.outcome, "run finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&result).context("serialize result")?);
    } else if let Some(error) = &result.error_message {
        for line in &result.output_lines {
            println!("{line}");
        }
        eprintln!("{error}");
    } else {
        println!("{}", result.display_text());
    }

    let failed = !result.is_success() || (expect.is_some() && !result.matched_expected);
    if failed && !json && result.is_success() {
        eprintln!("output did not match the expected output");
    }
    Ok(if failed { exit_codes::FAILED } else { exit_codes::OK })
}

fn cmd_tutor(sandbox: Sandbox, config: &LabConfig, catalog: Option<PathBuf>) -> Result<i32> {
    let provider = catalog_provider(config, catalog);
    let mut session = TutorSession::load(sandbox, RecordingSink::new(), provider.as_ref());
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    tutor::repl(&mut session, stdin.lock(), stdout.lock())?;
    Ok(exit_codes::OK)
}

fn cmd_highlight(file: &Path, format: Format) -> Result<i32> {
    let script = read_script(file)?;
    let rendered = match format {
        Format::Html => highlight(&script),
        Format::Ansi => highlight_ansi(&script),
    };
    println!("{rendered}");
    Ok(exit_codes::OK)
}

fn cmd_check(
    sandbox: &Sandbox,
    config: &LabConfig,
    catalog: Option<PathBuf>,
    json: bool,
) -> Result<i32> {
    let provider = catalog_provider(config, catalog);
    let tutorials = provider
        .fetch_all()
        .with_context(|| format!("load catalog {}", provider.describe()))?;
    let store = CatalogStore::try_new(tutorials).context("invalid catalog")?;
    let summary = verify_catalog(&store, sandbox);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary).context("serialize summary")?);
    } else {
        print!("{summary}");
    }
    Ok(if summary.all_passed() {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}
