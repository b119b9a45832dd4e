//! RecipeGuard CLI Entry Point
//!
//! Prevalidates every step of a recipe file and reports per-parameter
//! results.
//!
//! # Usage
//!
//! ```bash
//! # Prevalidate a recipe against the current directory
//! recipeguard recipe.yaml
//!
//! # Resolve paths under another directory
//! recipeguard recipe.yaml --root /data/build
//!
//! # Only prefixed strings are globs, machine-readable output
//! recipeguard recipe.yaml --explicit-globs --json
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use recipeguard::config::GlobConfig;
use recipeguard::recipe::parser::load_recipe;
use recipeguard::validation::batch::{default_workers, prevalidate_all, StepReport};
use recipeguard::validation::PhaseController;
use recipeguard::{APP_NAME, VERSION};

/// Default recipe file used when none is specified.
const DEFAULT_RECIPE: &str = "recipe.yaml";

/// Prefix token override requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PrefixOverride {
    Token(String),
    Disabled,
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    recipe_path: String,
    root: Option<PathBuf>,
    workers: usize,
    prefix: Option<PrefixOverride>,
    explicit_globs: bool,
    json: bool,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recipe_path: DEFAULT_RECIPE.to_string(),
            root: None,
            workers: default_workers(),
            prefix: None,
            explicit_globs: false,
            json: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Applies command-line overrides to the environment defaults.
    fn glob_config(&self) -> GlobConfig {
        let mut glob_config = GlobConfig::from_env();
        match &self.prefix {
            Some(PrefixOverride::Token(token)) => glob_config = glob_config.with_prefix(token.clone()),
            Some(PrefixOverride::Disabled) => glob_config = glob_config.without_prefix(),
            None => {}
        }
        if self.explicit_globs {
            glob_config.implicit_globs = false;
        }
        glob_config
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Glob-Aware Step Parameter Validation");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: recipeguard [OPTIONS] <RECIPE_FILE>");
    println!();
    println!("Arguments:");
    println!("  <RECIPE_FILE>       Path to recipe YAML file");
    println!();
    println!("Options:");
    println!("  --root DIR          Resolve relative paths under DIR (default: current directory)");
    println!("  --workers N         Steps validated concurrently (default: {})", default_workers());
    println!("  --prefix TOKEN      Prefix marking explicit globs (default: glob:)");
    println!("  --no-prefix         Disable the prefix convention");
    println!("  --explicit-globs    Only prefixed strings are globs");
    println!("  --json              Print the report as JSON");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  recipeguard recipe.yaml");
    println!("  recipeguard recipe.yaml --root /data/build --workers 8");
    println!("  recipeguard recipe.yaml --prefix pattern: --explicit-globs");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_index = 0;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--json" => {
                config.json = true;
            }
            "--explicit-globs" => {
                config.explicit_globs = true;
            }
            "--no-prefix" => {
                config.prefix = Some(PrefixOverride::Disabled);
            }
            "--prefix" => {
                i += 1;
                if i >= args.len() || args[i].is_empty() {
                    return Err("--prefix requires a token argument".to_string());
                }
                config.prefix = Some(PrefixOverride::Token(args[i].clone()));
            }
            "--root" => {
                i += 1;
                if i >= args.len() {
                    return Err("--root requires a path argument".to_string());
                }
                config.root = Some(PathBuf::from(&args[i]));
            }
            "--workers" => {
                i += 1;
                if i >= args.len() {
                    return Err("--workers requires a number argument".to_string());
                }
                config.workers = match args[i].parse() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(format!("Invalid workers value: {}", args[i])),
                };
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                match positional_index {
                    0 => config.recipe_path = arg.clone(),
                    _ => return Err(format!("Unexpected argument: {}", arg)),
                }
                positional_index += 1;
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Resolves the directory relative paths are validated against.
fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = match root {
        Some(dir) => dir,
        None => env::current_dir()?,
    };

    if !dir.exists() {
        return Err(format!("Root directory does not exist: {}", dir.display()).into());
    }

    if !dir.is_dir() {
        return Err(format!("Path is not a directory: {}", dir.display()).into());
    }

    info!("Root directory: {}", dir.display());
    Ok(dir)
}

/// Prints a colored per-parameter report.
fn print_report(reports: &[StepReport]) {
    for report in reports {
        match &report.result {
            Ok(result) => {
                let status = if result.passed() {
                    "PASS".green().bold()
                } else {
                    "FAIL".red().bold()
                };
                println!("{} {}", status, report.step.bold());

                for outcome in &result.parameters {
                    let marker = if outcome.passed { "ok".green() } else { "!!".red() };
                    let source = if outcome.from_glob { " (glob)" } else { "" };
                    println!(
                        "    {} {} {}{}: {}",
                        marker,
                        outcome.direction,
                        outcome.name,
                        source.dimmed(),
                        outcome.resolved_value.join(", ")
                    );
                    if let Some(err) = &outcome.error {
                        println!("       {}", err.to_string().yellow());
                    }
                }
            }
            Err(e) => {
                println!("{} {}", "ERROR".red().bold(), report.step.bold());
                println!("       {}", e.to_string().yellow());
            }
        }
    }
}

/// Serializes the report as JSON.
fn json_report(reports: &[StepReport]) -> serde_json::Value {
    let steps: Vec<serde_json::Value> = reports
        .iter()
        .map(|report| match &report.result {
            Ok(result) => serde_json::json!({
                "step": report.step,
                "passed": result.passed(),
                "result": result,
            }),
            Err(e) => serde_json::json!({
                "step": report.step,
                "passed": false,
                "error": e.to_string(),
            }),
        })
        .collect();

    serde_json::json!({
        "passed": reports.iter().all(StepReport::passed),
        "steps": steps,
    })
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    if !config.json {
        print_banner();
    }

    let root = resolve_root(config.root.clone())?;
    let glob_config = config.glob_config();

    info!("Loading recipe: {}", config.recipe_path);
    let mut recipe = load_recipe(&config.recipe_path).map_err(|e| {
        error!("Failed to load recipe: {}", e);
        format!("Could not load recipe from '{}': {}", config.recipe_path, e)
    })?;

    let controller = PhaseController::new(root, glob_config);
    recipe.declare_all(controller.marker())?;

    let reports = prevalidate_all(&controller, &mut recipe.steps, config.workers);

    if config.json {
        println!("{}", serde_json::to_string_pretty(&json_report(&reports))?);
    } else {
        print_report(&reports);
        println!();
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    if failed > 0 {
        return Err(format!(
            "{} of {} step(s) failed prevalidation",
            failed,
            reports.len()
        )
        .into());
    }

    info!("All {} step(s) passed prevalidation", reports.len());
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
