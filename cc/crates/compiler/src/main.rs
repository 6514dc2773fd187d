use std::{
    io::Write,
    path::PathBuf,
    time::Instant,
};

use anyhow::{
    anyhow,
    Context,
    Result,
};
use ccgen_back::Emitter;
use clap::{
    Parser,
    ValueEnum,
};
use config::Config;
use tracing::{
    debug,
    info,
    Level,
};

mod config;

#[derive(Parser, Debug)]
#[clap(name = "ccgen")]
#[command(version, about)]
struct Args {
    /// The calling convention rules to compile
    #[arg(value_parser = valid_rule_file_extension)]
    rule_file: PathBuf,
    /// Where to write the generated fragment (stdout if absent)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Namespace of the entry point procedures
    #[arg(long)]
    namespace: Option<String>,
    /// Macro selecting the register tables
    #[arg(long)]
    guard: Option<String>,
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

fn valid_rule_file_extension(file_path: &str) -> Result<PathBuf, String> {
    let file_path = PathBuf::from(file_path);
    let extension = file_path.extension().ok_or("No file extension")?;
    if extension != "json" {
        return Err(format!(
            "Invalid file extension: {} (expected .json)",
            extension.to_string_lossy()
        ));
    }
    Ok(file_path)
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(Level::from(args.log_level))
        .with_writer(std::io::stderr)
        .init();

    let start = Instant::now();
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(namespace) = args.namespace {
        config.emitter.namespace = namespace;
    }
    if let Some(guard) = args.guard {
        config.emitter.guard = guard;
    }
    debug!("Took {:?} to load configuration", start.elapsed());

    let start = Instant::now();
    let file_contents = std::fs::read_to_string(&args.rule_file)
        .with_context(|| format!("Failed to read {}", args.rule_file.display()))?;
    let rules = ccgen_front::parse(&file_contents)
        .map_err(|e| anyhow!("Failed to parse rule file: {}", e))?;
    debug!("Took {:?} to parse rule file", start.elapsed());

    let start = Instant::now();
    let code = Emitter::new(&rules, config.emitter)
        .emit_to_string()
        .context("Failed to compile calling conventions")?;
    debug!("Took {:?} to emit calling conventions", start.elapsed());

    match &args.output {
        Some(path) => {
            std::fs::write(path, code)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => std::io::stdout().lock().write_all(code.as_bytes())?,
    }
    Ok(())
}
