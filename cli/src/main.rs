use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use metafile_db::{DescriptorCache, ToolConfig};
use rayon::prelude::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "METAFILE_LOG";

/// Output format for `show`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "metafile")]
#[command(about = "Validate and query package metafiles")]
struct Cli {
    /// Tool configuration YAML file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log cache and loader activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate one or more metafiles.
    Validate(ValidateArgs),
    /// Print a validated metafile.
    Show(ShowArgs),
    /// List a package's requirements, one per line.
    Requires(RequiresArgs),
    /// List a package's build variants, one per line.
    Variants(PathArgs),
    /// Print a package's setup commands with placeholders substituted.
    Commands(CommandsArgs),
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Metafile paths.
    #[arg(required = true)]
    paths: Vec<String>,
}

#[derive(Debug, Args)]
struct PathArgs {
    /// Metafile path.
    path: String,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Metafile path.
    path: String,
    /// Output format.
    #[arg(long, default_value = "yaml")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct RequiresArgs {
    /// Metafile path.
    path: String,
    /// Include build requirements, listed first.
    #[arg(long)]
    build: bool,
    /// Runtime requirements only, even if the config merges by default.
    #[arg(long, conflicts_with = "build")]
    runtime_only: bool,
}

#[derive(Debug, Args)]
struct CommandsArgs {
    /// Metafile path.
    path: String,
    /// Package version for !VERSION!, !MAJOR_VERSION! and !MINOR_VERSION!.
    #[arg(long, required_unless_present = "raw")]
    version: Option<String>,
    /// Value for !BASE!.
    #[arg(long, default_value = "")]
    base: String,
    /// Value for !ROOT!.
    #[arg(long, default_value = "")]
    root: String,
    /// Value for !USER!, overriding the environment.
    #[arg(long)]
    user: Option<String>,
    /// Print the templates without substitution.
    #[arg(long)]
    raw: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        let cache = DescriptorCache::new();
        match cli.command {
            Command::Validate(args) => run_validate(&cache, args),
            Command::Show(args) => run_show(&cache, args),
            Command::Requires(args) => run_requires(&cache, &config, args),
            Command::Variants(args) => run_variants(&cache, args),
            Command::Commands(args) => run_commands(&cache, &config, args),
        }
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ToolConfig, String> {
    let Some(path) = path else {
        return Ok(ToolConfig::default());
    };
    let config = ToolConfig::load(path)
        .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;
    debug!(path = %path.display(), ?config, "Loaded tool config");
    Ok(config)
}

fn run_validate(cache: &DescriptorCache, args: ValidateArgs) -> Result<(), String> {
    let failures: Vec<String> = args
        .paths
        .par_iter()
        .filter_map(|path| cache.get_or_load(path).err().map(|err| err.to_string()))
        .collect();

    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("{failure}");
        }
        return Err(format!(
            "{} of {} package metafile(s) failed validation",
            failures.len(),
            args.paths.len()
        ));
    }

    println!("Validated {} package metafile(s).", args.paths.len());
    Ok(())
}

fn run_show(cache: &DescriptorCache, args: ShowArgs) -> Result<(), String> {
    let descriptor = cache.get_or_load(&args.path).map_err(|e| e.to_string())?;
    let raw = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(descriptor.as_ref())
            .map_err(|err| format!("Failed to serialize metafile: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(descriptor.as_ref())
            .map_err(|err| format!("Failed to serialize metafile: {err}"))?,
    };
    println!("{}", raw.trim_end());
    Ok(())
}

fn run_requires(
    cache: &DescriptorCache,
    config: &ToolConfig,
    args: RequiresArgs,
) -> Result<(), String> {
    let descriptor = cache.get_or_load(&args.path).map_err(|e| e.to_string())?;
    let include_build = args.build || (config.include_build_requires && !args.runtime_only);
    for requirement in descriptor.requires(include_build).unwrap_or_default() {
        println!("{requirement}");
    }
    Ok(())
}

fn run_variants(cache: &DescriptorCache, args: PathArgs) -> Result<(), String> {
    let descriptor = cache.get_or_load(&args.path).map_err(|e| e.to_string())?;
    for variant in descriptor.variants().unwrap_or_default() {
        println!("{}", variant.join(" "));
    }
    Ok(())
}

fn run_commands(
    cache: &DescriptorCache,
    config: &ToolConfig,
    args: CommandsArgs,
) -> Result<(), String> {
    let descriptor = cache.get_or_load(&args.path).map_err(|e| e.to_string())?;

    let commands = if args.raw {
        descriptor.commands().map(<[String]>::to_vec)
    } else {
        let version = args.version.as_deref().unwrap_or_default();
        let mut context = config.command_context(version, &args.base, &args.root);
        if args.user.is_some() {
            context = context.with_user(args.user);
        }
        descriptor.render_commands(&context)
    };

    for command in commands.unwrap_or_default() {
        println!("{command}");
    }
    Ok(())
}
