use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use dep_compat::analysis::{analyze, load_graph};
use dep_compat::config::{Config, db_path};
use dep_compat::ecosystem::{Ecosystem, NpmEcosystem, detect_ecosystem, fetch_entries};
use dep_compat::graph::{DEFAULT_MAX_DEPTH, ROOT};
use dep_compat::logging::init_logging;
use dep_compat::output::{render_entry, render_json, render_paths, render_terminal};
use dep_compat::runtime::Runtime;
use dep_compat::version::cache::Cache;
use dep_compat::version::registries::NpmRegistry;

#[derive(Parser)]
#[command(name = "dep-compat")]
#[command(version, about = "Dependency compatibility checker for npm projects")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file (defaults to .dep-compat.json in the project)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check a project for compatibility issues (default)
    Check(CheckArgs),

    /// Show how a package ends up in the dependency tree
    Paths {
        package: String,

        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Look packages up in the registry
    Info {
        #[arg(required = true)]
        packages: Vec<String>,

        /// Ignore cached registry entries
        #[arg(long)]
        refresh: bool,
    },

    /// Remove every cached registry entry
    ClearCache,
}

#[derive(Args)]
struct CheckArgs {
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Rules file to use instead of the built-in rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Node.js version to check against instead of `node --version`
    #[arg(long)]
    node_version: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Terminal)]
    format: OutputFormat,

    /// Fail on warnings as well as errors
    #[arg(long)]
    strict: bool,
}

impl Default for CheckArgs {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            rules: None,
            node_version: None,
            format: OutputFormat::Terminal,
            strict: false,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Terminal,
    Json,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_json);

    match cli.command.unwrap_or_else(|| Command::Check(CheckArgs::default())) {
        Command::Check(args) => run_check(args, cli.config.as_deref()),
        Command::Paths {
            package,
            path,
            max_depth,
        } => run_paths(&package, &path, max_depth),
        Command::Info { packages, refresh } => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run_info(&packages, refresh, cli.config.as_deref())),
        Command::ClearCache => run_clear_cache(),
    }
}

/// Registry-backed npm ecosystem configured from `config`
fn npm_ecosystem(config: &Config) -> anyhow::Result<NpmEcosystem> {
    let ecosystem = if config.registry.enabled {
        let registry = NpmRegistry::new(&config.registry.url)
            .context("Failed to create npm registry client")?;
        NpmEcosystem::new(Arc::new(registry))
    } else {
        NpmEcosystem::offline()
    };

    if !config.cache.enabled {
        return Ok(ecosystem);
    }
    match Cache::new(&db_path()) {
        Ok(cache) => Ok(ecosystem.with_cache(Arc::new(cache), config.cache.ttl_ms)),
        Err(e) => {
            warn!("Registry cache unavailable: {}", e);
            Ok(ecosystem)
        }
    }
}

fn detect(project_dir: &Path, npm: NpmEcosystem) -> anyhow::Result<Arc<dyn Ecosystem>> {
    let ecosystems: Vec<Arc<dyn Ecosystem>> = vec![Arc::new(npm)];
    match detect_ecosystem(project_dir, &ecosystems) {
        Some(ecosystem) => Ok(ecosystem),
        None => bail!("No supported project found in {}", project_dir.display()),
    }
}

fn run_check(args: CheckArgs, config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    let config = Config::load(&args.path, config_path)?;
    let rules_path = args.rules.or_else(|| config.resolved_rules_path());
    // Checks never hit the registry
    let ecosystem = detect(&args.path, NpmEcosystem::offline().with_rules_path(rules_path))?;

    let rules = ecosystem.load_rules()?;
    let runtime = match args.node_version.or(config.node_version) {
        Some(version) => Runtime::from_version(&version),
        None => Runtime::detect(),
    };

    let analysis = analyze(ecosystem.as_ref(), &args.path, &rules, &runtime)
        .with_context(|| format!("Failed to analyze {}", args.path.display()))?;
    let stats = analysis.graph.get_stats();

    match args.format {
        OutputFormat::Terminal => print!("{}", render_terminal(&analysis.report, &stats)),
        OutputFormat::Json => println!("{}", render_json(&analysis.report, &stats)?),
    }

    let failed =
        analysis.report.has_errors() || (args.strict && analysis.report.has_warnings());
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_paths(package: &str, project_dir: &Path, max_depth: usize) -> anyhow::Result<ExitCode> {
    let ecosystem = detect(project_dir, NpmEcosystem::offline())?;
    let (_, graph) = load_graph(ecosystem.as_ref(), project_dir)
        .with_context(|| format!("Failed to read {}", project_dir.display()))?;

    if !graph.contains(package) {
        println!("{} is not installed", package);
        return Ok(ExitCode::FAILURE);
    }

    let paths = graph.find_paths(ROOT, package, max_depth);
    let dependents = graph.get_dependents(package);
    print!("{}", render_paths(package, &paths, &dependents));
    Ok(ExitCode::SUCCESS)
}

async fn run_info(
    packages: &[String],
    refresh: bool,
    config_path: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = Config::load(&cwd, config_path)?;
    let ecosystem = npm_ecosystem(&config)?.with_force_refresh(refresh);

    let mut failed = false;
    for (name, result) in fetch_entries(&ecosystem, packages).await {
        match result {
            Ok(entry) => print!("{}", render_entry(&entry)),
            Err(e) => {
                eprintln!("{}: {}", name, e);
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_clear_cache() -> anyhow::Result<ExitCode> {
    let path = db_path();
    if !path.exists() {
        info!("No registry cache at {}", path.display());
        println!("Cache is empty");
        return Ok(ExitCode::SUCCESS);
    }

    let cache = Cache::new(&path)
        .with_context(|| format!("Failed to open cache at {}", path.display()))?;
    let removed = cache.clear()?;
    println!("Removed {} cached registry entries", removed);
    Ok(ExitCode::SUCCESS)
}
