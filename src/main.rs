use clap::{Parser, Subcommand};
use ruleset_docs::config::{self, DocsConfig};
use ruleset_docs::convert::RulesetConverter;
use ruleset_docs::output;
use ruleset_docs::pipeline::{self, Engines};
use ruleset_docs::scan::{self, RulesetFilter};
use ruleset_docs::site::SiteGenerator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    if env!("ON_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("GIT_HASH") {
        "" => "dev@unknown",
        // Leaked once at startup
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "ruleset-docs")]
#[command(about = "Generate documentation pages from rule-set XML files")]
#[command(long_about = "\
Generate documentation pages from rule-set XML files

Every rule-set file under the rules directory becomes a Markdown page named
after its directory and file stem. The rule-sets are then merged into one
file, an index page is generated from it, and a menu listing every rule-set
is added to the site descriptor.

Layout:

  rulesets/
  ├── basic/
  │   ├── Braces.xml       → <target>/basic/Braces.md
  │   └── EmptyRules.xml   → <target>/basic/EmptyRules.md
  └── design/
      └── Design.xml       → <target>/design/Design.md

  <target>/index.md                 index of every rule and rule-set
  <target>/../mergedruleset.xml     all rule-sets in one document
  src/site/site.xml                 site.pre.xml plus the rule-set menu

Set RUST_LOG=ruleset_docs=debug (or pass -v) for per-file progress.

Run 'ruleset-docs gen-config' to generate a documented ruleset-docs.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file; stock defaults apply when it does not exist
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Rules directory (overrides the config file)
    #[arg(long, global = true)]
    rules_dir: Option<PathBuf>,

    /// Target directory for pages (overrides the config file)
    #[arg(long, global = true)]
    target_dir: Option<PathBuf>,

    /// Log per-file progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the rule-sets that would be converted
    Scan {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert every rule-set into a documentation page
    Convert,
    /// Write the merged rule-set, the index and the site menu
    Site,
    /// Run the full pipeline: convert → merge → index → menu
    Build,
    /// Print a stock ruleset-docs.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Scan { json } => {
            let config = load_config(&cli)?;
            let root = scan::check_root(&config.rules_dir)?;
            let entries = scan::scan_rulesets(&root, &RulesetFilter::new(&config.filter))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                output::print_scan_output(&entries, &root);
            }
        }
        Command::Convert => {
            let config = load_config(&cli)?;
            let engines = Engines::from_config(&config)?;
            let report = RulesetConverter::new(
                &config,
                engines.transformer.as_ref(),
                engines.analyzer.as_ref(),
            )
            .convert_rulesets()?;
            output::print_convert_output(&report);
        }
        Command::Site => {
            let config = load_config(&cli)?;
            let engines = Engines::from_config(&config)?;
            let report = SiteGenerator::new(&config, engines.transformer.as_ref()).run()?;
            output::print_site_output(&report);
        }
        Command::Build => {
            let config = load_config(&cli)?;
            let engines = Engines::from_config(&config)?;
            println!("==> Building from {}", config.rules_dir.display());
            let report = pipeline::build(
                &config,
                engines.transformer.as_ref(),
                engines.analyzer.as_ref(),
            )?;
            output::print_convert_output(&report.convert);
            println!();
            output::print_site_output(&report.site);
            println!("==> Build complete: {}", config.target_dir.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Stock defaults, then the config file, then path flags.
fn load_config(cli: &Cli) -> Result<DocsConfig, config::ConfigError> {
    let overrides = config::path_overrides(cli.rules_dir.as_deref(), cli.target_dir.as_deref());
    config::load_config_with(&cli.config, overrides)
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "ruleset_docs=debug"
    } else {
        "ruleset_docs=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
