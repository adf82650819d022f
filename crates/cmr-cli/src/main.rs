//! `cmr-agent` command line
//!
//! Runs one pipeline invocation per call and prints the synthesis (or the
//! full state as JSON). Logs go to stderr, filtered by `CMR_AGENT_LOG`.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use cmr_agent::Pipeline;
use cmr_core::{AgentConfig, BoundingBox, QueryState, TemporalRange};
use tracing_subscriber::EnvFilter;

const DEFAULT_QUERY: &str = "Find precipitation datasets for Sub-Saharan Africa 2015-2023";
const LOG_ENV: &str = "CMR_AGENT_LOG";
const DEFAULT_LOG_FILTER: &str = "warn,cmr=info";

fn cli() -> Command {
    Command::new("cmr-agent")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Earth-science data discovery over the CMR catalog")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(std::path::PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("query")
                .about("Run a data-discovery query")
                .arg(
                    Arg::new("text")
                        .num_args(1..)
                        .help("Query text (defaults to a sample precipitation query)"),
                )
                .arg(
                    Arg::new("subquery")
                        .long("subquery")
                        .short('s')
                        .action(ArgAction::Append)
                        .help("Explicit sub-query; skips automatic decomposition"),
                )
                .arg(
                    Arg::new("temporal")
                        .long("temporal")
                        .value_parser(|s: &str| s.parse::<TemporalRange>().map_err(|e| e.to_string()))
                        .help("Temporal constraint `start,end` when the text names no years"),
                )
                .arg(
                    Arg::new("bbox")
                        .long("bbox")
                        .allow_hyphen_values(true)
                        .value_parser(|s: &str| s.parse::<BoundingBox>().map_err(|e| e.to_string()))
                        .help("Spatial constraint `west,south,east,north` when the text names no region"),
                )
                .arg(
                    Arg::new("provider")
                        .long("provider")
                        .help("Catalog provider filter (ALL disables it)"),
                )
                .arg(
                    Arg::new("base-url")
                        .long("base-url")
                        .help("Catalog root URL"),
                )
                .arg(
                    Arg::new("no-cache")
                        .long("no-cache")
                        .action(ArgAction::SetTrue)
                        .help("Disable the response cache"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the full query state as JSON"),
                ),
        )
        .subcommand(Command::new("show-config").about("Print the effective configuration as TOML"))
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<AgentConfig> {
    let config = match matches.get_one::<std::path::PathBuf>("config") {
        Some(path) => AgentConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AgentConfig::default(),
    };
    let config = config.with_env_overrides();
    tracing::debug!(
        base_url = %config.catalog.base_url,
        provider = ?config.catalog.provider_filter(),
        cache = config.cache.enabled,
        "configuration loaded"
    );
    Ok(config)
}

/// Apply `query` flags on top of the loaded configuration
fn apply_query_flags(mut config: AgentConfig, args: &ArgMatches) -> AgentConfig {
    if let Some(provider) = args.get_one::<String>("provider") {
        config = config.with_provider(provider);
    }
    if let Some(url) = args.get_one::<String>("base-url") {
        config = config.with_base_url(url);
    }
    if args.get_flag("no-cache") {
        config = config.without_cache();
    }
    config
}

fn query_state(args: &ArgMatches) -> QueryState {
    let text = args
        .get_many::<String>("text")
        .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_else(|| DEFAULT_QUERY.to_string());
    let subqueries = args
        .get_many::<String>("subquery")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    QueryState::new(text)
        .with_subqueries(subqueries)
        .with_constraints(
            args.get_one::<TemporalRange>("temporal").copied(),
            args.get_one::<BoundingBox>("bbox").copied(),
        )
}

async fn run_query(config: AgentConfig, args: &ArgMatches) -> Result<bool> {
    let config = apply_query_flags(config, args);
    let pipeline = Pipeline::builder()
        .with_config(config)
        .build()
        .context("building pipeline")?;

    let state = pipeline.run_with(query_state(args)).await;

    if args.get_flag("json") {
        let rendered = serde_json::to_string_pretty(&state).context("serializing query state")?;
        println!("{rendered}");
    } else {
        println!("{}", state.synthesis.as_deref().unwrap_or_default());
        println!();
        println!("run {} ({} stages)", state.run_id, state.stages.len());
    }
    Ok(state.validated)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("log-json"));
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("query", args)) => {
            let admitted = run_query(config, args).await?;
            if !admitted {
                std::process::exit(2);
            }
        }
        Some(("show-config", _)) => {
            let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
            print!("{rendered}");
        }
        _ => {
            cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
