//! CLI entrypoint for colloquy.
//!
//! Wires the layers together: loads configuration, builds the agents and
//! the structure, injects the provider adapter, runs the deliberation and
//! prints the result.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colloquy_application::{CompletionGateway, Structure};
use colloquy_infrastructure::config::FileAgentConfig;
use colloquy_infrastructure::{ConfigLoader, FileConfig, OpenAiGateway};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Every agent turn plus the final response
    Full,
    /// Only the final response (or all responses without a moderator)
    Final,
    /// Structure snapshot as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "colloquy", version, about = "Multi-agent deliberation runner")]
struct Cli {
    /// Task to deliberate on (overrides the config file's task)
    task: Option<String>,

    /// Path to a config file (merged over project and global configs)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore all config files and use defaults
    #[arg(long)]
    no_config: bool,

    /// Topology: ensemble, chain, debate or graph
    #[arg(short, long)]
    topology: Option<String>,

    /// Number of cycles to run
    #[arg(long)]
    cycles: Option<usize>,

    /// Limit each turn's context to the N most recent responses
    #[arg(long)]
    last_n: Option<usize>,

    /// Randomize chain order each cycle
    #[arg(long)]
    shuffle: bool,

    /// Add an agent with this persona (repeatable)
    #[arg(short = 'a', long = "agent")]
    agents: Vec<String>,

    /// Model for agents added with --agent
    #[arg(short, long)]
    model: Option<String>,

    /// Enable a moderator that synthesizes the final response
    #[arg(long)]
    moderator: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Full)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Fold CLI flags into the loaded file configuration.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(task) = &cli.task {
        config.deliberation.task = Some(task.clone());
    }
    if let Some(topology) = &cli.topology {
        config.deliberation.topology = topology.clone();
    }
    if let Some(cycles) = cli.cycles {
        config.deliberation.cycles = cycles;
    }
    if let Some(last_n) = cli.last_n {
        config.deliberation.last_n = Some(last_n);
    }
    if cli.shuffle {
        config.deliberation.shuffle = true;
    }
    if cli.moderator {
        config.moderator.enabled = true;
    }
    for persona in &cli.agents {
        config.agents.push(FileAgentConfig {
            persona: Some(persona.clone()),
            model: cli.model.clone(),
            ..Default::default()
        });
    }
}

fn print_result(structure: &Structure, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Full => {
            for record in structure.history().records() {
                println!("[{}]", record.agent);
                println!("{}", record.response);
                println!();
            }
            if let Some(final_response) = structure.final_response() {
                println!("[moderator]");
                println!("{final_response}");
            }
        }
        OutputFormat::Final => match structure.final_response() {
            Some(final_response) => println!("{final_response}"),
            None => {
                for response in structure.responses() {
                    println!("{response}");
                }
            }
        },
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&structure.info())?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?
    };
    apply_overrides(&mut config, &cli);

    if config.agents.is_empty() {
        bail!("No agents configured. Add [[agents]] to the config file or pass --agent.");
    }
    if config.deliberation.task.is_none() && config.agents.iter().all(|a| a.task.is_none()) {
        bail!("No task given. Pass one as an argument or set it in the config file.");
    }

    let registry = config.registry();
    let api_key = config.provider.resolve_api_key()?;
    let gateway: Arc<dyn CompletionGateway> = Arc::new(OpenAiGateway::with_timeout(
        &config.provider.base_url,
        api_key,
        Duration::from_secs(config.provider.timeout_secs),
    )?);

    info!(
        topology = %config.deliberation.topology,
        agents = config.agents.len(),
        "starting colloquy"
    );

    let mut builder = Structure::builder(config.deliberation.to_topology()?)
        .cycles(config.deliberation.cycles)
        .shuffle(config.deliberation.shuffle);
    if let Some(task) = &config.deliberation.task {
        builder = builder.task(task);
    }
    if let Some(last_n) = config.deliberation.last_n {
        builder = builder.last_n(last_n);
    }
    if let Some(instructions) = &config.deliberation.combination_instructions {
        builder = builder.combination_instructions(instructions);
    }
    for agent in &config.agents {
        builder = builder.agent(agent.to_spec(&registry)?);
    }
    if let Some(moderator_builder) = config.moderator.to_builder()? {
        builder = builder.moderator(moderator_builder.build(&registry, Arc::clone(&gateway))?);
    }

    let mut structure = builder.build(&registry, gateway)?;
    structure.process().await?;

    print_result(&structure, cli.output)
}
