//! Metacontext CLI
//!
//! Loads a graph snapshot (JSON) into the in-memory store, attaches the
//! resolver and runs one operation against it:
//! - node details, classifications and relationships
//! - lineage context of a node, glossary fan-out included
//! - free-text search with per-hit context
//! - neighborhoods and linking paths
//! - finders by classification, property and value

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use metacontext_graph::{MatchCriteria, MemoryStore, Paging, Properties, PropertyValue, TextMatch};
use metacontext_resolver::{
    FailureDescriptor, FinderOptions, NeighborhoodRequest, RelationshipRequest, ResolverConfig,
    ResolverService, SearchParameters,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser)]
#[command(name = "metacontext")]
#[command(author, version, about = "Metacontext: lineage context over a metadata graph")]
struct Cli {
    /// Graph snapshot (JSON: types, nodes, edges).
    #[arg(short, long, global = true, env = "METACONTEXT_GRAPH")]
    graph: Option<PathBuf>,

    /// Resolver configuration (JSON); defaults apply to absent fields.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// User every store call is made as.
    #[arg(short, long, global = true, default_value = "admin")]
    user: String,

    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// More logging (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one node.
    Detail { id: String },

    /// List the classifications on a node.
    Classifications {
        id: String,
        /// Only this classification.
        #[arg(long)]
        name: Option<String>,
    },

    /// Resolve the lineage context of a node.
    Context { id: String },

    /// Free-text search; each hit carries its contexts.
    Search {
        criteria: String,
        /// Restrict to a type (and its subtypes). May be repeated.
        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<String>,
        /// Match whole property values.
        #[arg(long)]
        exact: bool,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// Page size; 0 means the configured maximum.
        #[arg(long, default_value_t = 0)]
        size: usize,
    },

    /// Nodes and edges within a number of hops.
    Neighborhood {
        id: String,
        #[arg(long, default_value_t = 1)]
        depth: u32,
        /// Admit only these node types beyond the origin. May be repeated.
        #[arg(long = "node-type", value_name = "TYPE")]
        node_types: Vec<String>,
        /// Follow only these edge types. May be repeated.
        #[arg(long = "edge-type", value_name = "TYPE")]
        edge_types: Vec<String>,
    },

    /// Shortest chain of edges between two nodes.
    Path { start: String, end: String },

    /// Relationships of a node, or between two nodes with `--other`.
    Relationships {
        id: String,
        #[arg(long = "type", value_name = "TYPE")]
        edge_type: Option<String>,
        #[arg(long)]
        other: Option<String>,
    },

    /// Nodes carrying a classification.
    Classified {
        name: String,
        #[arg(long = "type", value_name = "TYPE")]
        type_name: Option<String>,
    },

    /// Nodes whose property equals a value (qualified name by default).
    ByProperty {
        value: String,
        #[arg(long)]
        property: Option<String>,
        #[arg(long = "type", value_name = "TYPE")]
        type_name: Option<String>,
    },

    /// Nodes with any string property matching the text, without context.
    ByValue {
        text: String,
        #[arg(long = "type", value_name = "TYPE")]
        type_name: Option<String>,
        #[arg(long)]
        exact: bool,
        #[arg(long)]
        case_sensitive: bool,
    },

    /// List catalogued types, or show one.
    Types {
        name: Option<String>,
        /// List the type and its subtypes instead of its definition.
        #[arg(long, requires = "name")]
        subtypes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_service(cli: &Cli) -> Result<ResolverService<MemoryStore>> {
    let graph_path = cli
        .graph
        .as_deref()
        .context("no graph snapshot given (use --graph or METACONTEXT_GRAPH)")?;
    let store = load_store(graph_path)?;
    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ResolverConfig::from_json_str(&text)?
        }
        None => ResolverConfig::default(),
    };
    tracing::info!(
        graph = %graph_path.display(),
        nodes = store.node_count(),
        edges = store.edge_count(),
        "graph loaded"
    );
    let service = ResolverService::attach(Arc::new(store), config, &cli.user)?;
    Ok(service)
}

fn load_store(path: &Path) -> Result<MemoryStore> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading graph snapshot {}", path.display()))?;
    let store = MemoryStore::from_json_str(&text)
        .with_context(|| format!("loading graph snapshot {}", path.display()))?;
    Ok(store)
}

/// Print a result as JSON or text; a failure goes to stderr with exit code 1.
fn emit<T: Serialize>(
    json: bool,
    outcome: Result<T, FailureDescriptor>,
    text: impl FnOnce(&T),
) -> Result<ExitCode> {
    match outcome {
        Ok(value) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                text(&value);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            if json {
                eprintln!("{}", serde_json::to_string_pretty(&failure)?);
            } else {
                eprintln!("{} {failure}", "failed:".red().bold());
            }
            Ok(ExitCode::from(1))
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let service = load_service(cli)?;
    let user = cli.user.as_str();
    let json = cli.json;

    match &cli.command {
        Commands::Detail { id } => emit(json, service.node_details(user, id), render::node),
        Commands::Classifications { id, name } => emit(
            json,
            service.node_classifications(user, id, name.as_deref()),
            |list| render::classifications(list),
        ),
        Commands::Context { id } => emit(json, service.context(user, id), render::contextual),
        Commands::Search {
            criteria,
            types,
            exact,
            case_sensitive,
            start,
            size,
        } => {
            let params = SearchParameters {
                type_names: types.clone(),
                paging: Paging::new(*start, *size),
                case_sensitive: *case_sensitive,
                exact_match: *exact,
                ..SearchParameters::default()
            };
            emit(json, service.search(user, criteria, &params), |hits| {
                render::hits(hits)
            })
        }
        Commands::Neighborhood {
            id,
            depth,
            node_types,
            edge_types,
        } => {
            let request = NeighborhoodRequest {
                node_types: node_types.clone(),
                edge_types: edge_types.clone(),
                ..NeighborhoodRequest::new(id.as_str(), *depth)
            };
            emit(json, service.neighborhood(user, &request), render::subgraph)
        }
        Commands::Path { start, end } => emit(
            json,
            service.linking_path(user, start, end, None),
            render::subgraph,
        ),
        Commands::Relationships {
            id,
            edge_type,
            other,
        } => {
            let outcome = match other {
                Some(other) => service.relationships_between(user, id, other, edge_type.as_deref()),
                None => service.relationships(
                    user,
                    &RelationshipRequest {
                        node_id: id.clone(),
                        edge_type: edge_type.clone(),
                        ..RelationshipRequest::default()
                    },
                ),
            };
            emit(json, outcome, |list| render::edges(list))
        }
        Commands::Classified { name, type_name } => {
            let options = FinderOptions {
                type_name: type_name.clone(),
                ..FinderOptions::default()
            };
            emit(
                json,
                service.nodes_by_classification(
                    user,
                    name,
                    &Properties::new(),
                    MatchCriteria::All,
                    &options,
                ),
                |list| render::nodes(list),
            )
        }
        Commands::ByProperty {
            value,
            property,
            type_name,
        } => {
            let options = FinderOptions {
                type_name: type_name.clone(),
                ..FinderOptions::default()
            };
            emit(
                json,
                service.nodes_by_property(
                    user,
                    property.as_deref(),
                    PropertyValue::from(value.as_str()),
                    &options,
                ),
                |list| render::nodes(list),
            )
        }
        Commands::ByValue {
            text,
            type_name,
            exact,
            case_sensitive,
        } => {
            let options = FinderOptions {
                type_name: type_name.clone(),
                ..FinderOptions::default()
            };
            let matcher = TextMatch {
                pattern: text.clone(),
                case_sensitive: *case_sensitive,
                exact: *exact,
            };
            emit(
                json,
                service.nodes_by_property_value(user, &matcher, &options),
                |list| render::nodes(list),
            )
        }
        Commands::Types {
            name: Some(name),
            subtypes: false,
        } => emit(json, service.type_definition(user, name), render::type_def),
        Commands::Types { name, .. } => emit(
            json,
            service.supported_types(name.as_deref()),
            |names| render::type_names(names),
        ),
    }
}
