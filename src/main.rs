use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kgrelations::kg::{self, relations};
use kgrelations::{dump_json, Config, JsonWriteOptions, KgSearchClient, SearchBackend};
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "kgrelations")]
#[command(about = "Look up entity labels and relation snippets via the Knowledge Graph Search API")]
struct Args {
    /// Write the result as JSON to this file instead of printing it
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every lookup for the configured demo entity (default)
    Demo,
    /// Label for each entity id (exact `@id` match)
    Label {
        #[arg(required = true)]
        entities: Vec<String>,
    },
    /// 1-hop or 2-hop relation snippets for an entity
    Relations {
        entity: String,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        hops: u8,
    },
    /// Freebase MID for a Wikipedia page id
    Mid { wiki_id: u64 },
    /// Raw search response
    Search {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// SPARQL query (not supported by the search API)
    Sparql { query: String },
}

/// Build the search client, reading the API key from the configured env var.
fn build_client(config: &Config) -> Result<KgSearchClient> {
    let api_key = config.api_key().map_err(|_| {
        anyhow::anyhow!(
            "Environment variable {} not set. Set it in your .env file or as an environment variable.",
            config.kgrelations.api_key_env
        )
    })?;

    Ok(KgSearchClient::from_config(config, api_key)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.kgrelations.log_level.as_str()),
    )
    .init();

    log::info!("Starting kgrelations v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Search endpoint: {}", config.endpoint());

    let client = build_client(&config)?;
    let output = args.output.as_deref();

    match args.command.unwrap_or(Command::Demo) {
        Command::Demo => run_demo(&client, &config, output).await?,
        Command::Label { entities } => {
            let labels = relations::get_entity_labels(&client, entities.as_slice()).await?;
            emit(output, &json!(labels))?;
        }
        Command::Relations { entity, hops } => {
            let result = if hops == 2 {
                let (one_hop, two_hop) = relations::get_two_hop_relations_concurrent(
                    &client,
                    &entity,
                    config.traversal.two_hop_concurrency,
                )
                .await?;
                json!({"entity": entity, "one_hop": one_hop, "two_hop": two_hop})
            } else {
                let one_hop = relations::get_one_hop_relations(&client, &entity).await?;
                json!({"entity": entity, "one_hop": one_hop})
            };
            emit(output, &result)?;
        }
        Command::Mid { wiki_id } => {
            let mid = relations::get_freebase_mid_from_wiki_id(&client, wiki_id).await?;
            emit(output, &json!({"wiki_id": wiki_id, "mid": mid}))?;
        }
        Command::Search { query, limit } => {
            let limit = limit.unwrap_or_else(|| client.default_limit());
            let body = client.search(&query, limit).await?;
            emit(output, &body)?;
        }
        Command::Sparql { query } => {
            let body = kg::execute_sparql(&client, &query)?;
            emit(output, &body)?;
        }
    }

    Ok(())
}

/// Print `value` as pretty JSON, or write it to `output` when given.
fn emit(output: Option<&Path>, value: &JsonValue) -> Result<()> {
    match output {
        Some(path) => {
            dump_json(value, path, JsonWriteOptions::default())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote result to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Label, in/out/1-hop/2-hop relations for the demo entity, then a MID lookup.
async fn run_demo(client: &KgSearchClient, config: &Config, output: Option<&Path>) -> Result<()> {
    let entity = config.demo.entity.as_str();
    let wiki_id = config.demo.wiki_id;

    let label = relations::get_label(client, entity).await?;
    let in_relations = relations::get_in_relations(client, entity).await?;
    let out_relations = relations::get_out_relations(client, entity).await?;
    let one_hop = relations::get_one_hop_relations(client, entity).await?;
    let (two_hop_first, two_hop) = relations::get_two_hop_relations_concurrent(
        client,
        entity,
        config.traversal.two_hop_concurrency,
    )
    .await?;
    let mid = relations::get_freebase_mid_from_wiki_id(client, wiki_id).await?;

    if output.is_some() {
        let report = json!({
            "entity": entity,
            "label": label,
            "in_relations": in_relations,
            "out_relations": out_relations,
            "one_hop": one_hop,
            "two_hop": {"one_hop": two_hop_first, "two_hop": two_hop},
            "freebase_mid": {"wiki_id": wiki_id, "mid": mid},
        });
        return emit(output, &report);
    }

    println!("Entity label:");
    println!("{:?}", label);

    println!("\nIn-relations:");
    println!("{:?}", in_relations);

    println!("\nOut-relations:");
    println!("{:?}", out_relations);

    println!("\n1-hop relations:");
    println!("{:?}", one_hop);

    println!("\n2-hop relations:");
    println!("1-hop: {:?}", two_hop_first);
    println!("2-hop: {:?}", two_hop);

    println!("\nFreebase MID for Wikipedia id {}:", wiki_id);
    println!("{}", mid);

    Ok(())
}
