//! Storebind CLI - inspect bindings against a store snapshot

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;

use storebind::{
    resolve_shape, BindError, BindingEvaluator, BindingSpec, FixSuggestion, MemoryStore,
    StorebindConfig, TypeDescriptor,
};

#[derive(Parser)]
#[command(name = "storebind")]
#[command(about = "Storebind - bind key/value store data to typed fields")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one key from a JSON store snapshot
    Resolve {
        /// Path to snapshot file ({"key": "text" | {"hash": ..} | {"set": ..} | {"zset": ..}})
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Store key to read
        #[arg(short, long)]
        key: String,

        /// Target type (e.g. "i64", "Option<bool>", "HashSet<String>")
        #[arg(short = 't', long = "type")]
        target: String,

        /// Bind absence as null
        #[arg(long, conflicts_with = "no_null")]
        allow_null: bool,

        /// Bind absence as the zero value
        #[arg(long)]
        no_null: bool,

        /// Default value as JSON, used when the key is absent
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Show how a target type is classified
    Shape {
        /// Target type (e.g. "HashMap<String, Vec<i32>>")
        descriptor: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            snapshot,
            key,
            target,
            allow_null,
            no_null,
            default,
        } => {
            let allow_null = match (allow_null, no_null) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            resolve_key(snapshot, key, &target, allow_null, default).await
        }
        Commands::Shape { descriptor } => show_shape(&descriptor),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn resolve_key(
    snapshot: PathBuf,
    key: String,
    target: &str,
    allow_null: Option<bool>,
    default: Option<String>,
) -> Result<(), BindError> {
    let config = StorebindConfig::load()?.with_env()?;
    let descriptor: TypeDescriptor = target.parse()?;
    let store = MemoryStore::load_snapshot(&snapshot)?;

    let mut builder = BindingSpec::builder("cli", "value", key, descriptor)
        .with_defaults(&config.bindings);
    if let Some(allow_null) = allow_null {
        builder = builder.allow_null(allow_null);
    }
    if let Some(default) = default {
        builder = builder.default_json(serde_json::from_str(&default)?);
    }
    let spec = builder.build()?;

    let evaluator = BindingEvaluator::new(Arc::new(store));
    let value = evaluator.resolve(&spec).await?;

    println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    Ok(())
}

fn show_shape(descriptor: &str) -> Result<(), BindError> {
    let descriptor: TypeDescriptor = descriptor.parse()?;
    let shape = resolve_shape(&descriptor)?;

    println!("{} {} → {:?}", "✓".green(), descriptor.to_string().cyan(), shape);
    println!("  Nullable: {}", shape.is_nullable());
    println!("  Zero value: {}", shape.zero_value().to_json());
    Ok(())
}
