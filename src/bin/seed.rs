//! Load content rows from a YAML or JSON file into the configured store.
//!
//! The file maps collection names to lists of rows:
//!
//! ```yaml
//! skills:
//!   - name: Rust
//!     icon: code
//!     display_order: 1
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use folio::{
    cache::create_cache, config::Config, config_path, init_tracing, models::Row,
    services::AdminService, store::create_store,
};

type SeedData = BTreeMap<String, Vec<Row>>;

#[derive(Parser)]
#[command(name = "folio-seed")]
#[command(about = "Create content rows from a YAML or JSON file")]
#[command(version)]
struct Cli {
    /// Seed file (.yml, .yaml or .json)
    file: PathBuf,

    /// Delete existing rows of every listed collection first
    #[arg(long)]
    replace: bool,

    /// Config file (defaults to $FOLIO_CONFIG or config.yml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    deleted: usize,
    created: usize,
    failed: usize,
}

fn parse_seed(path: &Path, contents: &str) -> Result<SeedData> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(contents).context("Invalid JSON seed file")
    } else {
        serde_yaml::from_str(contents).context("Invalid YAML seed file")
    }
}

async fn seed_collection(admin: &AdminService, collection: &str, rows: Vec<Row>, replace: bool) -> Summary {
    let mut summary = Summary::default();

    if replace {
        match admin.list(collection).await {
            Ok(existing) => {
                for item in existing {
                    match admin.delete(collection, &item.id).await {
                        Ok(()) => summary.deleted += 1,
                        Err(e) => {
                            summary.failed += 1;
                            eprintln!("  {} delete {}: {}", collection, item.id, e);
                        }
                    }
                }
            }
            Err(e) => {
                // without the old rows in hand, new ones would only pile up next to them
                summary.failed += 1;
                eprintln!("  {} list for replacement: {}", collection, e);
                return summary;
            }
        }
    }

    for (index, row) in rows.into_iter().enumerate() {
        match admin.create(collection, row).await {
            Ok(_) => summary.created += 1,
            Err(e) => {
                summary.failed += 1;
                eprintln!("  {}[{}]: {}", collection, index, e);
            }
        }
    }
    summary
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let path = cli.config.unwrap_or_else(config_path);
    let config = Config::load_with_env(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let contents = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let data = parse_seed(&cli.file, &contents)?;

    let store = create_store(&config.store).await?;
    let admin = AdminService::new(store, create_cache(&config.cache));

    let mut failed = 0;
    for (collection, rows) in data {
        let summary = seed_collection(&admin, &collection, rows, cli.replace).await;
        if cli.replace {
            println!(
                "{}: {} deleted, {} created, {} failed",
                collection, summary.deleted, summary.created, summary.failed
            );
        } else {
            println!("{}: {} created, {} failed", collection, summary.created, summary.failed);
        }
        failed += summary.failed;
    }

    if failed > 0 {
        bail!("{} row(s) failed", failed);
    }
    Ok(())
}
