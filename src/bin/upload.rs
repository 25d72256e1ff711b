//! Upload every allowed image in a directory to the configured storage and
//! print the public URLs.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use folio::{
    config::Config,
    config_path, init_tracing,
    storage::{content_type_for, create_storage, ObjectStorage, UploadPolicy},
};

#[derive(Parser)]
#[command(name = "folio-upload")]
#[command(about = "Upload a directory of images to the configured storage")]
#[command(version)]
struct Cli {
    /// Directory containing the images
    dir: PathBuf,

    /// Object path prefix, e.g. `projects/2024`
    #[arg(long)]
    prefix: Option<String>,

    /// Replace objects that already exist
    #[arg(long)]
    overwrite: bool,

    /// Config file (defaults to $FOLIO_CONFIG or config.yml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Uploaded(String),
    Exists,
    Skipped(String),
    Failed(String),
}

fn object_path(prefix: Option<&str>, file_name: &str) -> String {
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}/{}", prefix, file_name),
        None => file_name.to_string(),
    }
}

/// Regular files in `dir`, sorted by name
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn upload_file(
    storage: &dyn ObjectStorage,
    policy: &UploadPolicy,
    file: &Path,
    prefix: Option<&str>,
    overwrite: bool,
) -> Outcome {
    let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
        return Outcome::Skipped("file name is not valid UTF-8".to_string());
    };
    let content_type = content_type_for(name);
    if !policy.is_type_allowed(content_type) {
        return Outcome::Skipped(format!("{} is not an allowed type", content_type));
    }

    let bytes = match tokio::fs::read(file).await {
        Ok(bytes) => bytes,
        Err(e) => return Outcome::Failed(e.to_string()),
    };
    if let Err(reason) = policy.check(content_type, bytes.len() as u64) {
        return Outcome::Skipped(reason);
    }

    let path = object_path(prefix, name);
    match storage.upload(&path, &bytes, content_type, overwrite).await {
        Ok(stored) => Outcome::Uploaded(stored.url),
        Err(e) if e.is_collision() => Outcome::Exists,
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let path = cli.config.unwrap_or_else(config_path);
    let config = Config::load_with_env(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let storage = create_storage(&config.storage, &config.store)?;
    let policy = UploadPolicy::from_config(&config.storage);

    let mut failed = 0;
    for file in list_files(&cli.dir)? {
        let outcome = upload_file(storage.as_ref(), &policy, &file, cli.prefix.as_deref(), cli.overwrite).await;
        let name = file.display();
        match outcome {
            Outcome::Uploaded(url) => println!("{} -> {}", name, url),
            Outcome::Exists => println!("{}: already exists, skipped (use --overwrite)", name),
            Outcome::Skipped(reason) => println!("{}: skipped, {}", name, reason),
            Outcome::Failed(reason) => {
                failed += 1;
                eprintln!("{}: failed, {}", name, reason);
            }
        }
    }

    if failed > 0 {
        bail!("{} upload(s) failed", failed);
    }
    Ok(())
}
