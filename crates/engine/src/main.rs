//! Storydex - loads a story index and its JSON modules, then prints the v4
//! index payload, the extracted stories or the v3 stories payload.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::json;
use storydex_domain::{ProjectAnnotations, Render, StoryIndex};
use storydex_engine::{JsonDirModuleLoader, StoreSettings, StoryStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy)]
enum Output {
    Index,
    Extract,
    Legacy,
}

impl FromStr for Output {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "index" => Ok(Self::Index),
            "extract" => Ok(Self::Extract),
            "legacy" => Ok(Self::Legacy),
            other => anyhow::bail!("Unknown STORYDEX_OUTPUT '{other}': expected index, extract or legacy"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine; the environment may be set directly.
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storydex_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let index_path =
        PathBuf::from(std::env::var("STORYDEX_INDEX").unwrap_or_else(|_| "index.json".into()));
    let modules_dir = std::env::var("STORYDEX_MODULES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            index_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        });
    let output: Output = std::env::var("STORYDEX_OUTPUT")
        .unwrap_or_else(|_| "index".into())
        .parse()?;

    let mut project: ProjectAnnotations = match std::env::var("STORYDEX_PROJECT") {
        Ok(path) => read_json(Path::new(&path))?,
        Err(_) => ProjectAnnotations::default(),
    };
    // JSON modules cannot carry render functions; render to the resolved context.
    project.render.get_or_insert_with(|| {
        Render::new(|ctx| json!({ "id": ctx.id, "args": ctx.args, "globals": ctx.globals }))
    });

    let index: StoryIndex = read_json(&index_path)?;
    let settings = StoreSettings::from_env();
    tracing::info!(
        index = %index_path.display(),
        modules = %modules_dir.display(),
        batch_size = settings.batch_size.get(),
        "Starting Storydex"
    );

    let store = StoryStore::new(project, settings);
    store.initialize(index, Arc::new(JsonDirModuleLoader::new(modules_dir)))?;
    store
        .cache_all_modules()
        .await
        .context("Failed to load story modules")?;

    let payload = match output {
        Output::Index => serde_json::to_value(store.index_payload()?)?,
        Output::Extract => serde_json::to_value(store.extract(false)?)?,
        Output::Legacy => serde_json::to_value(store.stories_json_data()?)?,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
