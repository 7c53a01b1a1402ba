//! Utility functions for CLI commands.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use atlas_layout::{Item, Point};
use atlas_store::{EmbeddingStore, FileStore, MemoryStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Cli;
use crate::config::{AtlasConfig, load_config};

/// Gets the configuration for this invocation.
pub fn get_config(cli: &Cli) -> anyhow::Result<AtlasConfig> {
    load_config(cli.config.as_deref())
}

/// Store path from --store, falling back to the config file.
pub fn store_path(cli: &Cli, cfg: &AtlasConfig) -> Option<PathBuf> {
    cli.store
        .as_deref()
        .map(PathBuf::from)
        .or_else(|| cfg.store.clone())
}

/// Opens the file store at `path`, or an in-memory store without one.
pub fn open_store(path: Option<&Path>) -> anyhow::Result<Box<dyn EmbeddingStore>> {
    match path {
        Some(p) => {
            let store = FileStore::open(p)
                .with_context(|| format!("open store {}", p.display()))?;
            debug!(path = %store.path().display(), items = store.len()?, "opened store");
            Ok(Box::new(store))
        }
        None => {
            debug!("no store configured, keeping data in memory");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

/// One entry of the input file.
///
/// `embedding` and `hint` may be omitted for items that are already in the
/// store; their stored values are reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputItem {
    pub id: String,

    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<Point>,
}

/// Input file: a bare list or a document with an `items` key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InputFile {
    List(Vec<InputItem>),
    Document { items: Vec<InputItem> },
}

impl InputFile {
    pub fn into_items(self) -> Vec<InputItem> {
        match self {
            InputFile::List(items) | InputFile::Document { items } => items,
        }
    }
}

/// Loads a YAML or JSON file, chosen by extension.
pub fn load_request<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read input {path}"))?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");

    let result = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    Ok(result)
}

/// Requires input file to be provided.
pub fn require_input_file(cli: &Cli) -> anyhow::Result<&str> {
    cli.input
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("input file is required, use -f flag"))
}

/// Completes input items with stored embeddings and hints.
///
/// Items carrying their own embedding win over the store. A missing hint
/// falls back to the stored one, then to the origin.
pub fn resolve_items(
    inputs: &[InputItem],
    store: &dyn EmbeddingStore,
) -> anyhow::Result<Vec<Item>> {
    let ids: Vec<&str> = inputs.iter().map(|i| i.id.as_str()).collect();
    let fresh = store.missing(&ids)?.len();
    info!(
        items = inputs.len(),
        new = fresh,
        stored = inputs.len() - fresh,
        "input loaded"
    );

    let mut items = Vec::with_capacity(inputs.len());
    for input in inputs {
        let stored = if input.embedding.is_none() || input.hint.is_none() {
            store.get(&input.id)?
        } else {
            None
        };
        let embedding = match (&input.embedding, &stored) {
            (Some(e), _) => e.clone(),
            (None, Some(s)) => s.embedding.clone(),
            (None, None) => anyhow::bail!(
                "item {:?} has no embedding and none is stored",
                input.id
            ),
        };
        let hint = input
            .hint
            .or_else(|| stored.as_ref().map(|s| s.hint))
            .unwrap_or(Point::ORIGIN);
        items.push(Item::new(input.id.clone(), embedding, hint));
    }
    Ok(items)
}

/// Writes `value` as pretty JSON to `path`, or stdout without one.
pub fn output_json<T: Serialize>(value: &T, path: Option<&str>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            let file = File::create(p).with_context(|| format!("create output {p}"))?;
            let mut w = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut w, value)?;
            w.write_all(b"\n")?;
            w.flush()?;
            info!(path = p, "layout written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            serde_json::to_writer_pretty(&mut w, value)?;
            w.write_all(b"\n")?;
        }
    }
    Ok(())
}
