//! `atlas relayout`: recompute the layout from the store alone.

use anyhow::Context as _;
use atlas_layout::{Engine, Layout};
use atlas_store::EmbeddingStore;
use clap::Args;
use tracing::{debug, info};

use super::{get_config, open_store, output_json, store_path};
use crate::Cli;

/// Recompute positions from stored embeddings and groups, without
/// regrouping.
#[derive(Args)]
pub struct RelayoutCommand {}

impl RelayoutCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let path = store_path(cli, &cfg).ok_or_else(|| {
            anyhow::anyhow!("relayout needs a store, use --store or set `store` in the config")
        })?;
        if !path.exists() {
            anyhow::bail!("store {} does not exist, run `atlas layout` first", path.display());
        }
        let store = open_store(Some(path.as_path()))?;
        let engine = Engine::new(cfg.layout.clone())?;

        let layout = relayout(&engine, store.as_ref())?;
        output_json(&layout, cli.output.as_deref())
    }
}

/// Runs the engine on the stored items covered by the stored grouping.
///
/// Only the batch of the last `atlas layout` run carries a group; older
/// items stay in the store for their embeddings but are left out here.
/// The stored grouping is already consolidated, so no merge happens unless
/// the group bounds were tightened since; in that case the new grouping is
/// written back.
pub(crate) fn relayout(engine: &Engine, store: &dyn EmbeddingStore) -> anyhow::Result<Layout> {
    let stored = store.items()?;
    if stored.is_empty() {
        anyhow::bail!("store is empty, run `atlas layout` first");
    }
    let grouping = store
        .grouping()?
        .ok_or_else(|| anyhow::anyhow!("store has no grouping, run `atlas layout` first"))?;

    let total = stored.len();
    let items: Vec<_> = stored
        .into_iter()
        .filter(|item| grouping.assignment.contains_key(&item.id))
        .collect();
    if items.is_empty() {
        anyhow::bail!("stored grouping covers no stored item, run `atlas layout` again");
    }
    debug!(
        items = items.len(),
        ungrouped = total - items.len(),
        "relayout: using grouped items"
    );

    let layout = engine
        .layout(&items, &grouping)
        .context("stored grouping does not match stored items, run `atlas layout` again")?;
    if !layout.merges.is_empty() {
        info!(merges = layout.merges.len(), "group bounds changed, updating stored grouping");
        store.put_grouping(&layout.grouping())?;
    }
    Ok(layout)
}
