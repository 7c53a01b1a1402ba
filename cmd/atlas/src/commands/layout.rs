//! `atlas layout`: group, store and lay out a corpus.

use atlas_grouping::{
    Grouper, GroupingConfig, GroupingDriver, GroupingItem, GroupingRequest, LocalGrouper,
    RemoteGrouper,
};
use atlas_layout::{Engine, Layout};
use atlas_store::EmbeddingStore;
use clap::Args;
use tracing::{info, warn};

use super::{
    InputFile, InputItem, get_config, load_request, open_store, output_json, require_input_file,
    resolve_items, store_path,
};
use crate::Cli;
use crate::config::AtlasConfig;

/// Group the input items, persist them and write the layout.
#[derive(Args)]
pub struct LayoutCommand {
    /// Group locally even if a remote classifier is configured
    #[arg(long)]
    local: bool,

    /// Number of groups to ask the classifier for (default: layout.max_groups)
    #[arg(long)]
    groups: Option<usize>,
}

impl LayoutCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let path = require_input_file(cli)?;
        let inputs = load_request::<InputFile>(path)?.into_items();
        let store = open_store(store_path(cli, &cfg).as_deref())?;

        let remote = if self.local {
            None
        } else {
            remote_grouper(&cfg.grouping)?
        };
        let primary = remote.as_ref().map(|r| r as &dyn Grouper);

        let layout = run_pipeline(&cfg, &inputs, store.as_ref(), primary, self.groups).await?;
        output_json(&layout, cli.output.as_deref())
    }
}

/// Builds the remote grouper if one is configured and its key is set.
fn remote_grouper(cfg: &GroupingConfig) -> anyhow::Result<Option<RemoteGrouper>> {
    let Some(remote) = &cfg.remote else {
        return Ok(None);
    };
    match remote.api_key() {
        Some(key) => {
            info!(model = %remote.model, base_url = %remote.base_url, "using remote grouping");
            Ok(Some(RemoteGrouper::new(&key, remote)?))
        }
        None => {
            warn!(
                env = %remote.api_key_env,
                "remote grouping configured but API key is not set, grouping locally"
            );
            Ok(None)
        }
    }
}

/// Full pipeline: complete items from the store, persist them, resolve a
/// grouping, run the engine and write the consolidated grouping back.
///
/// Without a primary grouper the local clusterer is used directly.
pub(crate) async fn run_pipeline(
    cfg: &AtlasConfig,
    inputs: &[InputItem],
    store: &dyn EmbeddingStore,
    primary: Option<&dyn Grouper>,
    target_groups: Option<usize>,
) -> anyhow::Result<Layout> {
    if inputs.is_empty() {
        anyhow::bail!("input has no items");
    }
    let engine = Engine::new(cfg.layout.clone())?;

    let items = resolve_items(inputs, store)?;
    store.put_items(&items)?;

    let req = GroupingRequest::new(
        items
            .iter()
            .zip(inputs)
            .map(|(item, input)| GroupingItem {
                id: item.id.clone(),
                text: input.text.clone(),
                embedding: item.embedding.clone(),
            })
            .collect(),
        target_groups.unwrap_or(cfg.layout.max_groups),
    );

    let local = LocalGrouper::new(cfg.grouping.local.clone());
    let grouping = match primary {
        Some(primary) => {
            let resolved = GroupingDriver::new(cfg.grouping.retry.clone())
                .resolve(primary, &local, &req, cfg.layout.min_groups)
                .await?;
            resolved.grouping
        }
        None => {
            let grouping = local.group(&req).await?;
            if engine.needs_regroup(&grouping) {
                warn!(
                    groups = grouping.group_count(),
                    min_groups = cfg.layout.min_groups,
                    "local grouping found fewer groups than the minimum"
                );
            }
            grouping
        }
    };

    let layout = engine.layout(&items, &grouping)?;
    store.put_grouping(&layout.grouping())?;
    Ok(layout)
}
