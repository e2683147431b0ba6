//! List stored session snapshots.

use recompose_common::config::AppConfig;
use recompose_store::{SnapshotKind, SnapshotStore};

pub fn run(versions: bool, config: &AppConfig) -> anyhow::Result<()> {
    let kind = if versions {
        SnapshotKind::Version
    } else {
        SnapshotKind::Save
    };

    let store = SnapshotStore::from_config(&config.storage)?;
    let summaries = store.list(kind)?;

    println!("Snapshots ({kind}) in {}:", store.root().display());
    if summaries.is_empty() {
        println!("  (none)");
    }
    for summary in &summaries {
        let label = summary.meta.label.as_deref().unwrap_or("-");
        println!(
            "  {}  {}  {}  ({} edits)",
            summary.id,
            summary.created_at.format("%Y-%m-%d %H:%M:%S"),
            label,
            summary.meta.edit_history.len()
        );
    }

    store.close();
    Ok(())
}
