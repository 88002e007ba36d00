use anyhow::{Context, Result};
use chatstore_core::ContextRegistry;
use chatstore_infrastructure::DirContextStore;

pub fn run(store: &DirContextStore, id: &str) -> Result<()> {
    let report = store
        .delete_context(&ContextRegistry::new(), id)
        .with_context(|| format!("Failed to remove context {}", id))?;

    for path in &report.removed {
        println!("  ✓ removed {}", path.display());
    }
    for (path, reason) in &report.failed {
        println!("  ✗ {}: {}", path.display(), reason);
    }
    if report.removed.is_empty() && report.failed.is_empty() {
        println!("Context {} not found.", id);
    }

    if !report.is_clean() {
        anyhow::bail!("{} location(s) could not be removed", report.failed.len());
    }
    Ok(())
}
