use anyhow::Result;
use chatstore_infrastructure::DirContextStore;

pub fn run(store: &DirContextStore) -> Result<()> {
    println!("Migrating {}...", store.paths().root().display());

    let report = store.migrate();

    if report.is_noop() {
        println!("Nothing to migrate.");
    }
    for (from, to) in &report.moved {
        println!("  ✓ {} -> {}", from.display(), to.display());
    }
    for (dir, reason) in &report.cleanup_failures {
        println!("  ! left {} in place: {}", dir.display(), reason);
    }

    report.into_result()?;
    Ok(())
}
