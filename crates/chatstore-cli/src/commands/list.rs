use anyhow::{Context, Result};
use chatstore_infrastructure::DirContextStore;

pub fn run(store: &DirContextStore, owner: Option<&str>) -> Result<()> {
    let summaries = store
        .summaries(owner)
        .context("Failed to list contexts")?;
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}
