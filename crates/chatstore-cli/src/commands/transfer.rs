use anyhow::{Context, Result};
use chatstore_core::registry::write_context;
use chatstore_core::ContextRegistry;
use chatstore_infrastructure::DirContextStore;
use std::fs;
use std::path::PathBuf;

pub fn export(store: &DirContextStore, id: &str, owner: Option<&str>) -> Result<()> {
    let context = store
        .find(id, owner)
        .with_context(|| format!("Failed to load context {}", id))?
        .with_context(|| format!("Context {} not found", id))?;
    println!("{}", store.export_to_text(&context)?);
    Ok(())
}

pub fn import(store: &DirContextStore, files: &[PathBuf], owner: Option<&str>) -> Result<()> {
    let texts = files
        .iter()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let registry = ContextRegistry::new();
    let ids = store
        .import_from_text(&registry, &texts, owner)
        .context("Failed to import documents")?;

    for id in &ids {
        let shared = registry
            .get(id)
            .with_context(|| format!("Imported context {} missing from registry", id))?;
        let path = store
            .save(&mut write_context(&shared), owner)
            .with_context(|| format!("Failed to save imported context {}", id))?;
        if let Some(path) = path {
            println!("  ✓ {} -> {}", id, path.display());
        }
    }
    Ok(())
}
