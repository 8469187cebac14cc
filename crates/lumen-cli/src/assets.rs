//! `lumen asset` - manage the local asset catalog

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use lumen_core::AssetStore;

#[derive(Subcommand)]
pub enum AssetCommand {
    /// Import an image under a name
    Add {
        /// Name used as the presence image key
        name: String,
        /// Image file to copy into the managed directory
        file: PathBuf,
    },
    /// List assets in insertion order
    List,
    /// Remove an asset and its stored file
    Remove {
        name: String,
    },
    /// Check the catalog against the managed directory
    Scan {
        /// Delete files no asset refers to
        #[arg(long)]
        prune: bool,
    },
}

pub fn handle(command: AssetCommand) -> Result<()> {
    let mut store = AssetStore::open_default().context("failed to open asset catalog")?;

    match command {
        AssetCommand::Add { name, file } => {
            let record = store.add(&name, &file)?;
            println!("Added '{}' ({})", record.name, record.file_path.display());
            println!(
                "Upload it to your application's art assets and use '{}' as the image key.",
                record.name
            );
        }
        AssetCommand::List => {
            if store.list().is_empty() {
                println!("No assets yet. Add one with `lumen asset add <name> <file>`.");
            }
            for record in store.list() {
                println!(
                    "{}  {}  {}",
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.name,
                    record.file_path.display()
                );
            }
        }
        AssetCommand::Remove { name } => {
            let record = store.remove(&name)?;
            println!("Removed '{}'", record.name);
        }
        AssetCommand::Scan { prune } => {
            let report = store.scan()?;
            if report.is_clean() {
                println!("Catalog and asset directory are consistent.");
                return Ok(());
            }
            for record in &report.missing_files {
                println!(
                    "missing file: '{}' -> {}",
                    record.name,
                    record.file_path.display()
                );
            }
            for path in &report.orphaned_files {
                println!("orphaned file: {}", path.display());
            }
            if prune {
                let pruned = store.prune_orphans()?;
                println!("Deleted {} orphaned file(s).", pruned.len());
            }
        }
    }

    Ok(())
}
