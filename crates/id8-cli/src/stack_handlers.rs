//! Handler functions for `id8 stack` commands.
//!
//! Each invocation is one session: open the store from file storage, apply
//! the action, persist if anything changed.

use std::io::Write;

use id8_catalog::{CatalogBackend, create_catalog_backend};
use id8_core::{CatalogItem, Error, Id8Config, ItemKind, Result, valid_item_id};
use id8_stack::{JsonFileStorage, StackItem, StackStorage, StackStore};

use crate::cli::StackAction;

/// Run a stack subcommand against the configured storage and catalog.
pub async fn handle_stack_command(config: &Id8Config, action: StackAction) -> Result<()> {
    let storage = JsonFileStorage::from_config(&config.stack)?;
    let mut store = StackStore::open(&storage)?;
    let catalog = create_catalog_backend(&config.catalog).await?;

    let mut out = std::io::stdout().lock();
    let changed = run_stack_action(action, &mut store, catalog.as_ref(), &mut out).await?;
    if changed {
        store.persist(&storage)?;
        log::debug!("Persisted {} item(s) to {}", store.len(), storage.describe());
    }
    Ok(())
}

/// Apply `action` to `store`, writing human output to `out`.
///
/// Returns whether the store was modified.
pub async fn run_stack_action(
    action: StackAction,
    store: &mut StackStore,
    catalog: &dyn CatalogBackend,
    out: &mut impl Write,
) -> Result<bool> {
    match action {
        StackAction::Add { slug } => {
            let item = lookup(catalog, &slug).await?;
            let added = store.add_item(StackItem::from(&item));
            if added {
                writeln!(out, "Added {} ({})", item.name, item.kind)?;
            } else {
                writeln!(out, "{} is already in your stack", item.name)?;
            }
            Ok(added)
        }
        StackAction::Remove { id } => {
            let removed = store.remove_item(&id);
            if removed {
                writeln!(out, "Removed {id}")?;
            } else {
                writeln!(out, "{id} is not in your stack")?;
            }
            Ok(removed)
        }
        StackAction::Toggle { slug } => {
            let item = lookup(catalog, &slug).await?;
            if store.toggle_item(StackItem::from(&item)) {
                writeln!(out, "Added {}", item.name)?;
            } else {
                writeln!(out, "Removed {}", item.name)?;
            }
            Ok(true)
        }
        StackAction::List { json } => {
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(store.items())?)?;
            } else if store.is_empty() {
                writeln!(out, "Your stack is empty")?;
            } else {
                for item in store.items() {
                    writeln!(out, "{:<8} {:<24} {}", item.kind, item.id, item.name)?;
                }
            }
            Ok(false)
        }
        StackAction::Stats => {
            let stats = store.stats();
            for kind in ItemKind::ALL {
                writeln!(out, "{:<9} {}", format!("{kind}s:"), stats.count(kind))?;
            }
            writeln!(out, "{:<9} {}", "total:", stats.total)?;
            for (category, count) in &stats.categories {
                writeln!(out, "  {category}: {count}")?;
            }
            Ok(false)
        }
        StackAction::Export { name, output } => {
            let json = store.export_stack(&name);
            match output {
                Some(path) => {
                    std::fs::write(&path, json).map_err(|e| Error::io_with_path(e, &path))?;
                    writeln!(out, "Exported {} item(s) to {}", store.len(), path.display())?;
                }
                None => writeln!(out, "{json}")?,
            }
            Ok(false)
        }
        StackAction::Import { file } => {
            let content =
                std::fs::read_to_string(&file).map_err(|e| Error::io_with_path(e, &file))?;
            let count = store.try_import(&content)?;
            writeln!(out, "Imported {count} item(s) from {}", file.display())?;
            Ok(true)
        }
        StackAction::Save { name } => {
            let saved = store.save_stack(&name)?;
            writeln!(out, "Saved '{}' ({} item(s))", saved.name, saved.items.len())?;
            Ok(true)
        }
        StackAction::Load { name } => {
            let count = store.load_saved(&name)?;
            writeln!(out, "Loaded '{name}' ({count} item(s))")?;
            Ok(true)
        }
        StackAction::Delete { name } => {
            if !store.delete_saved(&name) {
                return Err(Error::not_found("saved stack", name));
            }
            writeln!(out, "Deleted '{name}'")?;
            Ok(true)
        }
        StackAction::Saved => {
            if store.saved_stacks().is_empty() {
                writeln!(out, "No saved stacks")?;
            }
            for saved in store.saved_stacks() {
                writeln!(
                    out,
                    "{:<20} {:>3} item(s)  {}",
                    saved.name,
                    saved.items.len(),
                    saved.created_at.format("%Y-%m-%d %H:%M")
                )?;
            }
            Ok(false)
        }
        StackAction::Clear => {
            let had_items = !store.is_empty();
            store.clear();
            writeln!(out, "Cleared your stack")?;
            Ok(had_items)
        }
    }
}

async fn lookup(catalog: &dyn CatalogBackend, slug: &str) -> Result<CatalogItem> {
    match catalog.get_by_slug(slug).await? {
        Some(item) if item.is_published() => match valid_item_id(&item.id) {
            Some(_) => Ok(item),
            None => Err(Error::validation_field(
                "id",
                format!("catalog item '{slug}' has an unusable id"),
            )),
        },
        _ => Err(Error::not_found("item", slug)),
    }
}

// ============================================================================
// Tests
// ============================================================================
