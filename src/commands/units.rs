//! Unit management: list and delete.

use anyhow::Result;
use serde_json::json;

use crate::storage::IndexStore;

pub fn list(store: &IndexStore) -> Result<()> {
    let units = store.list()?;
    super::print_json(&json!({
        "storage": store.root(),
        "count": units.len(),
        "units": units,
    }))
}

pub fn delete(store: &IndexStore, unit: &str) -> Result<()> {
    let deleted = store.delete(unit)?;
    super::print_json(&json!({ "unit": unit, "deleted": deleted }))
}
