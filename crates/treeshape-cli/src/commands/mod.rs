pub mod reconcile;
pub mod shape;

use std::path::Path;
use treeshape_core::ops::Dataset;
use treeshape_core::Store;

/// Read a JSON dataset into an in-memory store
pub fn load_store(path: &Path) -> Result<Store, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read dataset {}: {}", path.display(), e))?;
    let dataset = Dataset::from_json_str(&raw)?;
    let store = Store::from_dataset(&dataset)?;
    tracing::debug!(
        path = %path.display(),
        schemas = dataset.schemas.len(),
        "dataset loaded"
    );
    Ok(store)
}
