use std::error::Error;
use std::path::Path;

use gridlock_pool::{StateStore, WorkPool};

pub mod experiments;
pub mod reports;
pub mod status;

/// Takes the pool lock briefly to read a consistent snapshot of the shared
/// document. Monitoring never writes it back.
pub(crate) fn load_pool(directory: &Path) -> Result<WorkPool, Box<dyn Error>> {
    let store = StateStore::open(directory);
    let guard = store.lock().acquire()?;
    let pool = store.read()?;
    drop(guard);
    Ok(pool)
}
