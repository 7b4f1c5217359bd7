//! Delete command implementation.

use blobstate_resources::ResourceManager;
use tracing::info;

/// Runs the delete command.
pub fn run(manager: &ResourceManager, resource: &str) -> Result<(), Box<dyn std::error::Error>> {
    manager.delete(resource)?;
    info!(resource, "deleted resource");
    println!("deleted {resource}");
    Ok(())
}
