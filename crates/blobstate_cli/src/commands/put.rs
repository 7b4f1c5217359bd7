//! Put command implementation.

use blobstate_resources::{PutRequest, Resource, ResourceManager};
use blobstate_storage::ContentHash;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::info;

/// Runs the put command. `file` of `-` reads stdin.
pub fn run(
    manager: &ResourceManager,
    resource: &str,
    file: &Path,
    sha384: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stored = store(manager, resource, file, sha384)?;
    println!("{}  {} bytes  sha384:{}", stored.path, stored.size, stored.sha384);
    Ok(())
}

/// Stores the content of `file` under `resource`.
pub fn store(
    manager: &ResourceManager,
    resource: &str,
    file: &Path,
    sha384: Option<&str>,
) -> Result<Resource, Box<dyn std::error::Error>> {
    let mut request = PutRequest::new(resource);
    if let Some(hex) = sha384 {
        request = request.with_sha384(ContentHash::from_hex(hex)?);
    }

    let content: Box<dyn Read> = if file == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(file)?))
    };

    info!(resource, source = %file.display(), "storing resource");
    let stored = manager.put(&request, content)?;
    info!(resource, size = stored.size, "stored resource");
    Ok(stored)
}
