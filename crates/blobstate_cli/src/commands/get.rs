//! Get command implementation.

use blobstate_resources::ResourceManager;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Runs the get command, writing to `output` or stdout.
pub fn run(
    manager: &ResourceManager,
    resource: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let written = match output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            let written = copy_to(manager, resource, &mut out)?;
            out.flush()?;
            written
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let written = copy_to(manager, resource, &mut out)?;
            out.flush()?;
            written
        }
    };
    info!(resource, bytes = written, "read resource");
    Ok(())
}

/// Copies the content of `resource` into `out`, returning the byte count.
pub fn copy_to(
    manager: &ResourceManager,
    resource: &str,
    out: &mut dyn Write,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut reader = manager.get(resource)?;
    Ok(io::copy(&mut reader, out)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::open_manager;
    use blobstate_resources::PutRequest;
    use tempfile::tempdir;

    #[test]
    fn copies_content() {
        let dir = tempdir().unwrap();
        let manager = open_manager(dir.path(), "default").unwrap();
        manager
            .put(&PutRequest::new("/blob/s/trusty/tahr.gz"), &b"xyzzy"[..])
            .unwrap();

        let mut out: Vec<u8> = Vec::new();
        let written = copy_to(&manager, "/blob/s/trusty/tahr.gz", &mut out).unwrap();
        assert_eq!(written, 5);
        assert_eq!(out, b"xyzzy");
    }

    #[test]
    fn missing_resource_is_error() {
        let dir = tempdir().unwrap();
        let manager = open_manager(dir.path(), "default").unwrap();
        assert!(copy_to(&manager, "/blob/s/trusty/none", &mut Vec::<u8>::new()).is_err());
    }
}
