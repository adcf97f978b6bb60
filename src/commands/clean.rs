//! Clean the public directory

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Remove the generated site; a missing directory is not an error
pub fn remove_public_dir(public_dir: &Path) -> Result<()> {
    if public_dir.exists() {
        fs::remove_dir_all(public_dir)?;
        tracing::info!("Deleted: {:?}", public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_public_dir() {
        let dir = tempfile::tempdir().unwrap();
        let public_dir = dir.path().join("public");
        fs::create_dir_all(public_dir.join("post/a")).unwrap();

        remove_public_dir(&public_dir).unwrap();
        assert!(!public_dir.exists());
        // nothing to do the second time
        remove_public_dir(&public_dir).unwrap();
    }
}
