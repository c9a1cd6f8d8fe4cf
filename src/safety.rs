//! Guards for the index build, which deletes its output before writing.
//!
//! The output must look like a SQLite index and must never be one of the
//! export files it is built from.

use anyhow::{bail, Result};
use std::path::Path;

/// Extensions accepted for a catalog index
pub const INDEX_EXTENSIONS: [&str; 2] = ["sqlite3", "db"];

/// Validates that an index path is safe to overwrite.
///
/// Fails if the file name lacks a SQLite extension or if the output is
/// one of `source_paths`.
pub fn validate_index_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    let has_index_extension = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| INDEX_EXTENSIONS.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)));

    if !has_index_extension {
        bail!(
            "Safety check failed: index '{}' must end in .{}",
            output.display(),
            INDEX_EXTENSIONS.join(" or .")
        );
    }

    for source in source_paths {
        if same_file(output, source) {
            bail!(
                "Safety check failed: index '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    // Different spellings of one existing file
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
