//! Diagnostic report runner, printed for each path the CLI is given. Errors
//! surface the same stable negative codes storage operations return.

use std::path::Path;

use crate::btree::reduce::CountReduceValue;
use crate::config::StoreConfig;
use crate::database::Db;
use crate::errors::{StoreError, StoreResult};

/// Human-readable byte count, matching the unit ladder of the original
/// diagnostic tool (bytes, kB, MB, ... YB, binary multiples).
#[must_use]
pub fn size_str(mut size: f64) -> String {
    const UNITS: [&str; 9] = ["bytes", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
    let mut i = 0;
    while size > 1024.0 && i < UNITS.len() - 1 {
        size /= 1024.0;
        i += 1;
    }
    if i == 0 {
        format!("{size:.0} {}", UNITS[i])
    } else {
        format!("{size:.2} {}", UNITS[i])
    }
}

/// Prints the diagnostic report for the store at `path` to stdout, opening
/// it with the chunk split threshold `config` specifies.
///
/// # Errors
/// Returns the `StoreError` that opening the file produced; the caller
/// maps it to the process exit code via [`StoreError::as_code`].
pub fn run(path: &Path, config: &StoreConfig) -> StoreResult<()> {
    let db = Db::open(path, config.open_options())?;
    let header = db.header_snapshot();

    println!("DB Info ({})", path.display());
    println!("   file format version: {}", header.disk_version);
    println!("   update_seq: {}", header.update_seq);

    match &header.by_id_root {
        None => println!("   no documents"),
        Some(root) => {
            let reduce = CountReduceValue::decode(&root.reduce_value).map_err(|_| StoreError::ParseTerm("by_id reduce value".into()))?;
            println!("   doc count: {}", reduce.count);
            println!("   deleted doc count: {}", reduce.deleted_count);
            println!("   data size: {}", size_str(reduce.total_size as f64));
        }
    }

    let btree_size = header.by_id_root.as_ref().map_or(0, |r| r.subtreesize) + header.by_seq_root.as_ref().map_or(0, |r| r.subtreesize);
    println!("   B-tree size: {}", size_str(btree_size as f64));

    let total_size = path.metadata().map(|m| m.len()).unwrap_or(0);
    println!("   total disk size: {}", size_str(total_size as f64));

    Ok(())
}
