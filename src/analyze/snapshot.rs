// src/analyze/snapshot.rs
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Dump the classifier's reply mapping as-is (pretty-printed) into `dir`.
/// Written to a temp file first, then linked into place without replacing an
/// existing snapshot: a second run in the same second gets a `_1`, `_2`, ... suffix.
pub fn write_snapshot(dir: &Path, at: DateTime<Utc>, reply: &Value) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    // pred_YYYYMMDD_HHMMSS for the run's UTC start instant
    let stem = format!("pred_{}", at.format("%Y%m%d_%H%M%S"));
    let tmp = dir.join(format!(".{stem}.{}.tmp", std::process::id()));

    let json = serde_json::to_vec_pretty(reply).map_err(io::Error::other)?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(&json)?;
    f.sync_all()?;
    drop(f);

    let linked = link_unused(dir, &stem, &tmp);
    fs::remove_file(&tmp)?;
    linked
}

fn link_unused(dir: &Path, stem: &str, tmp: &Path) -> io::Result<PathBuf> {
    for n in 0u32.. {
        let name = if n == 0 {
            format!("{stem}.json")
        } else {
            format!("{stem}_{n}.json")
        };
        let path = dir.join(name);
        match fs::hard_link(tmp, &path) {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::other("no free snapshot name"))
}
