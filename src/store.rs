use std::{fs, path::{Path, PathBuf}};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::util::iso;

pub const MARKER_PATH: &str = "data.json";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Marker {
    pub date: String,
}

/// Overwrite the marker with `day`. Written to a sibling temp file first,
/// then renamed into place.
pub fn write_marker(path: &Path, day: NaiveDate) -> Result<()> {
    let marker = Marker { date: iso(day) };
    let mut tmp = PathBuf::from(path);
    tmp.set_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(&marker)?)
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
