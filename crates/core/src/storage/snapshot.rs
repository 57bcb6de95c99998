use crate::domain::report::{ClassifiedEntry, Report};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LAST_UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// On-disk shape read by the static page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub gainers: Vec<ClassifiedEntry>,
    pub losers: Vec<ClassifiedEntry>,
    pub tech: Vec<ClassifiedEntry>,
    pub last_updated: String,
}

impl From<&Report> for SnapshotDocument {
    fn from(report: &Report) -> Self {
        Self {
            gainers: report.gainers.clone(),
            losers: report.losers.clone(),
            tech: report.watchlist.clone(),
            last_updated: report.generated_at.format(LAST_UPDATED_FORMAT).to_string(),
        }
    }
}

pub fn write_snapshot(path: &Path, report: &Report) -> Result<()> {
    let doc = SnapshotDocument::from(report);
    write_json_atomic(path, &doc)
}

pub fn read_snapshot(path: &Path) -> Result<SnapshotDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid snapshot {}", path.display()))
}

/// Serializes to a sibling temp file and renames it over `path`, so readers only ever see
/// the previous complete document or the new one.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_vec_pretty(value).context("failed to serialize snapshot")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let tmp = temp_path(path)?;
    let res = (|| -> Result<()> {
        let mut f = std::fs::File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        f.write_all(&body)?;
        f.write_all(b"\n")?;
        f.sync_all()?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to move snapshot into {}", path.display()))?;
        Ok(())
    })();

    if res.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    res
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("snapshot path has no file name: {}", path.display()))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recommendation::Recommendation;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn entry(sym: &str) -> ClassifiedEntry {
        ClassifiedEntry {
            symbol: sym.to_string(),
            price: "11.00".to_string(),
            percent_change: "+10.00".to_string(),
            recommendation: Recommendation::Buy,
            reason: "r".to_string(),
        }
    }

    fn report() -> Report {
        Report {
            gainers: vec![entry("A")],
            losers: vec![],
            watchlist: vec![entry("AAPL")],
            generated_at: Utc.with_ymd_and_hms(2026, 3, 2, 21, 5, 9).unwrap(),
        }
    }

    #[test]
    fn document_uses_page_keys() {
        let v = serde_json::to_value(SnapshotDocument::from(&report())).unwrap();
        let obj = v.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["gainers", "last_updated", "losers", "tech"]);
        assert_eq!(v["last_updated"], json!("2026-03-02 21:05:09 UTC"));
        assert_eq!(v["tech"][0]["symbol"], json!("AAPL"));
    }

    #[test]
    fn writes_and_replaces_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("data.json");

        write_snapshot(&path, &report()).unwrap();
        let first = read_snapshot(&path).unwrap();
        assert_eq!(first.gainers.len(), 1);

        let mut next = report();
        next.gainers.clear();
        write_snapshot(&path, &next).unwrap();
        let second = read_snapshot(&path).unwrap();
        assert!(second.gainers.is_empty());
        assert_eq!(second.tech.len(), 1);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        write_snapshot(&path, &report()).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        // A directory squatting on the temp name makes the write fail before the rename.
        std::fs::create_dir(dir.path().join(".data.json.tmp")).unwrap();
        assert!(write_snapshot(&path, &report()).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
