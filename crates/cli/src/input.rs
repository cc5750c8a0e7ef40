//! Loading dnsx exports. dnsx emits line-delimited JSON by default and
//! a JSON array with `-json -o`; both shapes are accepted.

use anyhow::Context;
use correlator_core::models::DnsRecord;
use std::path::Path;

pub fn load_records(path: &Path) -> anyhow::Result<Vec<DnsRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).with_context(|| format!("parse {}", path.display()))
    } else {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(idx, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("parse {} line {}", path.display(), idx + 1))
            })
            .collect()
    }
}
