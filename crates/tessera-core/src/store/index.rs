//! `index.properties`: one `configuration-id=slot` line per installed
//! configuration.
use std::collections::BTreeMap;
use std::path::Path;

use crate::store::error::StoreError;

pub(crate) const INDEX_FILE: &str = "index.properties";

const HEADER: &str = "# Installed configurations: id=slot\n";

/// Parse index text. Blank lines and `#`/`!` comments are skipped; `=` or
/// `:` separates key and value.
pub(crate) fn parse(path: &Path, text: &str) -> Result<BTreeMap<String, u64>, StoreError> {
    let corrupt = |line: usize, reason: String| StoreError::StoreCorruption {
        path: path.to_path_buf(),
        reason: format!("line {}: {}", line, reason),
    };

    let mut entries = BTreeMap::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        // Config ids never contain ':' or '=', so the first one found separates
        let (key, value) = line
            .split_once(['=', ':'])
            .ok_or_else(|| corrupt(i + 1, format!("missing separator in '{}'", line)))?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            return Err(corrupt(i + 1, "empty key".to_string()));
        }
        let slot = value
            .parse::<u64>()
            .map_err(|_| corrupt(i + 1, format!("slot '{}' of '{}' is not a number", value, key)))?;
        if entries.insert(key.to_string(), slot).is_some() {
            return Err(corrupt(i + 1, format!("'{}' listed twice", key)));
        }
    }
    Ok(entries)
}

pub(crate) fn render(entries: &BTreeMap<String, u64>) -> String {
    let mut out = String::from(HEADER);
    for (key, slot) in entries {
        out.push_str(key);
        out.push('=');
        out.push_str(&slot.to_string());
        out.push('\n');
    }
    out
}
