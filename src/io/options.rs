use std::collections::BTreeMap;

use log::{debug, warn};

/// Names accepted as `--name=<int>` directives in leading comments.
pub const KNOWN_OPTIONS: &[&str] = &["threads", "time-limit", "restart-base", "verbose"];

/// Integer options embedded in the comments preceding the DIMACS header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmbeddedOptions(BTreeMap<String, i64>);

impl EmbeddedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    /// Later directives override earlier ones.
    pub fn set(&mut self, name: &str, value: i64) {
        self.0.insert(name.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, &value)| (name.as_str(), value))
    }

    /// Collects the directives of one comment line.
    pub fn scan(&mut self, comment: &str) {
        for (name, value) in directives(comment) {
            if KNOWN_OPTIONS.contains(&name) {
                debug!("embedded option --{name}={value}");
                self.set(name, value);
            } else {
                warn!("ignoring unknown embedded option '--{name}'");
            }
        }
    }
}

fn is_name_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'-'
}

/// Every `--name=<int>` in `line`. Malformed directives are skipped.
fn directives(line: &str) -> Vec<(&str, i64)> {
    let bytes = line.as_bytes();
    let mut found = vec![];

    let mut pos = 0;
    while let Some(offset) = line[pos..].find("--") {
        let start = pos + offset + 2;
        let mut end = start;
        while end < bytes.len() && is_name_char(bytes[end]) {
            end += 1;
        }
        pos = end;

        if end == start || bytes.get(end) != Some(&b'=') {
            continue;
        }
        let value_start = end + 1;
        let mut value_end = value_start;
        if bytes.get(value_end) == Some(&b'-') {
            value_end += 1;
        }
        let digits_start = value_end;
        while value_end < bytes.len() && bytes[value_end].is_ascii_digit() {
            value_end += 1;
        }
        pos = value_end;
        if value_end == digits_start {
            continue;
        }

        match line[value_start..value_end].parse::<i64>() {
            Ok(value) => found.push((&line[start..end], value)),
            Err(_) => warn!("embedded option '--{}' is out of range", &line[start..end]),
        }
    }

    found
}
