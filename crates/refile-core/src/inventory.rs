use crate::storage::models::FileRecord;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Decommissioned storage origin, pending supersession.
    Source,
    /// Current storage origin, the intended final reference.
    Target,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Source => write!(f, "source"),
            Origin::Target => write!(f, "target"),
        }
    }
}

/// Classifies file rows by storage origin: a url containing any
/// configured pattern is `source`; otherwise rows created strictly
/// before the cutoff (when one is set) are `source`; everything else
/// is `target`.
#[derive(Debug, Clone)]
pub struct OriginRule {
    url_patterns: Vec<String>,
    cutoff: Option<DateTime<Utc>>,
}

impl OriginRule {
    pub fn new(url_patterns: Vec<String>, cutoff: Option<&str>) -> Self {
        let cutoff = cutoff.and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!("Unparseable created_cutoff '{}', ignoring it", raw);
            }
            parsed
        });
        Self { url_patterns, cutoff }
    }

    pub fn classify(&self, file: &FileRecord) -> Origin {
        if self.url_patterns.iter().any(|p| file.url.contains(p.as_str())) {
            return Origin::Source;
        }
        if let Some(cutoff) = self.cutoff {
            return match parse_timestamp(&file.created_at) {
                Some(created) if created < cutoff => Origin::Source,
                Some(_) => Origin::Target,
                None => {
                    warn!(
                        "File {} has unparseable created_at '{}', classifying as target",
                        file.id, file.created_at
                    );
                    Origin::Target
                }
            };
        }
        Origin::Target
    }
}

/// Accepts RFC 3339 and the plain-dump timestamp format.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }
    None
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub sources: Vec<FileRecord>,
    pub targets: Vec<FileRecord>,
}

pub fn split_by_origin(files: Vec<FileRecord>, rule: &OriginRule) -> Inventory {
    let mut inventory = Inventory::default();
    for file in files {
        match rule.classify(&file) {
            Origin::Source => inventory.sources.push(file),
            Origin::Target => inventory.targets.push(file),
        }
    }
    inventory
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: i64, url: &str, created_at: &str) -> FileRecord {
        FileRecord {
            id,
            name: format!("file_{id}.png"),
            hash: None,
            url: url.to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_url_pattern_wins_over_cutoff() {
        let rule = OriginRule::new(
            vec!["strapiapp.com".to_string()],
            Some("2025-11-11 19:00:00"),
        );
        // Created after the cutoff, but the url marks it as old origin
        let f = file(1, "https://x.media.strapiapp.com/cake.png", "2025-12-01 00:00:00");
        assert_eq!(rule.classify(&f), Origin::Source);
    }

    #[test]
    fn test_cutoff_classification() {
        let rule = OriginRule::new(vec![], Some("2025-11-11 19:00:00"));
        let old = file(1, "/uploads/cake.png", "2025-11-10 08:30:00");
        let new = file(2, "/uploads/cake_9f8e7d6c5b.png", "2025-11-12 08:30:00");
        assert_eq!(rule.classify(&old), Origin::Source);
        assert_eq!(rule.classify(&new), Origin::Target);
    }

    #[test]
    fn test_no_rule_defaults_to_target() {
        let rule = OriginRule::new(vec![], None);
        assert_eq!(rule.classify(&file(1, "/uploads/a.png", "")), Origin::Target);
    }

    #[test]
    fn test_unparseable_created_at_is_target() {
        let rule = OriginRule::new(vec![], Some("2025-11-11 19:00:00"));
        assert_eq!(
            rule.classify(&file(1, "/uploads/a.png", "not a date")),
            Origin::Target
        );
    }

    #[test]
    fn test_rfc3339_timestamps_accepted() {
        let rule = OriginRule::new(vec![], Some("2025-11-11T19:00:00Z"));
        let old = file(1, "/uploads/a.png", "2025-11-11T18:59:59Z");
        assert_eq!(rule.classify(&old), Origin::Source);
    }
}
