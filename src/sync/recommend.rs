// src/sync/recommend.rs

//! Recommendation generator: turns a comparison into typed, prioritized actions.

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use super::compare::ComparisonResult;

/// What to do with a set of keys
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncAction {
    /// Present in source, absent from target
    Insert,
    /// Present on both sides with differing fields
    Update,
    /// Present on both sides and identical
    Skip,
    /// Present in target, absent from source; never deleted automatically
    Investigate,
}

impl SyncAction {
    /// Lower runs first
    pub fn priority(&self) -> u8 {
        match self {
            SyncAction::Insert => 1,
            SyncAction::Update => 2,
            SyncAction::Skip | SyncAction::Investigate => 3,
        }
    }

    /// Whether this action writes to the target store
    pub fn is_write(&self) -> bool {
        matches!(self, SyncAction::Insert | SyncAction::Update)
    }

    /// Symbol used when listing actions
    pub fn symbol(&self) -> &'static str {
        match self {
            SyncAction::Insert => "+",
            SyncAction::Update => "~",
            SyncAction::Skip => "=",
            SyncAction::Investigate => "?",
        }
    }
}

/// One action over a set of keys of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncRecommendation {
    pub entity_name: String,
    pub action: SyncAction,
    pub keys: Vec<String>,
    pub priority: u8,
    pub reason: String,
}

impl SyncRecommendation {
    pub fn new(entity_name: &str, action: SyncAction, keys: Vec<String>, reason: String) -> Self {
        Self {
            entity_name: entity_name.to_string(),
            action,
            priority: action.priority(),
            keys,
            reason,
        }
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// One-line description for listings
    pub fn description(&self) -> String {
        format!(
            "{} {} {} ({}) - {}",
            self.action.symbol(),
            self.action,
            self.entity_name,
            self.keys.len(),
            self.reason
        )
    }
}

/// Build recommendations for one entity, in execution order
///
/// One recommendation per non-empty key set: insert, update, skip,
/// investigate. An entity in sync yields no insert or update.
pub fn generate_recommendations(comparison: &ComparisonResult) -> Vec<SyncRecommendation> {
    let entity = comparison.entity_name.as_str();
    let mut recommendations = Vec::new();

    if !comparison.missing_in_target.is_empty() {
        let count = comparison.missing_in_target.len();
        recommendations.push(SyncRecommendation::new(
            entity,
            SyncAction::Insert,
            comparison.missing_in_target.iter().cloned().collect(),
            format!("{count} record(s) present in source but absent from target"),
        ));
    }

    if !comparison.changed.is_empty() {
        let count = comparison.changed.len();
        recommendations.push(SyncRecommendation::new(
            entity,
            SyncAction::Update,
            comparison.changed.iter().cloned().collect(),
            format!("{count} record(s) differ in at least one mapped field"),
        ));
    }

    if !comparison.identical.is_empty() {
        let count = comparison.identical.len();
        recommendations.push(SyncRecommendation::new(
            entity,
            SyncAction::Skip,
            comparison.identical.iter().cloned().collect(),
            format!("{count} record(s) already identical"),
        ));
    }

    if !comparison.missing_in_source.is_empty() {
        let count = comparison.missing_in_source.len();
        recommendations.push(SyncRecommendation::new(
            entity,
            SyncAction::Investigate,
            comparison.missing_in_source.iter().cloned().collect(),
            format!(
                "{count} record(s) present in target but absent from source; \
                 review manually, extracts may be partial"
            ),
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::str::FromStr;

    fn keys(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_action_priority() {
        assert_eq!(SyncAction::Insert.priority(), 1);
        assert_eq!(SyncAction::Update.priority(), 2);
        assert_eq!(SyncAction::Skip.priority(), 3);
        assert_eq!(SyncAction::Investigate.priority(), 3);
    }

    #[test]
    fn test_action_strings() {
        assert_eq!(SyncAction::Investigate.to_string(), "investigate");
        assert_eq!(SyncAction::from_str("update").unwrap(), SyncAction::Update);
        assert!(SyncAction::from_str("delete").is_err());
    }

    #[test]
    fn test_all_categories() {
        let comparison = ComparisonResult {
            entity_name: "contacts".to_string(),
            missing_in_target: keys(&["3"]),
            changed: keys(&["2"]),
            identical: keys(&["1"]),
            missing_in_source: keys(&["4", "5"]),
            ..Default::default()
        };

        let recommendations = generate_recommendations(&comparison);
        let actions: Vec<SyncAction> = recommendations.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            vec![
                SyncAction::Insert,
                SyncAction::Update,
                SyncAction::Skip,
                SyncAction::Investigate
            ]
        );
        assert_eq!(recommendations[0].keys, vec!["3"]);
        assert_eq!(recommendations[3].keys, vec!["4", "5"]);
        assert_eq!(recommendations[3].priority, 3);
        assert!(recommendations[0].reason.starts_with("1 record(s)"));
    }

    #[test]
    fn test_in_sync_has_no_writes() {
        let comparison = ComparisonResult {
            entity_name: "items".to_string(),
            identical: keys(&["1", "2"]),
            ..Default::default()
        };

        let recommendations = generate_recommendations(&comparison);
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].action, SyncAction::Skip);
        assert!(!recommendations.iter().any(|r| r.action.is_write()));
    }

    #[test]
    fn test_empty_comparison() {
        let comparison = ComparisonResult::default();
        assert!(generate_recommendations(&comparison).is_empty());
    }
}
