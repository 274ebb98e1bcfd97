use crate::formats::FormatParser;
#[cfg(feature = "serde")]
use crate::formats::schema::{build, RuleFile};
use crate::{LoadError, LoadedRules};

/// A parser implementation for RON (Rusty Object Notation) format rules.
pub struct RonFormatParser;

impl Default for RonFormatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RonFormatParser {
    /// Creates a new RON format parser
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for RonFormatParser {
    fn format_name(&self) -> &'static str {
        "Rusty Object Notation (RON)"
    }

    #[cfg(feature = "serde")]
    fn parse(&self, ron_content: &str) -> Result<LoadedRules, LoadError> {
        let rule_file: RuleFile = ron::from_str(ron_content)
            .map_err(|e| LoadError::ParseError(format!("RON deserialization failed: {e}")))?;
        build(rule_file)
    }

    /// Stub implementation when the `serde` feature is not enabled.
    #[cfg(not(feature = "serde"))]
    fn parse(&self, _ron_content: &str) -> Result<LoadedRules, LoadError> {
        Err(LoadError::FeatureNotEnabled(
            "serde (required for RON parsing)".to_string(),
        ))
    }
}

/// Parses XWFC rules defined in a RON string.
pub fn parse_ron_rules(ron_content: &str) -> Result<LoadedRules, LoadError> {
    RonFormatParser::new().parse(ron_content)
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::RuleSet;
    use xwfc_core::{EntanglementRules, PureState};

    const ADJACENCY: &str = r#"(
        connection_types: ["E", "W"],
        duals: [("E", "W")],
        modules: [
            (name: "A"),
            (name: "B"),
            (name: "Gate", class: 1),
        ],
        adjacency: [("A", "B", "E"), ("B", "Gate", "E")],
    )"#;

    #[test]
    fn test_parse_adjacency_rules() {
        let loaded = parse_ron_rules(ADJACENCY).unwrap();
        assert_eq!(loaded.modules.len(), 3);
        assert_eq!(loaded.modules.global_dimension(), 2);
        assert_eq!(loaded.modules.state_of("Gate"), Some(PureState(2)));
        let RuleSet::Adjacency(rules) = &loaded.rules else {
            panic!("expected adjacency rules, got {}", loaded.rules.kind());
        };
        assert!(rules.allows(PureState(0), 0, PureState(1)));
        assert!(rules.allows(PureState(1), 1, PureState(0)));
        assert!(rules.allows(PureState(1), 0, PureState(2)));
        assert!(!rules.allows(PureState(0), 0, PureState(2)));
    }

    #[test]
    fn test_parse_connection_states() {
        let content = r#"(
            connection_types: ["E", "W"],
            duals: [("E", "W")],
            modules: [
                (name: "road", states: Some({"E": [1, 0], "W": [1, 0]})),
                (name: "end", states: Some({"E": [0, 0], "W": [1, 0]})),
            ],
        )"#;
        let loaded = parse_ron_rules(content).unwrap();
        assert_eq!(loaded.rules.kind(), "connection-state");
        assert!(loaded.rules.allows(PureState(0), 0, PureState(1)));
        assert!(!loaded.rules.allows(PureState(1), 0, PureState(0)));
    }

    #[test]
    fn test_missing_dual_is_rejected() {
        let content = r#"(
            connection_types: ["E", "W", "U"],
            duals: [("E", "W")],
            modules: [(name: "A")],
        )"#;
        match parse_ron_rules(content) {
            Err(LoadError::InvalidData(msg)) => assert!(msg.contains("U has no dual"), "{msg}"),
            other => panic!("expected invalid data, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_connection_states_are_rejected() {
        let content = r#"(
            connection_types: ["E", "W"],
            duals: [("E", "W")],
            modules: [
                (name: "road", states: Some({"E": [1], "W": [1]})),
                (name: "grass"),
            ],
        )"#;
        assert!(matches!(
            parse_ron_rules(content),
            Err(LoadError::InvalidData(_))
        ));
    }
}
