use std::io::Write;
use xwfc_core::{EntanglementRules, PureState};
use xwfc_rules::loader::load_from_file;
use xwfc_rules::{LoadError, RuleSet};

// Helper function to create the full path to test data
fn test_data_path(filename: &str) -> std::path::PathBuf {
    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("rules_data");
    path.push(filename);
    path
}

#[test]
fn test_load_valid_simple() {
    let path = test_data_path("valid_simple.ron");
    let loaded = load_from_file(&path).expect("valid_simple.ron should load");

    assert_eq!(loaded.modules.len(), 2);
    assert_eq!(loaded.modules.connection_type_count(), 4);
    let a = loaded.modules.state_of("A").unwrap();
    let b = loaded.modules.state_of("B").unwrap();
    let RuleSet::Adjacency(rules) = &loaded.rules else {
        panic!("expected adjacency rules");
    };

    assert!(rules.allows(a, 0, a)); // A-A +x
    assert!(rules.allows(b, 3, b)); // B-B -y
    assert!(rules.allows(a, 0, b)); // A-B +x
    assert!(rules.allows(b, 1, a)); // B-A -x, mirrored

    assert!(!rules.allows(a, 1, b)); // A-B -x
    assert!(!rules.allows(b, 0, a)); // B-A +x
    assert!(!rules.allows(a, 2, b)); // A-B +y
}

#[test]
fn test_load_connection_states() {
    let loaded = load_from_file(&test_data_path("connectors.ron")).unwrap();
    let RuleSet::ConnectionState(rules) = &loaded.rules else {
        panic!("expected connection-state rules");
    };
    assert_eq!(loaded.modules.len(), 16);
    assert_eq!(rules.dimension(), 3);
    // tile_02 has an east connector, tile_08 a west one, tile_00 none.
    let east = loaded.modules.state_of("tile_02").unwrap();
    let west = loaded.modules.state_of("tile_08").unwrap();
    let closed = loaded.modules.state_of("tile_00").unwrap();
    assert!(rules.allows(east, 2, west));
    assert!(rules.allows(west, 3, east));
    assert!(!rules.allows(east, 2, closed));
    assert!(rules.allows(closed, 2, closed));
}

#[test]
fn test_load_invalid_dup_name() {
    let result = load_from_file(&test_data_path("invalid_dup_name.ron"));
    match result.err().unwrap() {
        LoadError::InvalidData(msg) => assert!(msg.contains("Duplicate module name: A")),
        other => panic!("Expected InvalidData error for duplicate name, got {other:?}"),
    }
}

#[test]
fn test_load_invalid_bad_type() {
    let result = load_from_file(&test_data_path("invalid_bad_type.ron"));
    match result.err().unwrap() {
        LoadError::InvalidData(msg) => {
            assert!(msg.contains("Invalid connection type name: InvalidType"))
        }
        other => panic!("Expected InvalidData error for bad type, got {other:?}"),
    }
}

#[test]
fn test_load_invalid_unknown_module() {
    let result = load_from_file(&test_data_path("invalid_unknown_module.ron"));
    match result.err().unwrap() {
        LoadError::InvalidData(msg) => assert!(msg.contains("Unknown module: Unknown")),
        other => panic!("Expected InvalidData error for unknown module, got {other:?}"),
    }
}

#[test]
fn test_load_invalid_format() {
    let result = load_from_file(&test_data_path("invalid_format.ron"));
    match result.err().unwrap() {
        LoadError::ParseError(msg) => assert!(msg.contains("RON deserialization failed")),
        other => panic!("Expected ParseError for invalid format, got {other:?}"),
    }
}

#[test]
fn test_load_file_not_found() {
    let result = load_from_file(&test_data_path("non_existent_file.ron"));
    assert!(matches!(result, Err(LoadError::Io(_))));
}

#[test]
fn test_load_json_from_temp_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    write!(
        file,
        r#"{{
            "connection_types": ["up", "down"],
            "duals": [["up", "down"]],
            "modules": [{{"name": "floor"}}, {{"name": "door", "class": 1}}],
            "adjacency": [["floor", "door", "up"]]
        }}"#
    )
    .unwrap();

    let loaded = load_from_file(file.path()).unwrap();
    assert_eq!(loaded.modules.class_count(), 2);
    assert_eq!(loaded.modules.state_of("door"), Some(PureState(1)));
    assert!(loaded.rules.allows(PureState(0), 0, PureState(1)));
    assert!(loaded.rules.allows(PureState(1), 1, PureState(0)));
    assert_eq!(loaded.rules.dimension_in_exclusion_class(1), 1);
}

#[test]
fn test_unsupported_extension() {
    let file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    assert!(matches!(
        load_from_file(file.path()),
        Err(LoadError::UnsupportedFormat(ext)) if ext == "yaml"
    ));
}
