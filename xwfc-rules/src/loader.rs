use crate::formats::json_format::JsonFormatParser;
use crate::formats::ron_format::RonFormatParser;
use crate::formats::FormatParser;
use crate::{LoadError, LoadedRules};
use log::info;
use std::path::Path;

/// Picks the parser for `path` from its extension.
///
/// # Errors
///
/// Returns `LoadError::UnsupportedFormat` for anything but `.ron` and `.json`.
pub fn parser_for(path: &Path) -> Result<Box<dyn FormatParser>, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("ron") => Ok(Box::new(RonFormatParser::new())),
        Some("json") => Ok(Box::new(JsonFormatParser::new())),
        other => Err(LoadError::UnsupportedFormat(
            other.unwrap_or("<none>").to_owned(),
        )),
    }
}

/// Loads the module registry and rules from a specified file.
///
/// # Arguments
///
/// * `path` - The path to the rule definition file (a RON or JSON file).
///
/// # Returns
///
/// A `Result` containing the loaded rules on success, or a `LoadError` on failure.
pub fn load_from_file(path: &Path) -> Result<LoadedRules, LoadError> {
    let parser = parser_for(path)?;
    let content = std::fs::read_to_string(path)?;
    let loaded = parser.parse(&content)?;
    info!(
        "Loaded {} modules ({} rules) from {} as {}",
        loaded.modules.len(),
        loaded.rules.kind(),
        path.display(),
        parser.format_name()
    );
    Ok(loaded)
}
