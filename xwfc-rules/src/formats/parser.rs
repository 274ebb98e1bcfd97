use crate::{LoadError, LoadedRules};

/// Trait defining the interface for format-specific rule parsers.
///
/// Implementors of this trait can parse XWFC rules from different file formats
/// (e.g., RON or JSON). All formats describe the same rule-file structure.
pub trait FormatParser {
    /// Parses rule content into a module registry and the rules over it.
    ///
    /// # Arguments
    ///
    /// * `content` - A string slice containing the rule content
    ///
    /// # Returns
    ///
    /// * `Ok(LoadedRules)` - Successfully parsed rules
    /// * `Err(LoadError)` - Error encountered during parsing
    fn parse(&self, content: &str) -> Result<LoadedRules, LoadError>;

    /// Returns a descriptive name for this parser format.
    ///
    /// This can be used for debugging, logging, or user-facing error messages.
    fn format_name(&self) -> &'static str;
}
