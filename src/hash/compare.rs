// Compare To resolution
// Turns a user-supplied compare argument into a hex digest or an empty value

use std::str::FromStr;

use log::{debug, warn};

use super::hex;

/// Reserved compare-to values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareToken {
    /// Skip the comparison
    Empty,
    /// Use the hex value currently held by an external source
    Clipboard,
}

impl FromStr for CompareToken {
    type Err = ();

    /// Only the token names match, case-insensitively. Numbers are never
    /// read as token positions, so "0" or "1" stay literal digests.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("empty") {
            Ok(CompareToken::Empty)
        } else if s.eq_ignore_ascii_case("clipboard") {
            Ok(CompareToken::Clipboard)
        } else {
            Err(())
        }
    }
}

/// Provider of text that may hold a hex digest (e.g. the system clipboard)
pub trait HexSource {
    fn read_text(&self) -> Option<String>;
}

/// Source that never has anything to offer
pub struct NoSource;

impl HexSource for NoSource {
    fn read_text(&self) -> Option<String> {
        None
    }
}

/// Resolves compare-to arguments against an external hex source
pub struct CompareResolver<S> {
    source: S,
}

impl<S: HexSource> CompareResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve to a literal value, or empty when no comparison should run
    pub fn resolve(&self, value: &str) -> String {
        match value.parse::<CompareToken>() {
            Ok(CompareToken::Empty) => String::new(),
            Ok(CompareToken::Clipboard) => self.read_source(),
            Err(()) => value.to_string(),
        }
    }

    /// Read the external source, keeping it only if it is valid hex
    fn read_source(&self) -> String {
        let Some(text) = self.source.read_text() else {
            debug!("Compare To source is empty");
            return String::new();
        };

        match hex::decode(&text, false) {
            Ok(_) => text.trim().to_string(),
            Err(e) => {
                warn!("Ignoring Compare To source content: {}", e);
                String::new()
            }
        }
    }
}
