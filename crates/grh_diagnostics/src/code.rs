//! Diagnostic codes with category prefixes for structured error identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The subsystem a diagnostic code originates from, determining its prefix letter.
///
/// Matches the three diagnostic sources named by the toolchain's error
/// taxonomy: AST-to-GRH elaboration, pass pipeline execution, and
/// SystemVerilog emission.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Diagnostics raised while lowering the elaborated AST into GRH.
    Elaboration,
    /// Diagnostics raised by a transformation pass.
    Pass,
    /// Diagnostics raised while rendering GRH back to SystemVerilog.
    Emission,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Elaboration => 'E',
            Category::Pass => 'P',
            Category::Emission => 'M',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `E101`, `W203`, `T305`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Elaboration.prefix(), 'E');
        assert_eq!(Category::Pass.prefix(), 'P');
        assert_eq!(Category::Emission.prefix(), 'M');
    }

    #[test]
    fn display_format() {
        let code = DiagnosticCode::new(Category::Elaboration, 101);
        assert_eq!(format!("{code}"), "E101");

        let code = DiagnosticCode::new(Category::Pass, 3);
        assert_eq!(format!("{code}"), "P003");

        let code = DiagnosticCode::new(Category::Emission, 42);
        assert_eq!(format!("{code}"), "M042");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Elaboration, 101);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
