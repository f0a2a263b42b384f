//! The top-level elaborated-AST container the front end hands to the elaborator.

use crate::expr::AstExpr;
use crate::item::{AstItem, Direction};
use crate::types::AstType;
use grh_common::Ident;
use grh_source::Span;
use serde::{Deserialize, Serialize};

/// A resolved module parameter (with its default, pre-specialization, value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstParam {
    pub name: Ident,
    pub ty: AstType,
    pub default: Option<AstExpr>,
    pub span: Span,
}

/// A module port declaration, already typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstPort {
    pub name: Ident,
    pub direction: Direction,
    pub ty: AstType,
    pub span: Span,
}

/// One module (or interface) definition, pre-specialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstModule {
    pub name: Ident,
    pub params: Vec<AstParam>,
    pub ports: Vec<AstPort>,
    pub decls: Vec<AstItem>,
    pub body: Vec<AstItem>,
    pub span: Span,
}

/// A complete elaborated design: every module definition reachable from the
/// top, plus which module(s) are marked top-level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstDesign {
    pub modules: Vec<AstModule>,
    pub top: Option<Ident>,
}

impl AstDesign {
    /// Finds a module definition by name.
    pub fn find_module(&self, name: Ident) -> Option<&AstModule> {
        self.modules.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_module(name: Ident) -> AstModule {
        AstModule {
            name,
            params: Vec::new(),
            ports: Vec::new(),
            decls: Vec::new(),
            body: Vec::new(),
            span: Span::DUMMY,
        }
    }

    #[test]
    fn find_module_by_name() {
        let mut d = AstDesign::default();
        d.modules.push(empty_module(Ident::from_raw(1)));
        assert!(d.find_module(Ident::from_raw(1)).is_some());
        assert!(d.find_module(Ident::from_raw(2)).is_none());
    }

    #[test]
    fn default_design_has_no_top() {
        let d = AstDesign::default();
        assert!(d.top.is_none());
        assert!(d.modules.is_empty());
    }
}
