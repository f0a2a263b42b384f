//! Mutable elaboration state for recursive hierarchy elaboration.
//!
//! [`ElaborationContext`] owns the [`Netlist`] under construction, a cache of
//! already-elaborated module bodies keyed by (module name, parameter
//! bindings), and the current elaboration stack for cycle detection —
//! mirroring the external front end's own `instanceBodyGraphs_`/
//! `instanceStack_` bookkeeping, reduced to the single-threaded model this
//! toolchain runs under (§5).

use std::collections::HashMap;

use grh_common::{ContentHash, Ident};
use grh_diagnostics::DiagnosticSink;
use grh_ir::{ModuleSymbol, Netlist};
use grh_source::Span;

use crate::errors;

/// Cache key: module name + a deterministic hash of its elaborated parameter bindings.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct CacheKey {
    name: Ident,
    param_hash: ContentHash,
}

/// Mutable state threaded through recursive instance-body elaboration.
pub struct ElaborationContext<'a> {
    /// The netlist being built.
    pub netlist: Netlist,
    /// The diagnostic sink for error reporting.
    pub sink: &'a DiagnosticSink,
    cache: HashMap<CacheKey, ModuleSymbol>,
    instance_stack: Vec<Ident>,
}

impl<'a> ElaborationContext<'a> {
    /// Creates a new, empty elaboration context.
    pub fn new(sink: &'a DiagnosticSink) -> Self {
        Self {
            netlist: Netlist::new(),
            sink,
            cache: HashMap::new(),
            instance_stack: Vec::new(),
        }
    }

    /// Looks up a previously elaborated specialization of `name` with the
    /// given elaborated parameter values, if one already exists.
    pub fn check_cache(&self, name: Ident, params: &[(Ident, String)]) -> Option<ModuleSymbol> {
        let key = CacheKey {
            name,
            param_hash: hash_params(params),
        };
        self.cache.get(&key).cloned()
    }

    /// Records that `name` with `params` elaborated to `symbol`.
    pub fn insert_cache(&mut self, name: Ident, params: &[(Ident, String)], symbol: ModuleSymbol) {
        let key = CacheKey {
            name,
            param_hash: hash_params(params),
        };
        self.cache.insert(key, symbol);
    }

    /// Pushes `name` onto the instantiation stack.
    ///
    /// Returns `false` and emits an `E103` diagnostic if `name` is already on
    /// the stack (a circular instantiation).
    pub fn push_instance(&mut self, name: Ident, name_text: &str, span: Span) -> bool {
        if self.instance_stack.contains(&name) {
            self.sink.emit(errors::circular_instance(name_text, span));
            return false;
        }
        self.instance_stack.push(name);
        true
    }

    /// Pops the most recently pushed instance name.
    pub fn pop_instance(&mut self) {
        self.instance_stack.pop();
    }
}

/// Deterministically hashes a parameter binding list (order-sensitive: the
/// caller must already sort by declaration order, per §4.7).
fn hash_params(params: &[(Ident, String)]) -> ContentHash {
    let mut buf = Vec::new();
    for (name, value) in params {
        buf.extend_from_slice(&name.as_raw().to_le_bytes());
        buf.extend_from_slice(value.as_bytes());
        buf.push(0);
    }
    ContentHash::from_bytes(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_miss_then_hit() {
        let sink = DiagnosticSink::new();
        let mut ctx = ElaborationContext::new(&sink);
        let name = Ident::from_raw(1);
        assert!(ctx.check_cache(name, &[]).is_none());
        ctx.insert_cache(name, &[], ModuleSymbol::new("counter"));
        assert_eq!(
            ctx.check_cache(name, &[]),
            Some(ModuleSymbol::new("counter"))
        );
    }

    #[test]
    fn different_params_different_cache_entries() {
        let sink = DiagnosticSink::new();
        let mut ctx = ElaborationContext::new(&sink);
        let name = Ident::from_raw(1);
        let width = Ident::from_raw(2);
        ctx.insert_cache(
            name,
            &[(width, "8".to_string())],
            ModuleSymbol::new("counter$WIDTH_8"),
        );
        ctx.insert_cache(
            name,
            &[(width, "16".to_string())],
            ModuleSymbol::new("counter$WIDTH_16"),
        );
        assert_eq!(
            ctx.check_cache(name, &[(width, "8".to_string())]),
            Some(ModuleSymbol::new("counter$WIDTH_8"))
        );
        assert_eq!(
            ctx.check_cache(name, &[(width, "16".to_string())]),
            Some(ModuleSymbol::new("counter$WIDTH_16"))
        );
    }

    #[test]
    fn instance_stack_detects_cycle() {
        let sink = DiagnosticSink::new();
        let mut ctx = ElaborationContext::new(&sink);
        let name = Ident::from_raw(1);
        assert!(ctx.push_instance(name, "top", Span::DUMMY));
        assert!(!ctx.push_instance(name, "top", Span::DUMMY));
        assert!(sink.has_errors());
    }

    #[test]
    fn instance_stack_allows_reentry_after_pop() {
        let sink = DiagnosticSink::new();
        let mut ctx = ElaborationContext::new(&sink);
        let name = Ident::from_raw(1);
        assert!(ctx.push_instance(name, "top", Span::DUMMY));
        ctx.pop_instance();
        assert!(ctx.push_instance(name, "top", Span::DUMMY));
        assert!(!sink.has_errors());
    }
}
