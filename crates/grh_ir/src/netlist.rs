//! [`Netlist`] — the ordered, top-level collection of per-module [`Graph`]s (§3 "Netlist").

use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The specialization key identifying one entry in a [`Netlist`].
///
/// This is the module symbol, e.g. `foo$WIDTH_4` for a parametric
/// specialization — not necessarily the user-visible module name (see
/// [`Netlist::alias_for`]).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct ModuleSymbol(pub String);

impl ModuleSymbol {
    /// Wraps a module symbol string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the raw symbol text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The insertion-ordered, top-level container for every elaborated module body.
///
/// `graphs` preserves insertion order (a `Vec` paired with an index map,
/// since graph order is itself part of the deterministic emission contract
/// before any later reordering via `graphOrder`).
#[derive(Default, Debug, Serialize, Deserialize)]
pub struct Netlist {
    graphs: Vec<(ModuleSymbol, Graph)>,
    index: HashMap<ModuleSymbol, usize>,
    top_graphs: Vec<ModuleSymbol>,
    aliases_for_graph: HashMap<ModuleSymbol, String>,
    graph_order: Vec<ModuleSymbol>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `graph` under `symbol`, appending it to emission order.
    ///
    /// Returns the previous graph if `symbol` was already present (and
    /// leaves its position in insertion/emission order unchanged).
    pub fn insert(&mut self, symbol: ModuleSymbol, graph: Graph) -> Option<Graph> {
        if let Some(&idx) = self.index.get(&symbol) {
            let old = std::mem::replace(&mut self.graphs[idx].1, graph);
            return Some(old);
        }
        self.index.insert(symbol.clone(), self.graphs.len());
        self.graphs.push((symbol.clone(), graph));
        self.graph_order.push(symbol);
        None
    }

    /// Looks up a graph by its module symbol.
    pub fn get(&self, symbol: &ModuleSymbol) -> Option<&Graph> {
        self.index.get(symbol).map(|&idx| &self.graphs[idx].1)
    }

    /// Looks up a graph mutably by its module symbol.
    pub fn get_mut(&mut self, symbol: &ModuleSymbol) -> Option<&mut Graph> {
        let idx = *self.index.get(symbol)?;
        Some(&mut self.graphs[idx].1)
    }

    /// Iterates every `(symbol, graph)` pair mutably, in insertion order.
    ///
    /// Used by passes that must visit every graph in the netlist regardless
    /// of emission order (§4.8).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ModuleSymbol, &mut Graph)> {
        self.graphs.iter_mut().map(|(sym, graph)| (&*sym, graph))
    }

    /// Marks `symbol` as a top-level graph. No-op if already marked.
    pub fn mark_top(&mut self, symbol: ModuleSymbol) {
        if !self.top_graphs.contains(&symbol) {
            self.top_graphs.push(symbol);
        }
    }

    /// The ordered list of module symbols marked top-level.
    pub fn top_graphs(&self) -> &[ModuleSymbol] {
        &self.top_graphs
    }

    /// Registers `alias` as the preferred human-readable emission name for `symbol`.
    pub fn set_alias(&mut self, symbol: ModuleSymbol, alias: impl Into<String>) {
        self.aliases_for_graph.insert(symbol, alias.into());
    }

    /// The alternative emission name for `symbol`, if one was registered.
    pub fn alias_for(&self, symbol: &ModuleSymbol) -> Option<&str> {
        self.aliases_for_graph.get(symbol).map(String::as_str)
    }

    /// Sets the deterministic emission order explicitly, overriding insertion order.
    ///
    /// Every symbol in `order` must already be present in this netlist.
    pub fn set_graph_order(&mut self, order: Vec<ModuleSymbol>) {
        debug_assert!(order.iter().all(|s| self.index.contains_key(s)));
        self.graph_order = order;
    }

    /// The deterministic emission order.
    pub fn graph_order(&self) -> &[ModuleSymbol] {
        &self.graph_order
    }

    /// Iterates `(symbol, graph)` pairs in emission order.
    pub fn iter_in_emission_order(&self) -> impl Iterator<Item = (&ModuleSymbol, &Graph)> {
        self.graph_order
            .iter()
            .filter_map(move |sym| self.get(sym).map(|g| (sym, g)))
    }

    /// The number of graphs in this netlist.
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Whether this netlist contains no graphs.
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_roundtrip() {
        let mut n = Netlist::new();
        let sym = ModuleSymbol::new("top");
        n.insert(sym.clone(), Graph::new());
        assert!(n.get(&sym).is_some());
        assert_eq!(n.len(), 1);
    }

    #[test]
    fn iter_mut_visits_every_graph() {
        let mut n = Netlist::new();
        n.insert(ModuleSymbol::new("a"), Graph::new());
        n.insert(ModuleSymbol::new("b"), Graph::new());
        let mut seen: Vec<String> = n.iter_mut().map(|(sym, _)| sym.as_str().to_string()).collect();
        seen.sort();
        assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn top_graphs_dedup() {
        let mut n = Netlist::new();
        let sym = ModuleSymbol::new("top");
        n.insert(sym.clone(), Graph::new());
        n.mark_top(sym.clone());
        n.mark_top(sym.clone());
        assert_eq!(n.top_graphs(), &[sym]);
    }

    #[test]
    fn alias_lookup() {
        let mut n = Netlist::new();
        let sym = ModuleSymbol::new("foo$WIDTH_4");
        n.insert(sym.clone(), Graph::new());
        n.set_alias(sym.clone(), "foo");
        assert_eq!(n.alias_for(&sym), Some("foo"));
    }

    #[test]
    fn emission_order_defaults_to_insertion_order() {
        let mut n = Netlist::new();
        let a = ModuleSymbol::new("a");
        let b = ModuleSymbol::new("b");
        n.insert(a.clone(), Graph::new());
        n.insert(b.clone(), Graph::new());
        let order: Vec<_> = n.iter_in_emission_order().map(|(s, _)| s.clone()).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn explicit_graph_order_overrides_insertion_order() {
        let mut n = Netlist::new();
        let a = ModuleSymbol::new("a");
        let b = ModuleSymbol::new("b");
        n.insert(a.clone(), Graph::new());
        n.insert(b.clone(), Graph::new());
        n.set_graph_order(vec![b.clone(), a.clone()]);
        let order: Vec<_> = n.iter_in_emission_order().map(|(s, _)| s.clone()).collect();
        assert_eq!(order, vec![b, a]);
    }
}
