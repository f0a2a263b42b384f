//! Loading an elaborated design from disk.
//!
//! No lexer/parser lives in this toolchain (`grh_ast` intentionally carries
//! only already-bound nodes, §4.0); the front end that would normally hand
//! the elaborator an [`AstDesign`] is out of scope here, so `transform`
//! reads one directly, serialized as JSON. Since an [`Ident`] is an opaque
//! interned index with no text of its own, the input file carries a
//! `names` table alongside the design: `names[i]` is the declared text of
//! `Ident::from_raw(i)`.

use std::fs;
use std::path::Path;

use grh_ast::AstDesign;
use grh_common::Ident;
use serde::Deserialize;

/// The on-disk envelope: an [`AstDesign`] plus the name table needed to
/// resolve its [`Ident`]s back to source text.
#[derive(Deserialize)]
pub struct DesignFile {
    /// `names[i]` is the declared identifier text for `Ident::from_raw(i)`.
    pub names: Vec<String>,
    /// The already-bound design.
    pub design: AstDesign,
}

/// Loads and parses a design file. Returns the textual parse error as `Err`
/// so the caller can map it to the source-parse-error exit code.
pub fn load_design_file(path: &Path) -> Result<DesignFile, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| format!("{}: {e}", path.display()))
}

/// Merges a list of per-file designs into one, concatenating module lists
/// and name tables (rebasing each file's `Ident`s by the prior files'
/// name-table length so indices stay injective across files).
pub fn merge_design_files(files: Vec<DesignFile>) -> (AstDesign, Vec<String>) {
    let mut names = Vec::new();
    let mut design = AstDesign::default();
    for file in files {
        let base = names.len() as u32;
        names.extend(file.names);
        for module in file.design.modules {
            design.modules.push(rebase_module(module, base));
        }
        if design.top.is_none() {
            design.top = file.design.top.map(|t| Ident::from_raw(t.as_raw() + base));
        }
    }
    (design, names)
}

fn rebase_module(mut module: grh_ast::AstModule, base: u32) -> grh_ast::AstModule {
    module.name = rebase(module.name, base);
    for p in &mut module.params {
        p.name = rebase(p.name, base);
    }
    for p in &mut module.ports {
        p.name = rebase(p.name, base);
    }
    for item in module.decls.iter_mut().chain(module.body.iter_mut()) {
        rebase_item(item, base);
    }
    module
}

fn rebase(ident: Ident, base: u32) -> Ident {
    Ident::from_raw(ident.as_raw() + base)
}

fn rebase_item(item: &mut grh_ast::AstItem, base: u32) {
    use grh_ast::AstItem::*;
    match item {
        ContinuousAssign { target, value, .. } => {
            rebase_expr(target, base);
            rebase_expr(value, base);
        }
        Always { edges, body, .. } => {
            for e in edges {
                e.signal = rebase(e.signal, base);
            }
            rebase_stmt(body, base);
        }
        Instance { module, name, params, connections, .. } => {
            *module = rebase(*module, base);
            *name = rebase(*name, base);
            for p in params {
                p.name = rebase(p.name, base);
            }
            for c in connections {
                c.port = rebase(c.port, base);
                rebase_expr(&mut c.value, base);
            }
        }
        Generate { genvar, body, .. } => {
            *genvar = rebase(*genvar, base);
            for i in body {
                rebase_item(i, base);
            }
        }
        DpiImport { name, arg_names, .. } => {
            *name = rebase(*name, base);
            for a in arg_names {
                *a = rebase(*a, base);
            }
        }
        NetDecl { name, .. } | RegDecl { name, .. } => *name = rebase(*name, base),
        MemDecl { name, .. } => *name = rebase(*name, base),
    }
}

fn rebase_expr(expr: &mut grh_ast::AstExpr, base: u32) {
    use grh_ast::AstExpr::*;
    match expr {
        Ref(name) => *name = rebase(*name, base),
        Const(_) => {}
        Unary { operand, .. } => rebase_expr(operand, base),
        Binary { lhs, rhs, .. } => {
            rebase_expr(lhs, base);
            rebase_expr(rhs, base);
        }
        Ternary { cond, then_value, else_value, .. } => {
            rebase_expr(cond, base);
            rebase_expr(then_value, base);
            rebase_expr(else_value, base);
        }
        Concat { parts, .. } => {
            for p in parts {
                rebase_expr(p, base);
            }
        }
        Replicate { value, .. } => rebase_expr(value, base),
        Index { base: b, index, .. } => {
            rebase_expr(b, base);
            rebase_expr(index, base);
        }
        PartSelect { base: b, .. } => rebase_expr(b, base),
        IndexedPartSelect { base: b, start, .. } => {
            rebase_expr(b, base);
            rebase_expr(start, base);
        }
        HierRef { path, .. } => {
            for p in path {
                *p = rebase(*p, base);
            }
        }
        DpiCall { target, args, .. } => {
            *target = rebase(*target, base);
            for a in args {
                rebase_expr(a, base);
            }
        }
    }
}

fn rebase_stmt(stmt: &mut grh_ast::AstStmt, base: u32) {
    use grh_ast::AstStmt::*;
    match stmt {
        Assign { target, value, .. } => {
            rebase_expr(target, base);
            rebase_expr(value, base);
        }
        If { cond, then_branch, else_branch, .. } => {
            rebase_expr(cond, base);
            rebase_stmt(then_branch, base);
            if let Some(e) = else_branch {
                rebase_stmt(e, base);
            }
        }
        Case { selector, arms, .. } => {
            rebase_expr(selector, base);
            for arm in arms {
                for l in &mut arm.labels {
                    rebase_expr(l, base);
                }
                rebase_stmt(&mut arm.body, base);
            }
        }
        Block(stmts) => {
            for s in stmts {
                rebase_stmt(s, base);
            }
        }
        For { init, cond, step, body, .. } => {
            rebase_stmt(init, base);
            rebase_expr(cond, base);
            rebase_stmt(step, base);
            rebase_stmt(body, base);
        }
        Foreach { array, index, body, .. } => {
            *array = rebase(*array, base);
            *index = rebase(*index, base);
            rebase_stmt(body, base);
        }
        Break(_) | Continue(_) | Finish(_) => {}
        Display { args, .. } => {
            for a in args {
                rebase_expr(a, base);
            }
        }
        Assert { cond, .. } => rebase_expr(cond, base),
    }
}
