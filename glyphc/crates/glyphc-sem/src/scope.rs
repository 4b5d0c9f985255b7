//! Symbol tables (SPEC §3's "Symbol Table" = a scope).
//!
//! Grounded on the donor workspace's `ScopeTree`/`Rib` model: a flat arena
//! of scopes linked by parent id, with `enter`/`exit` tracking the current
//! scope during a tree walk and `resolve` walking the parent chain.
//! Generalized here to record *which* scope hit a lookup (needed for
//! shadowing diagnostics) and to keep symbols in declaration order per
//! SPEC §3's "ordered list".

use std::collections::HashMap;

use glyphc_util::{Idx, IndexVec, Symbol};

use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl Idx for ScopeId {
    fn from_usize(idx: usize) -> Self {
        ScopeId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    HardcodedFunction,
}

/// One named binding. `definition_node` points at the AST node that
/// introduced it (a `VarDef`, `Param`, or `Function` node); hardcoded
/// functions have no AST node and use `NodeIndex::NONE`.
#[derive(Debug, Clone, Copy)]
pub struct SymbolEntry {
    pub kind: SymbolKind,
    pub name_id: Symbol,
    pub type_id: TypeId,
    pub definition_node: glyphc_par::ast::NodeIndex,
}

#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    /// Declaration-ordered; later entries shadow earlier ones with the
    /// same name within this same scope.
    symbols: Vec<SymbolEntry>,
    by_name: HashMap<Symbol, usize>,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Self { parent, symbols: Vec::new(), by_name: HashMap::new() }
    }

    /// Look up a name within this scope only (no parent walk). Returns the
    /// most recent declaration if shadowed within the same scope.
    pub fn lookup_local(&self, name: Symbol) -> Option<&SymbolEntry> {
        self.by_name.get(&name).map(|&i| &self.symbols[i])
    }

    pub fn symbols(&self) -> &[SymbolEntry] {
        &self.symbols
    }
}

/// Owns every scope created during analysis and tracks which one is
/// "current" during the tree walk.
pub struct ScopeTree {
    scopes: IndexVec<ScopeId, Scope>,
    current: ScopeId,
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        let global = scopes.push(Scope::new(None));
        Self { scopes, current: global }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn enter(&mut self) -> ScopeId {
        let parent = self.current;
        let new_scope = self.scopes.push(Scope::new(Some(parent)));
        self.current = new_scope;
        new_scope
    }

    pub fn exit(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    /// Declare `entry` in the current scope. Returns `false` (without
    /// inserting) if the name is already bound in this same scope — the
    /// caller turns that into a duplicate-definition diagnostic.
    pub fn declare(&mut self, entry: SymbolEntry) -> bool {
        let scope = &mut self.scopes[self.current];
        if scope.by_name.contains_key(&entry.name_id) {
            return false;
        }
        let index = scope.symbols.len();
        scope.by_name.insert(entry.name_id, index);
        scope.symbols.push(entry);
        true
    }

    /// Declare into a specific scope (used for hardcoded functions, which
    /// are registered into the global scope regardless of what's current).
    pub fn declare_in(&mut self, scope_id: ScopeId, entry: SymbolEntry) -> bool {
        let scope = &mut self.scopes[scope_id];
        if scope.by_name.contains_key(&entry.name_id) {
            return false;
        }
        let index = scope.symbols.len();
        scope.by_name.insert(entry.name_id, index);
        scope.symbols.push(entry);
        true
    }

    /// Walk the scope chain from `start`, returning the first hit and
    /// whether it was found in `start` itself (as opposed to an ancestor).
    pub fn resolve_from(&self, start: ScopeId, name: Symbol) -> Option<(SymbolEntry, bool)> {
        let mut scope_id = start;
        let mut is_current = true;
        loop {
            let scope = &self.scopes[scope_id];
            if let Some(entry) = scope.lookup_local(name) {
                return Some((*entry, is_current));
            }
            match scope.parent {
                Some(parent) => {
                    scope_id = parent;
                    is_current = false;
                }
                None => return None,
            }
        }
    }

    pub fn resolve(&self, name: Symbol) -> Option<(SymbolEntry, bool)> {
        self.resolve_from(self.current, name)
    }

    pub fn get(&self, scope_id: ScopeId) -> &Scope {
        &self.scopes[scope_id]
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
