//! Two-layer memoization: class string to AST, class string to CSS.
//!
//! Entries are only ever dropped all at once. Misses are cached as well, so a
//! malformed class is resolved once per cache lifetime.

use crate::ast::AstNode;
use crate::compiler::GenerationResult;
use crate::registry::UtilityCategory;
use parking_lot::Mutex;
use std::collections::HashMap;

/// AST for one class plus the category of the utility that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledClass {
    pub nodes: Vec<AstNode>,
    pub category: UtilityCategory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub ast_entries: usize,
    pub css_entries: usize,
    pub ast_hits: u64,
    pub ast_misses: u64,
    pub css_hits: u64,
    pub css_misses: u64,
}

#[derive(Default)]
struct CacheState {
    ast: HashMap<String, Option<CompiledClass>>,
    css: HashMap<String, Option<GenerationResult>>,
    ast_hits: u64,
    ast_misses: u64,
    css_hits: u64,
    css_misses: u64,
}

#[derive(Default)]
pub struct CompileCache {
    state: Mutex<CacheState>,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(entry)` on a hit, where `entry` may itself record a miss.
    pub fn ast(&self, key: &str) -> Option<Option<CompiledClass>> {
        let mut state = self.state.lock();
        match state.ast.get(key).cloned() {
            Some(entry) => {
                state.ast_hits += 1;
                Some(entry)
            }
            None => {
                state.ast_misses += 1;
                None
            }
        }
    }

    pub fn store_ast(&self, key: &str, entry: Option<CompiledClass>) {
        self.state.lock().ast.insert(key.to_string(), entry);
    }

    pub fn css(&self, key: &str) -> Option<Option<GenerationResult>> {
        let mut state = self.state.lock();
        match state.css.get(key).cloned() {
            Some(entry) => {
                state.css_hits += 1;
                Some(entry)
            }
            None => {
                state.css_misses += 1;
                None
            }
        }
    }

    pub fn store_css(&self, key: &str, entry: Option<GenerationResult>) {
        self.state.lock().css.insert(key.to_string(), entry);
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.ast.len() + state.css.len();
        *state = CacheState::default();
        tracing::debug!(dropped, "compile cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            ast_entries: state.ast.len(),
            css_entries: state.css.len(),
            ast_hits: state.ast_hits,
            ast_misses: state.ast_misses,
            css_hits: state.css_hits,
            css_misses: state.css_misses,
        }
    }
}

impl std::fmt::Debug for CompileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CompileCache").field(&self.stats()).finish()
    }
}
