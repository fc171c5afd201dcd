//! Pluggable utility converters keyed by root name.
//!
//! The compiler only sees [`UtilityRegistry`]; the converters in
//! [`builtin`] are one registration set among others.

mod builtin;

use crate::ast::AstNode;
use crate::theme::ThemeResolver;
use crate::tokenizer::{ParsedToken, UtilityKind};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

pub type UtilityHandler =
    Arc<dyn Fn(&ParsedToken, &dyn ThemeResolver) -> Option<Vec<AstNode>> + Send + Sync>;

/// Coarse ordering class. Layout results are applied before paint results
/// during the initial scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UtilityCategory {
    Layout,
    #[default]
    Paint,
}

#[derive(Clone)]
pub struct Utility {
    pub name: String,
    pub category: UtilityCategory,
    pub accepts_bare: bool,
    pub accepts_value: bool,
    handler: UtilityHandler,
}

impl Utility {
    /// A utility that takes a value: `p-4`, `bg-[#fff]`.
    pub fn new<F>(name: impl Into<String>, category: UtilityCategory, handler: F) -> Self
    where
        F: Fn(&ParsedToken, &dyn ThemeResolver) -> Option<Vec<AstNode>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            category,
            accepts_bare: false,
            accepts_value: true,
            handler: Arc::new(handler),
        }
    }

    /// A utility used without a value: `flex`, `relative`.
    pub fn bare<F>(name: impl Into<String>, category: UtilityCategory, handler: F) -> Self
    where
        F: Fn(&ParsedToken, &dyn ThemeResolver) -> Option<Vec<AstNode>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            category,
            accepts_bare: true,
            accepts_value: false,
            handler: Arc::new(handler),
        }
    }

    /// Also accept the bare form (`rounded` next to `rounded-lg`).
    pub fn with_bare(mut self) -> Self {
        self.accepts_bare = true;
        self
    }

    pub fn call(&self, token: &ParsedToken, theme: &dyn ThemeResolver) -> Option<Vec<AstNode>> {
        if token.value.is_none() && !self.accepts_bare {
            return None;
        }
        if token.value.is_some() && !self.accepts_value {
            return None;
        }
        (self.handler)(token, theme).filter(|nodes| !nodes.is_empty())
    }
}

impl fmt::Debug for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utility")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("accepts_bare", &self.accepts_bare)
            .field("accepts_value", &self.accepts_value)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UtilityRegistry {
    utilities: IndexMap<String, Vec<Utility>>,
}

impl UtilityRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Several utilities may share a root; the most recently registered one
    /// is tried first.
    pub fn register(&mut self, utility: Utility) {
        self.utilities
            .entry(utility.name.clone())
            .or_default()
            .push(utility);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.utilities.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.utilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utilities.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.utilities.keys().map(String::as_str)
    }

    pub fn kind(&self, name: &str) -> Option<UtilityKind> {
        let entries = self.utilities.get(name)?;
        Some(UtilityKind {
            accepts_bare: entries.iter().any(|utility| utility.accepts_bare),
            accepts_value: entries.iter().any(|utility| utility.accepts_value),
        })
    }

    pub fn resolve(
        &self,
        token: &ParsedToken,
        theme: &dyn ThemeResolver,
    ) -> Option<(Vec<AstNode>, UtilityCategory)> {
        let entries = self.utilities.get(token.utility.as_str())?;
        entries
            .iter()
            .rev()
            .find_map(|utility| utility.call(token, theme).map(|nodes| (nodes, utility.category)))
    }
}
