//! User extensions run once against a freshly built context.

use crate::config::Config;
use crate::context::Context;
use crate::error::PluginError;
use crate::theme::ThemeValue;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

pub type PluginHandler =
    Arc<dyn Fn(&mut Context, &Config) -> Result<(), PluginError> + Send + Sync>;

#[derive(Clone)]
pub enum Plugin {
    Function {
        id: String,
        handler: PluginHandler,
    },
    /// Theme categories are merged via `extend` before the handler runs.
    Object {
        id: String,
        handler: Option<PluginHandler>,
        theme: IndexMap<String, ThemeValue>,
    },
}

impl Plugin {
    pub fn function<F>(id: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Context, &Config) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        Plugin::Function {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn object(id: impl Into<String>) -> Self {
        Plugin::Object {
            id: id.into(),
            handler: None,
            theme: IndexMap::new(),
        }
    }

    pub fn with_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&mut Context, &Config) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        match self {
            Plugin::Object { id, theme, .. } => Plugin::Object {
                id,
                handler: Some(Arc::new(handler)),
                theme,
            },
            Plugin::Function { id, .. } => Plugin::function(id, handler),
        }
    }

    pub fn with_theme(self, category: impl Into<String>, value: ThemeValue) -> Self {
        match self {
            Plugin::Object {
                id,
                handler,
                mut theme,
            } => {
                theme.insert(category.into(), value);
                Plugin::Object { id, handler, theme }
            }
            Plugin::Function { id, handler } => {
                let mut theme = IndexMap::new();
                theme.insert(category.into(), value);
                Plugin::Object {
                    id,
                    handler: Some(handler),
                    theme,
                }
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Plugin::Function { id, .. } | Plugin::Object { id, .. } => id,
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plugin::Function { id, .. } => f.debug_struct("Function").field("id", id).finish(),
            Plugin::Object { id, handler, theme } => f
                .debug_struct("Object")
                .field("id", id)
                .field("handler", &handler.is_some())
                .field("theme", &theme.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Failure recorded while running a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDiagnostic {
    pub plugin_id: String,
    pub message: String,
}
