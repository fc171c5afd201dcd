//! Resolved configuration, theme and registry for one compiler instance.

use crate::cache::CompileCache;
use crate::config::Config;
use crate::plugin::{Plugin, PluginDiagnostic};
use crate::registry::{Utility, UtilityRegistry};
use crate::theme::{Theme, ThemePatch, ThemeResolver, ThemeValue, default_theme};
use crate::tokenizer::{UtilityKind, Vocabulary};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Theme categories exported by [`Context::css_vars`], with their variable
/// namespace.
const EXPORTED_CATEGORIES: [(&str, &str); 5] = [
    ("colors", "color"),
    ("spacing", "spacing"),
    ("fontSize", "font-size"),
    ("borderRadius", "radius"),
    ("screens", "breakpoint"),
];

pub struct Context {
    config: Config,
    theme: Theme,
    registry: Arc<UtilityRegistry>,
    cache: Arc<CompileCache>,
    diagnostics: Vec<PluginDiagnostic>,
    config_table: toml::Table,
}

pub fn create_context(config: Config) -> Context {
    Context::new(config)
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, UtilityRegistry::with_builtins())
    }

    pub fn with_registry(config: Config, registry: UtilityRegistry) -> Self {
        Self::build(config, Arc::new(registry), Arc::new(CompileCache::new()))
    }

    /// Builds a context that shares an existing cache. The cache is cleared
    /// unless `clear_cache_on_context_change` is off.
    pub fn with_cache(config: Config, registry: UtilityRegistry, cache: Arc<CompileCache>) -> Self {
        Self::build(config, Arc::new(registry), cache)
    }

    fn build(config: Config, registry: Arc<UtilityRegistry>, cache: Arc<CompileCache>) -> Self {
        let mut theme = Theme::from_categories(default_theme());
        for preset in &config.presets {
            theme.merge(&preset.theme);
        }
        theme.merge(&config.theme.values);
        theme.merge_extend(&config.theme.extend);

        let config_table = match toml::Value::try_from(&config) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => toml::Table::new(),
            Err(err) => {
                tracing::warn!(error = %err, "config could not be snapshotted for lookups");
                toml::Table::new()
            }
        };

        if config.clear_cache_on_context_change {
            cache.clear();
        }

        let plugins = config.plugins.clone();
        let mut context = Self {
            config,
            theme,
            registry,
            cache,
            diagnostics: Vec::new(),
            config_table,
        };
        context.run_plugins(&plugins);
        context
    }

    fn run_plugins(&mut self, plugins: &[Plugin]) {
        for plugin in plugins {
            let (handler, theme) = match plugin {
                Plugin::Function { handler, .. } => (Some(handler.clone()), None),
                Plugin::Object { handler, theme, .. } => (handler.clone(), Some(theme)),
            };

            let config = self.config.clone();
            // The theme hook shares the handler's failure boundary.
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                for (category, value) in theme.into_iter().flatten() {
                    self.theme.extend(category, ThemePatch::from(value.clone()));
                }
                match &handler {
                    Some(handler) => handler(self, &config),
                    None => Ok(()),
                }
            }));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.message,
                Err(payload) => panic_message(payload.as_ref()),
            };
            tracing::warn!(plugin = plugin.id(), %message, "plugin failed");
            self.diagnostics.push(PluginDiagnostic {
                plugin_id: plugin.id().to_string(),
                message,
            });
        }
    }

    pub fn settings(&self) -> &Config {
        &self.config
    }

    pub fn theme_tree(&self) -> &Theme {
        &self.theme
    }

    pub fn registry(&self) -> &UtilityRegistry {
        &self.registry
    }

    /// Shared handle, used when rebuilding a context around the same registry.
    pub fn registry_handle(&self) -> Arc<UtilityRegistry> {
        self.registry.clone()
    }

    pub fn cache(&self) -> &Arc<CompileCache> {
        &self.cache
    }

    pub fn diagnostics(&self) -> &[PluginDiagnostic] {
        &self.diagnostics
    }

    /// Resolves a dotted theme path such as `colors.red.500` or
    /// `colors.red-500`.
    pub fn theme(&self, path: &str) -> Option<ThemeValue> {
        self.theme.resolve_str(path)
    }

    /// Resolves a dotted path against the configuration, including keys this
    /// crate does not interpret. `theme` and `presets` may hold functions and
    /// are left out of the lookup table; read them through [`Context::theme`].
    pub fn config(&self, path: &str) -> Option<toml::Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.config_table.get(first)?;
        for segment in segments {
            current = match current {
                toml::Value::Table(table) => table.get(segment)?,
                toml::Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }

    /// Merges into one category and drops every cached compilation.
    pub fn extend_theme(&mut self, category: &str, patch: impl Into<ThemePatch>) {
        self.theme.extend(category, patch.into());
        self.cache.clear();
    }

    pub fn register_utility(&mut self, utility: Utility) {
        Arc::make_mut(&mut self.registry).register(utility);
        self.cache.clear();
    }

    pub fn has_preset(&self, name: &str) -> bool {
        self.config.presets.iter().any(|preset| preset.name == name)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// `:root` block exporting scalar theme values as custom properties.
    pub fn css_vars(&self) -> String {
        let mut declarations = Vec::new();
        for (category, namespace) in EXPORTED_CATEGORIES {
            if let Some(value) = self.theme.resolve(&[category]) {
                collect_vars(&value, namespace, &self.config.prefix, &mut declarations);
            }
        }
        if declarations.is_empty() {
            return String::new();
        }
        format!(":root {{ {} }}", declarations.join(" "))
    }
}

fn collect_vars(value: &ThemeValue, name: &str, prefix: &str, out: &mut Vec<String>) {
    match value {
        ThemeValue::Map(map) => {
            for (key, child) in map {
                let key = key.replace('.', "_");
                let child_name = if key == "DEFAULT" {
                    name.to_string()
                } else {
                    format!("{}-{}", name, key)
                };
                collect_vars(child, &child_name, prefix, out);
            }
        }
        scalar => {
            if let Some(css) = scalar.to_css_value() {
                out.push(format!("--{}{}: {};", prefix, name, css));
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "plugin panicked".to_string()
}

impl ThemeResolver for Context {
    fn theme_path(&self, path: &[&str]) -> Option<ThemeValue> {
        self.theme.resolve(path)
    }

    fn var_name(&self, name: &str) -> String {
        format!("--{}{}", self.config.prefix, name)
    }
}

impl Vocabulary for Context {
    fn utility_kind(&self, root: &str) -> Option<UtilityKind> {
        self.registry.kind(root)
    }

    fn is_screen(&self, name: &str) -> bool {
        self.theme.resolve(&["screens", name]).is_some()
    }

    fn is_container_size(&self, name: &str) -> bool {
        self.theme.resolve(&["containers", name]).is_some()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("prefix", &self.config.prefix)
            .field("categories", &self.theme.categories().collect::<Vec<_>>())
            .field("utilities", &self.registry.len())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, create_context};
    use crate::config::{Config, Preset};
    use crate::error::PluginError;
    use crate::plugin::Plugin;
    use crate::theme::{ThemePatch, ThemeResolver, ThemeValue};
    use indexmap::IndexMap;

    fn palette(entries: &[(&str, &str)]) -> IndexMap<String, ThemeValue> {
        let mut colors = IndexMap::new();
        colors.insert(
            "colors".to_string(),
            ThemeValue::map(
                entries
                    .iter()
                    .map(|(key, value)| (*key, ThemeValue::str(*value))),
            ),
        );
        colors
    }

    #[test]
    fn merges_presets_then_theme_then_extend() {
        let mut config = Config::default()
            .with_preset(Preset::new("brand", palette(&[("brand", "#111"), ("accent", "#222")])));
        config.theme.values = palette(&[("brand", "#333")]);
        config.theme.extend = palette(&[("extra", "#444")]);

        let ctx = create_context(config);
        assert_eq!(ctx.theme("colors.brand"), Some("#333".into()));
        assert_eq!(ctx.theme("colors.accent"), Some("#222".into()));
        assert_eq!(ctx.theme("colors.extra"), Some("#444".into()));
        assert_eq!(ctx.theme("colors.red.500"), Some("#ef4444".into()));
        assert!(ctx.has_preset("brand"));
        assert!(!ctx.has_preset("other"));
    }

    #[test]
    fn config_paths_reach_pass_through_keys() {
        let config = crate::config::parse("prefix = \"x-\"\n[important]\nselector = \"#app\"")
            .expect("config");
        let ctx = Context::new(config);
        assert_eq!(
            ctx.config("important.selector"),
            Some(toml::Value::String("#app".to_string()))
        );
        assert_eq!(ctx.config("prefix"), Some(toml::Value::String("x-".to_string())));
        assert_eq!(ctx.config("missing.key"), None);
        assert_eq!(ctx.config("theme.extend"), None);
    }

    #[test]
    fn failing_plugins_are_isolated() {
        let config = Config::default()
            .with_plugin(Plugin::function("first", |ctx, _| {
                ctx.extend_theme(
                    "colors",
                    ThemeValue::map([("first", ThemeValue::str("#100"))]),
                );
                Ok(())
            }))
            .with_plugin(Plugin::function("broken", |_, _| Err(PluginError::new("boom"))))
            .with_plugin(Plugin::function("panics", |_, _| panic!("kaboom")))
            .with_plugin(
                Plugin::object("last").with_theme(
                    "colors",
                    ThemeValue::map([("last", ThemeValue::str("#900"))]),
                ),
            );

        let ctx = Context::new(config);
        assert_eq!(ctx.theme("colors.first"), Some("#100".into()));
        assert_eq!(ctx.theme("colors.last"), Some("#900".into()));
        let ids = ctx
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.plugin_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["broken", "panics"]);
        assert_eq!(ctx.diagnostics()[1].message, "kaboom");
    }

    #[test]
    fn failing_theme_hook_is_isolated() {
        let config = Config::default()
            .with_plugin(
                Plugin::object("bad-theme")
                    .with_theme("colors", ThemeValue::function(|_| panic!("no palette"))),
            )
            .with_plugin(
                Plugin::object("good")
                    .with_theme("colors", ThemeValue::map([("ok", ThemeValue::str("#0a0"))])),
            );

        let ctx = Context::new(config);
        assert_eq!(ctx.theme("colors.ok"), Some("#0a0".into()));
        assert_eq!(ctx.theme("colors.red.500"), Some("#ef4444".into()));
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].plugin_id, "bad-theme");
        assert_eq!(ctx.diagnostics()[0].message, "no palette");
    }

    #[test]
    fn extend_theme_accepts_functions() {
        let mut ctx = Context::new(Config::default());
        ctx.extend_theme(
            "spacing",
            ThemePatch::Function(crate::theme::ThemeFn::new(|t| {
                let four = t.theme("spacing.4")?;
                Some(ThemeValue::map([("gutter", four)]))
            })),
        );
        assert_eq!(ctx.theme("spacing.gutter"), Some("1rem".into()));
        assert_eq!(ctx.theme("padding.gutter"), Some("1rem".into()));
    }

    #[test]
    fn variables_use_prefix() {
        let ctx = Context::new(Config::default());
        assert_eq!(ctx.var_name("blur"), "--barocss-blur");
        let vars = ctx.css_vars();
        assert!(vars.starts_with(":root { "));
        assert!(vars.contains("--barocss-color-red-500: #ef4444;"));
        assert!(vars.contains("--barocss-spacing-0_5: 0.125rem;"));
        assert!(vars.contains("--barocss-radius: 0.25rem;"));
    }
}
