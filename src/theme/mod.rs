//! Theme tree, merge rules and path resolution.
//!
//! A theme maps category names (`colors`, `spacing`, `screens`, ...) to value
//! trees. A category may instead be a [`ThemeFn`], evaluated on every lookup
//! with a [`ThemeGetter`] so it can read other categories. Functions nested
//! below the category level are never invoked.

mod defaults;
mod value;

pub use defaults::default_theme;
pub(crate) use defaults::trim_float;
pub use value::{ThemeFn, ThemeValue};

use indexmap::IndexMap;
use std::cell::RefCell;

/// Read access to a resolved theme, as seen by utilities and plugins.
pub trait ThemeResolver {
    fn theme_path(&self, path: &[&str]) -> Option<ThemeValue>;

    /// Name of a generated custom property, namespaced by the configured prefix.
    fn var_name(&self, name: &str) -> String;

    fn theme(&self, path: &str) -> Option<ThemeValue> {
        let segments = path.split('.').collect::<Vec<_>>();
        self.theme_path(&segments)
    }

    fn theme_css(&self, path: &[&str]) -> Option<String> {
        self.theme_path(path)?.to_css_value()
    }
}

/// Value handed to [`Theme::extend`].
#[derive(Debug, Clone)]
pub enum ThemePatch {
    Value(ThemeValue),
    /// Evaluated once against the current theme; the result is merged.
    Function(ThemeFn),
}

impl From<ThemeValue> for ThemePatch {
    fn from(value: ThemeValue) -> Self {
        match value {
            ThemeValue::Function(func) => ThemePatch::Function(func),
            other => ThemePatch::Value(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Theme {
    categories: IndexMap<String, ThemeValue>,
}

impl Theme {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_categories(categories: IndexMap<String, ThemeValue>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn category(&self, name: &str) -> Option<&ThemeValue> {
        self.categories.get(name)
    }

    /// Deep-merges `layer` over this theme. Later values win; functions are
    /// replaced rather than merged.
    pub fn merge(&mut self, layer: &IndexMap<String, ThemeValue>) {
        for (key, value) in layer {
            match self.categories.get_mut(key) {
                Some(existing) => deep_merge(existing, value),
                None => {
                    self.categories.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Applies an `extend` layer: every entry is deep-merged into its
    /// category, composing with category functions instead of replacing them.
    pub fn merge_extend(&mut self, layer: &IndexMap<String, ThemeValue>) {
        for (category, value) in layer {
            self.merge_category(category, ThemePatch::from(value.clone()), true);
        }
    }

    /// Shallow-merges a patch into one category.
    pub fn extend(&mut self, category: &str, patch: ThemePatch) {
        self.merge_category(category, patch, false);
    }

    fn merge_category(&mut self, category: &str, patch: ThemePatch, deep: bool) {
        let addition = match patch {
            ThemePatch::Value(value) => value,
            ThemePatch::Function(func) => match func.call(&ThemeGetter::new(self)) {
                Some(value) => value,
                None => return,
            },
        };

        let Some(existing) = self.categories.get_mut(category) else {
            self.categories.insert(category.to_string(), addition);
            return;
        };

        if let ThemeValue::Function(previous) = existing {
            let previous = previous.clone();
            *existing = ThemeValue::function(move |getter| {
                let mut base = previous.call(getter).unwrap_or(ThemeValue::Map(IndexMap::new()));
                merge_into(&mut base, &addition, deep);
                Some(base)
            });
            return;
        }

        merge_into(existing, &addition, deep);
    }

    pub fn resolve(&self, path: &[&str]) -> Option<ThemeValue> {
        ThemeGetter::new(self).theme_path(path)
    }

    pub fn resolve_str(&self, path: &str) -> Option<ThemeValue> {
        ThemeGetter::new(self).theme(path)
    }
}

fn merge_into(target: &mut ThemeValue, addition: &ThemeValue, deep: bool) {
    if deep {
        deep_merge(target, addition);
        return;
    }
    match (target, addition) {
        (ThemeValue::Map(target), ThemeValue::Map(addition)) => {
            for (key, value) in addition {
                target.insert(key.clone(), value.clone());
            }
        }
        (target, addition) => *target = addition.clone(),
    }
}

fn deep_merge(target: &mut ThemeValue, addition: &ThemeValue) {
    match (target, addition) {
        (ThemeValue::Map(target), ThemeValue::Map(addition)) => {
            for (key, value) in addition {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, addition) => *target = addition.clone(),
    }
}

/// Resolver scoped to one top-level lookup. Category functions receive it and
/// may call back into the theme; paths already being resolved further up the
/// call stack yield `None`.
pub struct ThemeGetter<'a> {
    theme: &'a Theme,
    in_flight: RefCell<Vec<String>>,
}

impl<'a> ThemeGetter<'a> {
    fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            in_flight: RefCell::new(Vec::new()),
        }
    }

    pub fn theme(&self, path: &str) -> Option<ThemeValue> {
        let segments = path.split('.').collect::<Vec<_>>();
        self.theme_path(&segments)
    }

    pub fn theme_path(&self, path: &[&str]) -> Option<ThemeValue> {
        let segments = normalize_path(path);
        let (category, rest) = segments.split_first()?;
        let key = segments.join(".");

        if self.in_flight.borrow().iter().any(|entry| entry == &key) {
            tracing::trace!(path = %key, "recursive theme lookup");
            return None;
        }

        let root = match self.theme.categories.get(category.as_str())? {
            ThemeValue::Function(func) => {
                self.in_flight.borrow_mut().push(key.clone());
                let value = func.call(self);
                self.in_flight.borrow_mut().pop();
                value?
            }
            value => value.clone(),
        };

        let rest = rest.iter().map(String::as_str).collect::<Vec<_>>();
        let resolved = navigate(&root, &rest)?;
        match resolved {
            ThemeValue::Function(_) => None,
            value => Some(value.clone()),
        }
    }
}

fn navigate<'v>(value: &'v ThemeValue, path: &[&str]) -> Option<&'v ThemeValue> {
    let Some((head, tail)) = path.split_first() else {
        return Some(value);
    };
    match value {
        ThemeValue::Map(map) => {
            if let Some(next) = map.get(*head) {
                if let Some(found) = navigate(next, tail) {
                    return Some(found);
                }
            }
            // keys such as `0.5` contain the separator
            let joined = path.join(".");
            map.get(joined.as_str()).filter(|_| path.len() > 1)
        }
        ThemeValue::List(items) => {
            let idx = head.parse::<usize>().ok()?;
            navigate(items.get(idx)?, tail)
        }
        ThemeValue::Str(_) | ThemeValue::Function(_) => None,
    }
}

/// `colors.red-500` addresses `colors.red.500`; names that are not strictly
/// `letters-digits` (for example `brand-primary`) stay single keys.
fn normalize_path(path: &[&str]) -> Vec<String> {
    let mut segments = Vec::with_capacity(path.len() + 1);
    for (idx, segment) in path.iter().enumerate() {
        if idx > 0 && path[0] == "colors" {
            if let Some((name, shade)) = split_color_shade(segment) {
                segments.push(name.to_string());
                segments.push(shade.to_string());
                continue;
            }
        }
        segments.push(segment.to_string());
    }
    segments
}

fn split_color_shade(segment: &str) -> Option<(&str, &str)> {
    let (name, shade) = segment.split_once('-')?;
    if name.is_empty() || shade.is_empty() {
        return None;
    }
    if !name.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return None;
    }
    if !shade.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    Some((name, shade))
}

#[cfg(test)]
mod tests {
    use super::{Theme, ThemePatch, ThemeValue, normalize_path};
    use indexmap::IndexMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn theme_with(entries: Vec<(&str, ThemeValue)>) -> Theme {
        Theme::from_categories(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }

    fn palette() -> ThemeValue {
        ThemeValue::map([
            (
                "red",
                ThemeValue::map([("500", ThemeValue::str("#ef4444"))]),
            ),
            ("brand-primary", ThemeValue::str("#123456")),
        ])
    }

    #[test]
    fn splits_letters_digits_color_keys() {
        let theme = theme_with(vec![("colors", palette())]);
        assert_eq!(theme.resolve_str("colors.red-500"), Some("#ef4444".into()));
        assert_eq!(theme.resolve_str("colors.red.500"), Some("#ef4444".into()));
        assert_eq!(
            theme.resolve_str("colors.brand-primary"),
            Some("#123456".into())
        );
        assert_eq!(
            normalize_path(&["colors", "light-blue-500"]),
            vec!["colors".to_string(), "light-blue-500".to_string()]
        );
    }

    #[test]
    fn self_referential_category_resolves_to_none() {
        let theme = theme_with(vec![("x", ThemeValue::function(|t| t.theme("x")))]);
        assert_eq!(theme.resolve_str("x"), None);
    }

    #[test]
    fn category_functions_can_read_other_categories() {
        let theme = theme_with(vec![
            ("spacing", ThemeValue::map([("4", ThemeValue::str("1rem"))])),
            ("padding", ThemeValue::function(|t| t.theme("spacing"))),
        ]);
        assert_eq!(theme.resolve_str("padding.4"), Some("1rem".into()));
    }

    #[test]
    fn leaf_functions_are_never_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let theme = theme_with(vec![(
            "spacing",
            ThemeValue::map([(
                "4",
                ThemeValue::function(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Some(ThemeValue::str("1rem"))
                }),
            )]),
        )]);
        assert_eq!(theme.resolve_str("spacing.4"), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dotted_keys_resolve() {
        let theme = theme_with(vec![(
            "spacing",
            ThemeValue::map([("0.5", ThemeValue::str("0.125rem"))]),
        )]);
        assert_eq!(theme.resolve_str("spacing.0.5"), Some("0.125rem".into()));
        assert_eq!(theme.resolve(&["spacing", "0.5"]), Some("0.125rem".into()));
    }

    #[test]
    fn extend_shallow_merges_category() {
        let mut theme = theme_with(vec![("colors", palette())]);
        theme.extend(
            "colors",
            ThemePatch::Value(ThemeValue::map([("red", ThemeValue::str("#f00"))])),
        );
        assert_eq!(theme.resolve_str("colors.red"), Some("#f00".into()));
        assert_eq!(
            theme.resolve_str("colors.brand-primary"),
            Some("#123456".into())
        );
    }

    #[test]
    fn extend_function_sees_current_theme() {
        let mut theme = theme_with(vec![(
            "spacing",
            ThemeValue::map([("4", ThemeValue::str("1rem"))]),
        )]);
        theme.extend(
            "width",
            ThemePatch::Function(super::ThemeFn::new(|t| {
                let four = t.theme("spacing.4")?;
                Some(ThemeValue::map([("card", four)]))
            })),
        );
        assert_eq!(theme.resolve_str("width.card"), Some("1rem".into()));
    }

    #[test]
    fn extend_composes_with_category_function() {
        let mut theme = theme_with(vec![
            ("spacing", ThemeValue::map([("4", ThemeValue::str("1rem"))])),
            ("padding", ThemeValue::function(|t| t.theme("spacing"))),
        ]);
        theme.extend(
            "padding",
            ThemePatch::Value(ThemeValue::map([("gutter", ThemeValue::str("2rem"))])),
        );
        assert_eq!(theme.resolve_str("padding.4"), Some("1rem".into()));
        assert_eq!(theme.resolve_str("padding.gutter"), Some("2rem".into()));
    }

    #[test]
    fn deep_merge_keeps_sibling_keys() {
        let mut theme = theme_with(vec![("colors", palette())]);
        let mut layer = IndexMap::new();
        layer.insert(
            "colors".to_string(),
            ThemeValue::map([("red", ThemeValue::map([("600", ThemeValue::str("#dc2626"))]))]),
        );
        theme.merge(&layer);
        assert_eq!(theme.resolve_str("colors.red.500"), Some("#ef4444".into()));
        assert_eq!(theme.resolve_str("colors.red.600"), Some("#dc2626".into()));
    }
}
