use super::ThemeGetter;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

/// A node in the theme tree.
#[derive(Clone, PartialEq)]
pub enum ThemeValue {
    Str(String),
    List(Vec<ThemeValue>),
    Map(IndexMap<String, ThemeValue>),
    /// Only invoked when it sits directly at a category key.
    Function(ThemeFn),
}

type ThemeCallback = dyn Fn(&ThemeGetter<'_>) -> Option<ThemeValue> + Send + Sync;

/// Lazily computed theme content. Equality is identity.
#[derive(Clone)]
pub struct ThemeFn(Arc<ThemeCallback>);

impl ThemeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ThemeGetter<'_>) -> Option<ThemeValue> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, getter: &ThemeGetter<'_>) -> Option<ThemeValue> {
        (self.0)(getter)
    }
}

impl PartialEq for ThemeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ThemeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ThemeFn(..)")
    }
}

impl fmt::Debug for ThemeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeValue::Str(value) => write!(f, "{:?}", value),
            ThemeValue::List(items) => f.debug_list().entries(items).finish(),
            ThemeValue::Map(map) => f.debug_map().entries(map.iter()).finish(),
            ThemeValue::Function(func) => func.fmt(f),
        }
    }
}

impl ThemeValue {
    pub fn str(value: impl Into<String>) -> Self {
        ThemeValue::Str(value.into())
    }

    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ThemeValue)>,
    {
        ThemeValue::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&ThemeGetter<'_>) -> Option<ThemeValue> + Send + Sync + 'static,
    {
        ThemeValue::Function(ThemeFn::new(f))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ThemeValue::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ThemeValue>> {
        match self {
            ThemeValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Renders a scalar or list for use as a CSS value. Lists join with `, `.
    pub fn to_css_value(&self) -> Option<String> {
        match self {
            ThemeValue::Str(value) => Some(value.clone()),
            ThemeValue::List(items) => {
                let parts = items
                    .iter()
                    .map(ThemeValue::to_css_value)
                    .collect::<Option<Vec<_>>>()?;
                Some(parts.join(", "))
            }
            ThemeValue::Map(_) | ThemeValue::Function(_) => None,
        }
    }
}

impl From<&str> for ThemeValue {
    fn from(value: &str) -> Self {
        ThemeValue::Str(value.to_string())
    }
}

impl From<String> for ThemeValue {
    fn from(value: String) -> Self {
        ThemeValue::Str(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawThemeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<RawThemeValue>),
    Map(IndexMap<String, RawThemeValue>),
}

impl From<RawThemeValue> for ThemeValue {
    fn from(raw: RawThemeValue) -> Self {
        match raw {
            RawThemeValue::Bool(value) => ThemeValue::Str(value.to_string()),
            RawThemeValue::Int(value) => ThemeValue::Str(value.to_string()),
            RawThemeValue::Float(value) => ThemeValue::Str(value.to_string()),
            RawThemeValue::Str(value) => ThemeValue::Str(value),
            RawThemeValue::List(items) => {
                ThemeValue::List(items.into_iter().map(ThemeValue::from).collect())
            }
            RawThemeValue::Map(map) => ThemeValue::Map(
                map.into_iter()
                    .map(|(key, value)| (key, ThemeValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for ThemeValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawThemeValue::deserialize(deserializer).map(ThemeValue::from)
    }
}
