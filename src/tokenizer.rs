//! Splits one class string into variants, utility root, value and flags.
//!
//! Parsing is total: anything that cannot be fully understood yields `None`
//! and the class compiles to nothing.

use crate::variant::{VariantKind, classify_variant};

/// Type hints accepted before a `:` inside `[...]` and `(...)` values.
pub const TYPE_HINTS: [&str; 18] = [
    "color",
    "length",
    "percentage",
    "number",
    "integer",
    "url",
    "image",
    "position",
    "angle",
    "any",
    "family-name",
    "absolute-size",
    "relative-size",
    "line-width",
    "bg-size",
    "shadow",
    "vector",
    "ratio",
];

/// What the tokenizer needs to know about the active context.
pub trait Vocabulary {
    fn utility_kind(&self, root: &str) -> Option<UtilityKind>;
    fn is_screen(&self, name: &str) -> bool;
    fn is_container_size(&self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtilityKind {
    /// `rounded`, `flex`: usable without a value.
    pub accepts_bare: bool,
    /// `p-4`, `bg-[#fff]`: usable with a value after the root.
    pub accepts_value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub raw: String,
    pub kind: VariantKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtilityValue {
    Keyword(String),
    Number(String),
    Fraction { numerator: String, denominator: String },
    /// `[...]` with underscores already turned into spaces.
    Arbitrary { value: String, hint: Option<String> },
    /// `(--name)` or `(color:--name)`.
    CustomProperty { name: String, hint: Option<String> },
}

impl UtilityValue {
    /// Theme lookup key, for shapes that can address the theme.
    pub fn theme_key(&self) -> Option<String> {
        match self {
            UtilityValue::Keyword(value) | UtilityValue::Number(value) => Some(value.clone()),
            UtilityValue::Fraction {
                numerator,
                denominator,
            } => Some(format!("{}/{}", numerator, denominator)),
            UtilityValue::Arbitrary { .. } | UtilityValue::CustomProperty { .. } => None,
        }
    }

    /// Literal CSS for shapes that bypass the theme.
    pub fn literal(&self) -> Option<String> {
        match self {
            UtilityValue::Arbitrary { value, .. } => Some(value.clone()),
            UtilityValue::CustomProperty { name, .. } => Some(format!("var({})", name)),
            _ => None,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            UtilityValue::Arbitrary { hint, .. } | UtilityValue::CustomProperty { hint, .. } => {
                hint.as_deref()
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Named(String),
    Arbitrary(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    pub raw: String,
    pub variants: Vec<VariantSpec>,
    /// Registered root, or the property name for `[prop:value]` classes.
    pub utility: String,
    pub value: Option<UtilityValue>,
    pub modifier: Option<Modifier>,
    pub negative: bool,
    pub important: bool,
    pub arbitrary_property: bool,
}

impl ParsedToken {
    pub fn is_arbitrary(&self) -> bool {
        matches!(self.value, Some(UtilityValue::Arbitrary { .. }))
    }

    pub fn is_custom_property(&self) -> bool {
        matches!(self.value, Some(UtilityValue::CustomProperty { .. }))
    }
}

pub fn parse_class(raw: &str, vocab: &dyn Vocabulary) -> Option<ParsedToken> {
    let class = raw.trim();
    if class.is_empty() || class.chars().any(char::is_whitespace) {
        return None;
    }

    let mut segments = split_top_level(class, ':');
    let base = segments.pop()?;
    let mut variants = Vec::with_capacity(segments.len());
    for segment in segments {
        if segment.is_empty() {
            return None;
        }
        let kind = classify_variant(segment, vocab)?;
        variants.push(VariantSpec {
            raw: segment.to_string(),
            kind,
        });
    }

    let (base, important) = strip_important(base);
    let (base, negative) = match base.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (base, false),
    };
    if base.is_empty() {
        return None;
    }

    let mut token = ParsedToken {
        raw: class.to_string(),
        variants,
        utility: String::new(),
        value: None,
        modifier: None,
        negative,
        important,
        arbitrary_property: false,
    };

    if base.starts_with('[') {
        if negative {
            return None;
        }
        let (property, value) = parse_arbitrary_property(base)?;
        token.utility = property;
        token.value = Some(UtilityValue::Arbitrary { value, hint: None });
        token.arbitrary_property = true;
        return Some(token);
    }

    if accepts_bare(vocab, base) {
        token.utility = base.to_string();
        return Some(token);
    }

    if let Some((head, modifier)) = split_modifier(base) {
        if accepts_bare(vocab, head) {
            token.utility = head.to_string();
            token.modifier = Some(parse_modifier(modifier)?);
            return Some(token);
        }
    }

    for (root, rest) in root_candidates(base) {
        let Some(kind) = vocab.utility_kind(root) else {
            continue;
        };
        if !kind.accepts_value {
            continue;
        }
        let Some((value, modifier)) = parse_value(rest) else {
            continue;
        };
        if negative && matches!(value, UtilityValue::Arbitrary { .. }) {
            tracing::trace!(class, "negative arbitrary value rejected");
            return None;
        }
        token.utility = root.to_string();
        token.value = Some(value);
        token.modifier = modifier;
        return Some(token);
    }

    tracing::trace!(class, "no utility root matched");
    None
}

fn accepts_bare(vocab: &dyn Vocabulary, root: &str) -> bool {
    vocab
        .utility_kind(root)
        .map(|kind| kind.accepts_bare)
        .unwrap_or(false)
}

fn strip_important(base: &str) -> (&str, bool) {
    if let Some(rest) = base.strip_prefix('!') {
        return (rest, true);
    }
    if let Some(rest) = base.strip_suffix('!') {
        return (rest, true);
    }
    (base, false)
}

/// `(root, rest)` pairs, longest root first. Dashes inside a bracketed or
/// parenthesized value never split the root.
fn root_candidates(base: &str) -> Vec<(&str, &str)> {
    let limit = base.find(['[', '(']).unwrap_or(base.len());
    base[..limit]
        .char_indices()
        .filter(|(idx, ch)| *ch == '-' && *idx > 0)
        .map(|(idx, _)| (&base[..idx], &base[idx + 1..]))
        .rev()
        .collect()
}

fn parse_value(rest: &str) -> Option<(UtilityValue, Option<Modifier>)> {
    if rest.is_empty() {
        return None;
    }
    if let Some(fraction) = parse_fraction(rest) {
        return Some((fraction, None));
    }
    let (value, modifier) = match split_modifier(rest) {
        Some((value, modifier)) => (value, Some(parse_modifier(modifier)?)),
        None => (rest, None),
    };
    Some((parse_shape(value)?, modifier))
}

fn parse_shape(value: &str) -> Option<UtilityValue> {
    if value.starts_with('(') {
        return parse_custom_property(value);
    }
    if value.starts_with('[') {
        let inner = bracket_inner(value, '[', ']')?;
        let (hint, body) = split_type_hint(inner)?;
        let normalized = normalize_arbitrary(body);
        if normalized.trim().is_empty() {
            return None;
        }
        return Some(UtilityValue::Arbitrary {
            value: normalized,
            hint,
        });
    }
    if is_number(value) {
        return Some(UtilityValue::Number(value.to_string()));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_'))
    {
        return Some(UtilityValue::Keyword(value.to_string()));
    }
    None
}

fn parse_custom_property(value: &str) -> Option<UtilityValue> {
    let inner = bracket_inner(value, '(', ')')?;
    let (hint, name) = match inner.split_once(':') {
        Some((hint, name)) if TYPE_HINTS.contains(&hint) => (Some(hint.to_string()), name),
        Some(_) => return None,
        None => (None, inner),
    };
    let tail = name.strip_prefix("--")?;
    if tail.is_empty()
        || !tail
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return None;
    }
    Some(UtilityValue::CustomProperty {
        name: name.to_string(),
        hint,
    })
}

fn parse_fraction(value: &str) -> Option<UtilityValue> {
    let (numerator, denominator) = value.split_once('/')?;
    let digits = |part: &str| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit());
    if !digits(numerator) || !digits(denominator) {
        return None;
    }
    Some(UtilityValue::Fraction {
        numerator: numerator.to_string(),
        denominator: denominator.to_string(),
    })
}

fn parse_modifier(raw: &str) -> Option<Modifier> {
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('[') {
        let inner = bracket_inner(raw, '[', ']')?;
        let normalized = normalize_arbitrary(inner);
        if normalized.trim().is_empty() {
            return None;
        }
        return Some(Modifier::Arbitrary(normalized));
    }
    if raw
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_'))
    {
        return Some(Modifier::Named(raw.to_string()));
    }
    None
}

fn parse_arbitrary_property(base: &str) -> Option<(String, String)> {
    let inner = bracket_inner(base, '[', ']')?;
    let colon = find_top_level(inner, ':')?;
    let property = &inner[..colon];
    let value = normalize_arbitrary(&inner[colon + 1..]);
    let valid_property = !property.is_empty()
        && property
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
        && property.chars().any(|ch| ch.is_ascii_alphabetic());
    if !valid_property || value.trim().is_empty() {
        return None;
    }
    Some((property.to_string(), value))
}

/// Inner text of a fully enclosed, balanced group, or `None`.
pub(crate) fn bracket_inner(value: &str, open: char, close: char) -> Option<&str> {
    let inner = value.strip_prefix(open)?.strip_suffix(close)?;
    if inner.is_empty() || !is_balanced(inner) {
        return None;
    }
    Some(inner)
}

fn is_balanced(value: &str) -> bool {
    let mut stack = Vec::new();
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '(' | '[' | '{' => stack.push(ch),
            ')' => {
                if stack.pop() != Some('(') {
                    return false;
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            }
            '}' => {
                if stack.pop() != Some('{') {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty() && !escaped
}

/// A top-level `:` inside an arbitrary value is only allowed after a type hint.
fn split_type_hint(inner: &str) -> Option<(Option<String>, &str)> {
    let Some(colon) = find_top_level(inner, ':') else {
        return Some((None, inner));
    };
    let hint = &inner[..colon];
    if !TYPE_HINTS.contains(&hint) {
        return None;
    }
    let body = &inner[colon + 1..];
    if find_top_level(body, ':').is_some() {
        return None;
    }
    Some((Some(hint.to_string()), body))
}

fn split_modifier(value: &str) -> Option<(&str, &str)> {
    let slash = find_last_top_level(value, '/')?;
    Some((&value[..slash], &value[slash + 1..]))
}

fn is_number(value: &str) -> bool {
    let mut parts = value.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    let digits = |part: &str| part.chars().all(|ch| ch.is_ascii_digit());
    match fraction {
        Some(fraction) => {
            !fraction.is_empty() && digits(whole) && digits(fraction) && !whole.is_empty()
        }
        None => !whole.is_empty() && digits(whole),
    }
}

/// Underscores become spaces; `\_` keeps a literal underscore.
pub(crate) fn normalize_arbitrary(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'_') => {
                out.push('_');
                chars.next();
            }
            '_' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

/// Splits on `delimiter` outside brackets, parentheses and quotes.
pub(crate) fn split_top_level(value: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0usize;
    for idx in top_level_positions(value, delimiter) {
        parts.push(&value[start..idx]);
        start = idx + delimiter.len_utf8();
    }
    parts.push(&value[start..]);
    parts
}

fn find_top_level(value: &str, needle: char) -> Option<usize> {
    top_level_positions(value, needle).into_iter().next()
}

fn find_last_top_level(value: &str, needle: char) -> Option<usize> {
    top_level_positions(value, needle).into_iter().last()
}

fn top_level_positions(value: &str, needle: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' | '\'' => match quote {
                Some(open) if open == ch => quote = None,
                None => quote = Some(ch),
                _ => {}
            },
            _ if quote.is_some() => {}
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            _ if ch == needle && bracket_depth == 0 && paren_depth == 0 => positions.push(idx),
            _ => {}
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::{
        Modifier, UtilityKind, UtilityValue, Vocabulary, normalize_arbitrary, parse_class,
        split_top_level,
    };
    use crate::variant::VariantKind;

    struct Fixture;

    impl Vocabulary for Fixture {
        fn utility_kind(&self, root: &str) -> Option<UtilityKind> {
            let value = UtilityKind {
                accepts_bare: false,
                accepts_value: true,
            };
            let bare = UtilityKind {
                accepts_bare: true,
                accepts_value: false,
            };
            match root {
                "bg" | "p" | "mt" | "w" | "text" | "translate-x" => Some(value),
                "rounded" => Some(UtilityKind {
                    accepts_bare: true,
                    accepts_value: true,
                }),
                "flex" | "inline-block" | "@container" => Some(bare),
                _ => None,
            }
        }

        fn is_screen(&self, name: &str) -> bool {
            matches!(name, "sm" | "md" | "lg")
        }

        fn is_container_size(&self, name: &str) -> bool {
            matches!(name, "sm" | "md")
        }
    }

    #[test]
    fn splits_variants_in_source_order() {
        let token = parse_class("sm:hover:bg-red-500", &Fixture).expect("token");
        let kinds = token.variants.iter().map(|v| v.kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![VariantKind::Breakpoint, VariantKind::PseudoClass]);
        assert_eq!(token.utility, "bg");
        assert_eq!(token.value, Some(UtilityValue::Keyword("red-500".to_string())));
    }

    #[test]
    fn brackets_protect_colons() {
        let token = parse_class("[&:nth-child(3)]:p-[calc(1rem_+_2px)]", &Fixture).expect("token");
        assert_eq!(token.variants.len(), 1);
        assert_eq!(token.variants[0].raw, "[&:nth-child(3)]");
        assert_eq!(
            token.value,
            Some(UtilityValue::Arbitrary {
                value: "calc(1rem + 2px)".to_string(),
                hint: None,
            })
        );
    }

    #[test]
    fn value_shapes_follow_priority() {
        let custom = parse_class("bg-(color:--brand)", &Fixture).expect("custom");
        assert_eq!(
            custom.value,
            Some(UtilityValue::CustomProperty {
                name: "--brand".to_string(),
                hint: Some("color".to_string()),
            })
        );
        let fraction = parse_class("w-1/2", &Fixture).expect("fraction");
        assert_eq!(
            fraction.value,
            Some(UtilityValue::Fraction {
                numerator: "1".to_string(),
                denominator: "2".to_string(),
            })
        );
        let number = parse_class("p-0.5", &Fixture).expect("number");
        assert_eq!(number.value, Some(UtilityValue::Number("0.5".to_string())));
    }

    #[test]
    fn slash_modifier_splits_after_value() {
        let token = parse_class("bg-red-500/50", &Fixture).expect("token");
        assert_eq!(token.value, Some(UtilityValue::Keyword("red-500".to_string())));
        assert_eq!(token.modifier, Some(Modifier::Named("50".to_string())));

        let token = parse_class("bg-[#fff]/[0.37]", &Fixture).expect("token");
        assert_eq!(token.modifier, Some(Modifier::Arbitrary("0.37".to_string())));
    }

    #[test]
    fn flags_are_recognised() {
        let token = parse_class("-mt-4", &Fixture).expect("negative");
        assert!(token.negative);
        assert_eq!(token.utility, "mt");
        assert!(parse_class("!p-4", &Fixture).expect("leading").important);
        assert!(parse_class("p-4!", &Fixture).expect("trailing").important);
    }

    #[test]
    fn longest_root_wins() {
        let token = parse_class("translate-x-4", &Fixture).expect("token");
        assert_eq!(token.utility, "translate-x");
        assert_eq!(token.value, Some(UtilityValue::Number("4".to_string())));
    }

    #[test]
    fn bare_utilities_and_named_container() {
        let token = parse_class("inline-block", &Fixture).expect("bare");
        assert_eq!(token.utility, "inline-block");
        assert_eq!(token.value, None);

        let token = parse_class("@container/main", &Fixture).expect("container");
        assert_eq!(token.utility, "@container");
        assert_eq!(token.modifier, Some(Modifier::Named("main".to_string())));
    }

    #[test]
    fn malformed_tokens_do_not_match() {
        assert!(parse_class("bg-[#abc:def]", &Fixture).is_none());
        assert!(parse_class("-mt-[12px]", &Fixture).is_none());
        assert!(parse_class("bg-[]", &Fixture).is_none());
        assert!(parse_class("bg-[red", &Fixture).is_none());
        assert!(parse_class("bg-(brand)", &Fixture).is_none());
        assert!(parse_class("unknown-4", &Fixture).is_none());
        assert!(parse_class("nope:p-4", &Fixture).is_none());
        assert!(parse_class("", &Fixture).is_none());
    }

    #[test]
    fn arbitrary_properties_carry_their_declaration() {
        let token = parse_class("[mask-type:luminance]", &Fixture).expect("token");
        assert!(token.arbitrary_property);
        assert_eq!(token.utility, "mask-type");
        assert!(parse_class("[:red]", &Fixture).is_none());
    }

    #[test]
    fn escaped_underscore_survives() {
        assert_eq!(normalize_arbitrary("a_b\\_c"), "a b_c");
        assert_eq!(split_top_level("a:[b:c]:d", ':'), vec!["a", "[b:c]", "d"]);
    }
}
