//! Variant classification and expansion.
//!
//! Variants fold right to left: the last variant wraps the declarations
//! first, so the first variant in the class string ends up outermost.

use crate::ast::{AstNode, at_rule, rule, style_rule};
use crate::config::Config;
use crate::css::{escape_selector, split_selector_list};
use crate::theme::{ThemeResolver, ThemeValue};
use crate::tokenizer::{Vocabulary, VariantSpec, bracket_inner, normalize_arbitrary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Breakpoint,
    PseudoClass,
    PseudoElement,
    Dark,
    Group,
    Peer,
    Has,
    Arbitrary,
    Container,
    /// Environment queries such as `print` or `supports-[...]`.
    Media,
    /// `data-*` and `aria-*`.
    Attribute,
    /// `ltr`, `rtl`, `*` and `**`.
    Selector,
}

/// Everything a variant template may read while expanding.
pub struct VariantEnv<'a> {
    pub theme: &'a dyn ThemeResolver,
    pub config: &'a Config,
    /// Escaped selector of the full class, `.sm\:p-4`.
    pub class_selector: &'a str,
}

const PSEUDO_CLASSES: &[(&str, &str)] = &[
    ("hover", ":hover"),
    ("focus", ":focus"),
    ("focus-within", ":focus-within"),
    ("focus-visible", ":focus-visible"),
    ("active", ":active"),
    ("visited", ":visited"),
    ("target", ":target"),
    ("first", ":first-child"),
    ("last", ":last-child"),
    ("only", ":only-child"),
    ("odd", ":nth-child(odd)"),
    ("even", ":nth-child(even)"),
    ("first-of-type", ":first-of-type"),
    ("last-of-type", ":last-of-type"),
    ("only-of-type", ":only-of-type"),
    ("empty", ":empty"),
    ("disabled", ":disabled"),
    ("enabled", ":enabled"),
    ("checked", ":checked"),
    ("indeterminate", ":indeterminate"),
    ("default", ":default"),
    ("optional", ":optional"),
    ("required", ":required"),
    ("valid", ":valid"),
    ("invalid", ":invalid"),
    ("in-range", ":in-range"),
    ("out-of-range", ":out-of-range"),
    ("placeholder-shown", ":placeholder-shown"),
    ("autofill", ":autofill"),
    ("read-only", ":read-only"),
    ("open", ":is([open], :popover-open)"),
];

const PSEUDO_ELEMENTS: &[(&str, &str)] = &[
    ("before", "::before"),
    ("after", "::after"),
    ("first-letter", "::first-letter"),
    ("first-line", "::first-line"),
    ("marker", "::marker"),
    ("selection", "::selection"),
    ("file", "::file-selector-button"),
    ("backdrop", "::backdrop"),
    ("placeholder", "::placeholder"),
];

const MEDIA_VARIANTS: &[(&str, &str)] = &[
    ("print", "print"),
    ("motion-safe", "(prefers-reduced-motion: no-preference)"),
    ("motion-reduce", "(prefers-reduced-motion: reduce)"),
    ("contrast-more", "(prefers-contrast: more)"),
    ("contrast-less", "(prefers-contrast: less)"),
    ("portrait", "(orientation: portrait)"),
    ("landscape", "(orientation: landscape)"),
    ("forced-colors", "(forced-colors: active)"),
];

const ARIA_STATES: [&str; 9] = [
    "busy", "checked", "disabled", "expanded", "hidden", "pressed", "readonly", "required",
    "selected",
];

/// Assigns a category to one variant segment, or `None` when the segment is
/// not a variant this crate understands.
pub fn classify_variant(raw: &str, vocab: &dyn Vocabulary) -> Option<VariantKind> {
    if raw == "dark" {
        return Some(VariantKind::Dark);
    }
    if raw.starts_with('[') {
        bracket_inner(raw, '[', ']')?;
        return Some(VariantKind::Arbitrary);
    }
    if vocab.is_screen(raw) {
        return Some(VariantKind::Breakpoint);
    }
    if let Some(rest) = raw.strip_prefix("max-").or_else(|| raw.strip_prefix("min-")) {
        if vocab.is_screen(rest) || bracket_inner(rest, '[', ']').is_some() {
            return Some(VariantKind::Breakpoint);
        }
    }
    if let Some(rest) = raw.strip_prefix('@') {
        let (core, _) = split_named(rest);
        if vocab.is_container_size(core) || bracket_inner(core, '[', ']').is_some() {
            return Some(VariantKind::Container);
        }
        return None;
    }
    if let Some(rest) = raw.strip_prefix("container-") {
        bracket_inner(rest, '[', ']')?;
        return Some(VariantKind::Container);
    }
    if let Some(rest) = raw.strip_prefix("group-") {
        relational_state(split_named(rest).0)?;
        return Some(VariantKind::Group);
    }
    if let Some(rest) = raw.strip_prefix("peer-") {
        relational_state(split_named(rest).0)?;
        return Some(VariantKind::Peer);
    }
    if let Some(rest) = raw.strip_prefix("has-") {
        has_argument(rest)?;
        return Some(VariantKind::Has);
    }
    if let Some(rest) = raw.strip_prefix("supports-") {
        bracket_inner(rest, '[', ']')?;
        return Some(VariantKind::Media);
    }
    if let Some(rest) = raw.strip_prefix("data-") {
        data_attribute(rest)?;
        return Some(VariantKind::Attribute);
    }
    if let Some(rest) = raw.strip_prefix("aria-") {
        aria_attribute(rest)?;
        return Some(VariantKind::Attribute);
    }
    if lookup(MEDIA_VARIANTS, raw).is_some() {
        return Some(VariantKind::Media);
    }
    if pseudo_class_suffix(raw).is_some() {
        return Some(VariantKind::PseudoClass);
    }
    if lookup(PSEUDO_ELEMENTS, raw).is_some() {
        return Some(VariantKind::PseudoElement);
    }
    if matches!(raw, "ltr" | "rtl" | "*" | "**") {
        return Some(VariantKind::Selector);
    }
    None
}

/// Wraps `base` with every variant. Hoisted nodes never nest under variants
/// and are returned first.
pub fn apply_variants(
    base: Vec<AstNode>,
    variants: &[VariantSpec],
    env: &VariantEnv<'_>,
) -> Option<Vec<AstNode>> {
    let (mut hoisted, mut nodes): (Vec<AstNode>, Vec<AstNode>) =
        base.into_iter().partition(AstNode::is_at_root);

    for variant in variants.iter().rev() {
        nodes = expand_variant(variant, nodes, env)?;
    }

    hoisted.extend(nodes);
    Some(hoisted)
}

fn expand_variant(
    variant: &VariantSpec,
    children: Vec<AstNode>,
    env: &VariantEnv<'_>,
) -> Option<Vec<AstNode>> {
    let raw = variant.raw.as_str();
    let nodes = match variant.kind {
        VariantKind::Breakpoint => vec![at_rule(
            "media",
            breakpoint_query(raw, env.theme)?,
            children,
        )],
        VariantKind::PseudoClass => {
            let suffix = pseudo_class_suffix(raw)?;
            wrap_selector(&format!("&{}", suffix), children, env)
        }
        VariantKind::PseudoElement => {
            let suffix = lookup(PSEUDO_ELEMENTS, raw)?;
            wrap_selector(&format!("&{}", suffix), children, env)
        }
        VariantKind::Dark => expand_dark(children, env),
        VariantKind::Group => relational(raw.strip_prefix("group-")?, "group", children)?,
        VariantKind::Peer => relational(raw.strip_prefix("peer-")?, "peer", children)?,
        VariantKind::Has => {
            let argument = has_argument(raw.strip_prefix("has-")?)?;
            wrap_selector(&format!("&:has({})", argument), children, env)
        }
        VariantKind::Arbitrary => {
            let content = normalize_arbitrary(bracket_inner(raw, '[', ']')?);
            let content = content.trim();
            if let Some(at) = content.strip_prefix('@') {
                let (name, params) = at.split_once(' ').unwrap_or((at, ""));
                if name.is_empty() {
                    return None;
                }
                vec![at_rule(name, params.trim(), children)]
            } else if content.contains('&') {
                wrap_selector(content, children, env)
            } else {
                wrap_selector(&format!("{} &", content), children, env)
            }
        }
        VariantKind::Container => vec![at_rule(
            "container",
            container_query(raw, env.theme)?,
            children,
        )],
        VariantKind::Media => vec![at_rule(media_name(raw), media_query(raw)?, children)],
        VariantKind::Attribute => {
            let attribute = match raw.strip_prefix("data-") {
                Some(rest) => data_attribute(rest)?,
                None => aria_attribute(raw.strip_prefix("aria-")?)?,
            };
            wrap_selector(&format!("&{}", attribute), children, env)
        }
        VariantKind::Selector => match raw {
            "*" => vec![style_rule(
                format!(":is({} > *)", env.class_selector),
                children,
            )],
            "**" => vec![style_rule(
                format!(":is({} *)", env.class_selector),
                children,
            )],
            "ltr" => wrap_selector(
                "&:where(:dir(ltr), [dir=\"ltr\"], [dir=\"ltr\"] *)",
                children,
                env,
            ),
            "rtl" => wrap_selector(
                "&:where(:dir(rtl), [dir=\"rtl\"], [dir=\"rtl\"] *)",
                children,
                env,
            ),
            _ => return None,
        },
    };
    Some(nodes)
}

/// A nesting rule, unless every child already left the nesting context via a
/// style rule; then the template is folded into the class reference inside
/// each style-rule selector instead.
fn wrap_selector(template: &str, children: Vec<AstNode>, env: &VariantEnv<'_>) -> Vec<AstNode> {
    if !all_style_rules(&children) {
        return vec![rule(template, children)];
    }
    let substituted = template.replace('&', env.class_selector);
    children
        .into_iter()
        .map(|child| match child {
            AstNode::StyleRule { selector, children } => AstNode::StyleRule {
                selector: selector.replacen(env.class_selector, &substituted, 1),
                children,
            },
            other => other,
        })
        .collect()
}

fn all_style_rules(children: &[AstNode]) -> bool {
    !children.is_empty()
        && children
            .iter()
            .all(|child| matches!(child, AstNode::StyleRule { .. }))
}

fn expand_dark(children: Vec<AstNode>, env: &VariantEnv<'_>) -> Vec<AstNode> {
    let selectors = env.config.dark_selectors();
    let media = env.config.dark_uses_media() || selectors.is_empty();
    let mut nodes = Vec::with_capacity(2);

    if media && !selectors.is_empty() {
        nodes.push(at_rule(
            "media",
            "(prefers-color-scheme: dark)",
            children.clone(),
        ));
    } else if media {
        nodes.push(at_rule("media", "(prefers-color-scheme: dark)", children));
        return nodes;
    }

    let templates = selectors
        .iter()
        .map(|selector| {
            if selector.contains('&') {
                selector.clone()
            } else {
                format!("{} &", selector)
            }
        })
        .collect::<Vec<_>>();
    // A list folded into a style-rule selector must stay one compound.
    let template = if templates.len() > 1 && all_style_rules(&children) {
        format!(":is({})", templates.join(", "))
    } else {
        templates.join(", ")
    };
    nodes.extend(wrap_selector(&template, children, env));
    nodes
}

enum RelationalState {
    /// Appended to the marker class: `:hover`, `.is-open`.
    Suffix(String),
    /// Contains `&`, replaced by the marker class.
    Template(String),
}

fn relational_state(core: &str) -> Option<RelationalState> {
    if core.starts_with('[') {
        let inner = normalize_arbitrary(bracket_inner(core, '[', ']')?);
        if inner.contains('&') {
            return Some(RelationalState::Template(inner));
        }
        return Some(RelationalState::Suffix(inner));
    }
    if let Some(rest) = core.strip_prefix("has-") {
        return Some(RelationalState::Suffix(format!(":has({})", has_argument(rest)?)));
    }
    if let Some(rest) = core.strip_prefix("data-") {
        return Some(RelationalState::Suffix(data_attribute(rest)?));
    }
    if let Some(rest) = core.strip_prefix("aria-") {
        return Some(RelationalState::Suffix(aria_attribute(rest)?));
    }
    pseudo_class_suffix(core).map(RelationalState::Suffix)
}

fn relational(raw: &str, marker_class: &str, children: Vec<AstNode>) -> Option<Vec<AstNode>> {
    let (core, name) = split_named(raw);
    let marker = match name {
        Some(name) if !name.is_empty() => {
            format!(".{}", escape_selector(&format!("{}/{}", marker_class, name)))
        }
        Some(_) => return None,
        None => format!(".{}", marker_class),
    };
    let combinator = if marker_class == "peer" { " ~ " } else { " " };

    let (state, scoped_state) = match relational_state(core)? {
        RelationalState::Suffix(suffix) => (
            format!("{}{}", marker, suffix),
            format!(":where({}){}", marker, suffix),
        ),
        RelationalState::Template(template) => {
            let state = template.replace('&', &marker);
            (state.clone(), state)
        }
    };

    if all_style_rules(&children) {
        let relation = format!(":is({}{}*)", scoped_state, combinator);
        let rewritten = children
            .into_iter()
            .map(|child| match child {
                AstNode::StyleRule { selector, children } => {
                    let selector = split_selector_list(&selector)
                        .into_iter()
                        .map(|part| format!("{}{}", part, relation))
                        .collect::<Vec<_>>()
                        .join(", ");
                    AstNode::StyleRule { selector, children }
                }
                other => other,
            })
            .collect();
        return Some(rewritten);
    }

    Some(vec![rule(format!("{}{}&", state, combinator), children)])
}

fn breakpoint_query(raw: &str, theme: &dyn ThemeResolver) -> Option<String> {
    if let Some(rest) = raw.strip_prefix("min-") {
        if let Some(inner) = bracket_inner(rest, '[', ']') {
            return Some(format!("(min-width: {})", normalize_arbitrary(inner)));
        }
        return screen_min(rest, theme).map(|width| format!("(min-width: {})", width));
    }
    if let Some(rest) = raw.strip_prefix("max-") {
        let width = match bracket_inner(rest, '[', ']') {
            Some(inner) => normalize_arbitrary(inner),
            None => screen_min(rest, theme)?,
        };
        return Some(format!("not all and (min-width: {})", width));
    }
    match theme.theme_path(&["screens", raw])? {
        ThemeValue::Map(map) => {
            if let Some(raw_query) = map.get("raw").and_then(ThemeValue::as_str) {
                return Some(raw_query.to_string());
            }
            let min = map.get("min").and_then(ThemeValue::as_str);
            let max = map.get("max").and_then(ThemeValue::as_str);
            match (min, max) {
                (Some(min), Some(max)) => {
                    Some(format!("(min-width: {}) and (max-width: {})", min, max))
                }
                (Some(min), None) => Some(format!("(min-width: {})", min)),
                (None, Some(max)) => Some(format!("(max-width: {})", max)),
                (None, None) => None,
            }
        }
        value => value.as_str().map(|width| format!("(min-width: {})", width)),
    }
}

fn screen_min(name: &str, theme: &dyn ThemeResolver) -> Option<String> {
    match theme.theme_path(&["screens", name])? {
        ThemeValue::Str(width) => Some(width),
        ThemeValue::Map(map) => map.get("min").and_then(ThemeValue::as_str).map(str::to_string),
        _ => None,
    }
}

fn container_query(raw: &str, theme: &dyn ThemeResolver) -> Option<String> {
    if let Some(rest) = raw.strip_prefix("container-") {
        let condition = normalize_arbitrary(bracket_inner(rest, '[', ']')?);
        return Some(parenthesize(condition.trim()));
    }
    let (core, name) = split_named(raw.strip_prefix('@')?);
    let width = match bracket_inner(core, '[', ']') {
        Some(inner) => normalize_arbitrary(inner),
        None => theme.theme_css(&["containers", core])?,
    };
    let query = format!("(min-width: {})", width);
    match name {
        Some(name) if !name.is_empty() => Some(format!("{} {}", name, query)),
        Some(_) => None,
        None => Some(query),
    }
}

fn media_name(raw: &str) -> &'static str {
    if raw.starts_with("supports-") {
        "supports"
    } else {
        "media"
    }
}

fn media_query(raw: &str) -> Option<String> {
    if let Some(rest) = raw.strip_prefix("supports-") {
        let condition = normalize_arbitrary(bracket_inner(rest, '[', ']')?);
        return Some(parenthesize(condition.trim()));
    }
    lookup(MEDIA_VARIANTS, raw).map(str::to_string)
}

fn parenthesize(condition: &str) -> String {
    if condition.starts_with('(') || condition.starts_with("not ") {
        condition.to_string()
    } else {
        format!("({})", condition)
    }
}

fn pseudo_class_suffix(raw: &str) -> Option<String> {
    if let Some(suffix) = lookup(PSEUDO_CLASSES, raw) {
        return Some(suffix.to_string());
    }
    nth_suffix(raw)
}

fn nth_suffix(raw: &str) -> Option<String> {
    let forms = [
        ("nth-last-of-type-", "nth-last-of-type"),
        ("nth-last-", "nth-last-child"),
        ("nth-of-type-", "nth-of-type"),
        ("nth-", "nth-child"),
    ];
    for (prefix, pseudo) in forms {
        if let Some(rest) = raw.strip_prefix(prefix) {
            let argument = match bracket_inner(rest, '[', ']') {
                Some(inner) => normalize_arbitrary(inner),
                None if !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()) => {
                    rest.to_string()
                }
                None => return None,
            };
            return Some(format!(":{}({})", pseudo, argument));
        }
    }
    None
}

fn has_argument(raw: &str) -> Option<String> {
    if raw.starts_with('[') {
        return Some(normalize_arbitrary(bracket_inner(raw, '[', ']')?));
    }
    pseudo_class_suffix(raw)
}

fn data_attribute(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('[') {
        return Some(format!("[data-{}]", normalize_arbitrary(bracket_inner(raw, '[', ']')?)));
    }
    Some(format!("[data-{}]", raw))
}

fn aria_attribute(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('[') {
        return Some(format!("[aria-{}]", normalize_arbitrary(bracket_inner(raw, '[', ']')?)));
    }
    if ARIA_STATES.contains(&raw) {
        return Some(format!("[aria-{}=\"true\"]", raw));
    }
    Some(format!("[aria-{}]", raw))
}

/// `hover/name` splits into `("hover", Some("name"))`.
fn split_named(raw: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => return (&raw[..idx], Some(&raw[idx + 1..])),
            _ => {}
        }
    }
    (raw, None)
}

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::{VariantEnv, VariantKind, apply_variants};
    use crate::ast::{AstNode, at_root, at_rule, decl, rule, style_rule};
    use crate::config::{Config, DarkMode};
    use crate::theme::{ThemeResolver, ThemeValue};
    use crate::tokenizer::VariantSpec;
    use pretty_assertions::assert_eq;

    struct Screens;

    impl ThemeResolver for Screens {
        fn theme_path(&self, path: &[&str]) -> Option<ThemeValue> {
            match path {
                ["screens", "sm"] => Some(ThemeValue::str("640px")),
                ["screens", "md"] => Some(ThemeValue::str("768px")),
                ["containers", "md"] => Some(ThemeValue::str("28rem")),
                _ => None,
            }
        }

        fn var_name(&self, name: &str) -> String {
            format!("--barocss-{}", name)
        }
    }

    fn variant_of(raw: &str, kind: VariantKind) -> VariantSpec {
        VariantSpec {
            raw: raw.to_string(),
            kind,
        }
    }

    fn expand(variants: &[VariantSpec], config: &Config, class: &str) -> Option<Vec<AstNode>> {
        let env = VariantEnv {
            theme: &Screens,
            config,
            class_selector: class,
        };
        apply_variants(vec![decl("color", "red")], variants, &env)
    }

    fn single(raw: &str, kind: VariantKind, config: &Config) -> Vec<AstNode> {
        expand(&[variant_of(raw, kind)], config, ".x").expect("nodes")
    }

    #[test]
    fn first_variant_is_outermost() {
        let config = Config::default();
        let nodes = expand(
            &[
                variant_of("sm", VariantKind::Breakpoint),
                variant_of("hover", VariantKind::PseudoClass),
            ],
            &config,
            ".x",
        )
        .expect("nodes");
        assert_eq!(
            nodes,
            vec![at_rule(
                "media",
                "(min-width: 640px)",
                vec![rule("&:hover", vec![decl("color", "red")])],
            )]
        );
    }

    #[test]
    fn max_breakpoint_negates_min_width() {
        let config = Config::default();
        let nodes = single("max-md", VariantKind::Breakpoint, &config);
        assert_eq!(
            nodes,
            vec![at_rule(
                "media",
                "not all and (min-width: 768px)",
                vec![decl("color", "red")],
            )]
        );
    }

    #[test]
    fn dark_media_and_selector_emit_siblings() {
        let config = Config {
            dark_mode: DarkMode::Media,
            dark_mode_selector: Some(vec![".dark".to_string()]),
            ..Config::default()
        };
        let nodes = single("dark", VariantKind::Dark, &config);
        assert_eq!(
            nodes,
            vec![
                at_rule(
                    "media",
                    "(prefers-color-scheme: dark)",
                    vec![decl("color", "red")],
                ),
                rule(".dark &", vec![decl("color", "red")]),
            ]
        );
    }

    #[test]
    fn dark_class_joins_custom_selectors() {
        let config = Config {
            dark_mode: DarkMode::Custom(vec![
                ".dark".to_string(),
                "[data-theme=dark]".to_string(),
            ]),
            ..Config::default()
        };
        let nodes = single("dark", VariantKind::Dark, &config);
        assert_eq!(
            nodes,
            vec![rule(".dark &, [data-theme=dark] &", vec![decl("color", "red")])]
        );
    }

    #[test]
    fn dark_class_folds_into_child_star_rule() {
        let class = ".dark\\:\\*\\:x";
        let variants = [
            variant_of("dark", VariantKind::Dark),
            variant_of("*", VariantKind::Selector),
        ];
        let config = Config {
            dark_mode: DarkMode::Class,
            ..Config::default()
        };
        assert_eq!(
            expand(&variants, &config, class).expect("nodes"),
            vec![style_rule(
                ":is(.dark .dark\\:\\*\\:x > *)",
                vec![decl("color", "red")],
            )]
        );

        let config = Config {
            dark_mode: DarkMode::Custom(vec![
                "media".to_string(),
                ".dark".to_string(),
                "[data-theme=dark]".to_string(),
            ]),
            ..Config::default()
        };
        assert_eq!(
            expand(&variants, &config, class).expect("nodes"),
            vec![
                at_rule(
                    "media",
                    "(prefers-color-scheme: dark)",
                    vec![style_rule(
                        ":is(.dark\\:\\*\\:x > *)",
                        vec![decl("color", "red")],
                    )],
                ),
                style_rule(
                    ":is(:is(.dark .dark\\:\\*\\:x, [data-theme=dark] .dark\\:\\*\\:x) > *)",
                    vec![decl("color", "red")],
                ),
            ]
        );
    }

    #[test]
    fn group_hover_uses_ancestor_marker() {
        let config = Config::default();
        let nodes = single("group-hover", VariantKind::Group, &config);
        assert_eq!(nodes, vec![rule(".group:hover &", vec![decl("color", "red")])]);

        let nodes = single("peer-checked/opt", VariantKind::Peer, &config);
        assert_eq!(
            nodes,
            vec![rule(".peer\\/opt:checked ~ &", vec![decl("color", "red")])]
        );
    }

    #[test]
    fn group_star_rewrites_descendant_rule() {
        let config = Config::default();
        let class = ".group-hover\\:\\*\\:x";
        let nodes = expand(
            &[
                variant_of("group-hover", VariantKind::Group),
                variant_of("*", VariantKind::Selector),
            ],
            &config,
            class,
        )
        .expect("nodes");
        assert_eq!(
            nodes,
            vec![style_rule(
                ":is(.group-hover\\:\\*\\:x > *):is(:where(.group):hover *)",
                vec![decl("color", "red")],
            )]
        );
    }

    #[test]
    fn pseudo_class_folds_into_child_star_rule() {
        let config = Config::default();
        let class = ".hover\\:\\*\\:x";
        let nodes = expand(
            &[
                variant_of("hover", VariantKind::PseudoClass),
                variant_of("*", VariantKind::Selector),
            ],
            &config,
            class,
        )
        .expect("nodes");
        assert_eq!(
            nodes,
            vec![style_rule(
                ":is(.hover\\:\\*\\:x:hover > *)",
                vec![decl("color", "red")],
            )]
        );
    }

    #[test]
    fn arbitrary_selector_with_and_without_marker() {
        let config = Config::default();
        let nodes = single("[&_p]", VariantKind::Arbitrary, &config);
        assert_eq!(nodes, vec![rule("& p", vec![decl("color", "red")])]);

        let nodes = single("[.theme-x]", VariantKind::Arbitrary, &config);
        assert_eq!(nodes, vec![rule(".theme-x &", vec![decl("color", "red")])]);

        let nodes = expand(
            &[variant_of("[@media_(hover:hover)]", VariantKind::Arbitrary)],
            &config,
            ".x",
        )
        .expect("nodes");
        assert_eq!(
            nodes,
            vec![at_rule("media", "(hover:hover)", vec![decl("color", "red")])]
        );
    }

    #[test]
    fn container_variants_build_queries() {
        let config = Config::default();
        let nodes = single("@md/card", VariantKind::Container, &config);
        assert_eq!(
            nodes,
            vec![at_rule("container", "card (min-width: 28rem)", vec![decl("color", "red")])]
        );
        let nodes = expand(
            &[variant_of("container-[size>600px]", VariantKind::Container)],
            &config,
            ".x",
        )
        .expect("nodes");
        assert_eq!(
            nodes,
            vec![at_rule("container", "(size>600px)", vec![decl("color", "red")])]
        );
    }

    #[test]
    fn hoisted_nodes_stay_outside_variants() {
        let config = Config::default();
        let env = VariantEnv {
            theme: &Screens,
            config: &config,
            class_selector: ".x",
        };
        let hoisted = at_root(vec![decl("--t", "0")]);
        let nodes = apply_variants(
            vec![hoisted.clone(), decl("color", "red")],
            &[variant_of("hover", VariantKind::PseudoClass)],
            &env,
        )
        .expect("nodes");
        assert_eq!(nodes, vec![hoisted, rule("&:hover", vec![decl("color", "red")])]);
    }

    #[test]
    fn unknown_screen_fails_whole_expansion() {
        let config = Config::default();
        assert!(expand(&[variant_of("xl", VariantKind::Breakpoint)], &config, ".x").is_none());
    }
}
