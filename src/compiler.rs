//! Class string to AST to CSS, memoized through the context's cache.

use crate::ast::{AstNode, decl};
use crate::cache::CompiledClass;
use crate::context::Context;
use crate::css::{CssOutput, class_selector, serialize_class};
use crate::registry::UtilityCategory;
use crate::tokenizer::{UtilityValue, parse_class};
use crate::variant::{VariantEnv, apply_variants};
use std::collections::HashSet;

/// CSS generated for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub class_name: String,
    /// In-place rules, joined by a single space.
    pub css: String,
    /// Hoisted blocks (keyframes, shared custom-property defaults).
    pub root_rules: Vec<String>,
    pub category: UtilityCategory,
}

/// AST for one class, or an empty tree when the class does not resolve.
pub fn parse_class_to_ast(class: &str, ctx: &Context) -> Vec<AstNode> {
    compile_class(class, ctx)
        .map(|compiled| compiled.nodes)
        .unwrap_or_default()
}

pub fn compile_class(class: &str, ctx: &Context) -> Option<CompiledClass> {
    let key = class.trim();
    if let Some(entry) = ctx.cache().ast(key) {
        return entry;
    }
    let compiled = compile_uncached(key, ctx);
    if compiled.is_none() {
        tracing::trace!(class = key, "class produced no declarations");
    }
    ctx.cache().store_ast(key, compiled.clone());
    compiled
}

fn compile_uncached(class: &str, ctx: &Context) -> Option<CompiledClass> {
    let token = parse_class(class, ctx)?;

    let (base, category) = if token.arbitrary_property {
        let value = match token.value.as_ref()? {
            UtilityValue::Arbitrary { value, .. } => value.clone(),
            _ => return None,
        };
        (vec![decl(token.utility.clone(), value)], UtilityCategory::Paint)
    } else {
        ctx.registry().resolve(&token, ctx)?
    };

    let base = if token.important {
        base.into_iter().map(AstNode::into_important).collect()
    } else {
        base
    };

    let selector = class_selector(class);
    let env = VariantEnv {
        theme: ctx,
        config: ctx.settings(),
        class_selector: &selector,
    };
    let nodes = apply_variants(base, &token.variants, &env)?;
    Some(CompiledClass { nodes, category })
}

pub fn generate_class(class: &str, ctx: &Context) -> Option<GenerationResult> {
    let key = class.trim();
    if let Some(entry) = ctx.cache().css(key) {
        return entry;
    }
    let result = compile_class(key, ctx)
        .map(|compiled| {
            let serialized = serialize_class(&compiled.nodes, key);
            GenerationResult {
                class_name: key.to_string(),
                css: serialized.css,
                root_rules: serialized.root_rules,
                category: compiled.category,
            }
        })
        .filter(|result| !result.css.is_empty() || !result.root_rules.is_empty());
    ctx.cache().store_css(key, result.clone());
    result
}

/// Compiles a whitespace-separated class list in source order. Hoisted rules
/// come first, each once; then one line per class.
pub fn generate_css(class_list: &str, ctx: &Context) -> CssOutput {
    let mut seen_roots = HashSet::new();
    let mut lines = Vec::new();
    let mut rules = Vec::new();

    for class in class_list.split_whitespace() {
        let Some(result) = generate_class(class, ctx) else {
            continue;
        };
        for root in result.root_rules {
            if seen_roots.insert(root.clone()) {
                lines.push(root);
            }
        }
        if !result.css.is_empty() {
            rules.push(result.css);
        }
    }

    lines.extend(rules);
    CssOutput::new(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::{compile_class, generate_class, generate_css, parse_class_to_ast};
    use crate::ast::{at_rule, decl, rule};
    use crate::config::Config;
    use crate::context::Context;
    use crate::registry::UtilityCategory;
    use pretty_assertions::assert_eq;

    fn ctx() -> Context {
        Context::new(Config::default())
    }

    #[test]
    fn responsive_hover_background() {
        let ctx = ctx();
        assert_eq!(
            generate_css("sm:hover:bg-red-500", &ctx).as_str(),
            "@media (min-width: 640px) { .sm\\:hover\\:bg-red-500:hover { background-color: #ef4444; } }"
        );
    }

    #[test]
    fn variant_order_is_preserved() {
        let ctx = ctx();
        let hover_focus = parse_class_to_ast("hover:focus:bg-red-500", &ctx);
        let focus_hover = parse_class_to_ast("focus:hover:bg-red-500", &ctx);
        assert_eq!(
            hover_focus,
            vec![rule(
                "&:hover",
                vec![rule("&:focus", vec![decl("background-color", "#ef4444")])],
            )]
        );
        assert_ne!(hover_focus, focus_hover);
    }

    #[test]
    fn important_marks_declarations() {
        let ctx = ctx();
        assert_eq!(
            generate_css("!p-4", &ctx).as_str(),
            ".\\!p-4 { padding: 1rem !important; }"
        );
    }

    #[test]
    fn arbitrary_property_emits_declaration() {
        let ctx = ctx();
        assert_eq!(
            generate_css("[mask-type:luminance]", &ctx).as_str(),
            ".\\[mask-type\\:luminance\\] { mask-type: luminance; }"
        );
    }

    #[test]
    fn malformed_classes_compile_to_nothing() {
        let ctx = ctx();
        for class in ["bg-[#abc:def]", "-mt-[12px]", "bg-[]", "nonsense", "xl2:p-4", "-p-4"] {
            assert!(parse_class_to_ast(class, &ctx).is_empty(), "{}", class);
            assert_eq!(generate_css(class, &ctx).as_str(), "", "{}", class);
        }
    }

    #[test]
    fn negative_margin_uses_calc() {
        let ctx = ctx();
        assert_eq!(
            generate_css("-mt-4", &ctx).as_str(),
            ".-mt-4 { margin-top: calc(1rem * -1); }"
        );
    }

    #[test]
    fn opacity_modifier_mixes_color() {
        let ctx = ctx();
        assert_eq!(
            generate_css("bg-red-500/50", &ctx).as_str(),
            ".bg-red-500\\/50 { background-color: color-mix(in srgb, #ef4444 50%, transparent); }"
        );
    }

    #[test]
    fn hoisted_rules_are_emitted_once() {
        let ctx = ctx();
        let css = generate_css("translate-x-4 rotate-45 translate-x-4", &ctx);
        let lines = css.lines().collect::<Vec<_>>();
        assert_eq!(
            lines[0],
            "*, ::before, ::after { --barocss-translate-x: 0; --barocss-translate-y: 0; --barocss-rotate: 0; --barocss-scale-x: 1; --barocss-scale-y: 1; }"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with(".translate-x-4 { --barocss-translate-x: 1rem; transform: "));
    }

    #[test]
    fn blur_none_keeps_empty_slot() {
        let ctx = ctx();
        let result = generate_class("blur-none", &ctx).expect("blur-none");
        assert_eq!(
            result.css,
            ".blur-none { --barocss-blur: ; filter: var(--barocss-blur) var(--barocss-grayscale); }"
        );
        assert_eq!(
            result.root_rules,
            vec!["*, ::before, ::after { --barocss-blur: ; --barocss-grayscale: ; }".to_string()]
        );
    }

    #[test]
    fn animation_hoists_keyframes() {
        let ctx = ctx();
        let result = generate_class("animate-spin", &ctx).expect("animate-spin");
        assert_eq!(
            result.root_rules,
            vec!["@keyframes spin { to { transform: rotate(360deg); } }".to_string()]
        );
        assert_eq!(result.css, ".animate-spin { animation: spin 1s linear infinite; }");
    }

    #[test]
    fn categories_follow_the_utility() {
        let ctx = ctx();
        let flex = compile_class("md:flex", &ctx).expect("flex");
        assert_eq!(flex.category, UtilityCategory::Layout);
        assert_eq!(
            flex.nodes,
            vec![at_rule("media", "(min-width: 768px)", vec![decl("display", "flex")])]
        );
        let color = compile_class("text-red-500", &ctx).expect("color");
        assert_eq!(color.category, UtilityCategory::Paint);
    }

    #[test]
    fn second_compile_hits_cache() {
        let ctx = ctx();
        let first = generate_css("p-4 p-4", &ctx);
        let second = generate_css("p-4", &ctx);
        assert_eq!(first.as_str(), ".p-4 { padding: 1rem; }\n.p-4 { padding: 1rem; }");
        assert_eq!(second.as_str(), ".p-4 { padding: 1rem; }");
        let stats = ctx.cache().stats();
        assert_eq!(stats.ast_misses, 1);
        assert_eq!(stats.css_misses, 1);
        assert_eq!(stats.css_hits, 2);
    }
}
