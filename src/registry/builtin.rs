use super::{Utility, UtilityCategory, UtilityRegistry};
use crate::ast::{AstNode, at_root, at_root_anchored, at_rule, decl, style_rule};
use crate::theme::{ThemeResolver, ThemeValue};
use crate::tokenizer::{Modifier, ParsedToken, UtilityValue};

const DISPLAY: [(&str, &str); 10] = [
    ("block", "block"),
    ("inline", "inline"),
    ("inline-block", "inline-block"),
    ("flex", "flex"),
    ("inline-flex", "inline-flex"),
    ("grid", "grid"),
    ("inline-grid", "inline-grid"),
    ("table", "table"),
    ("contents", "contents"),
    ("hidden", "none"),
];

const POSITION: [&str; 5] = ["static", "relative", "absolute", "fixed", "sticky"];

/// `(root, theme category, properties, negatable)`
const SPACING: [(&str, &str, &[&str], bool); 18] = [
    ("p", "padding", &["padding"], false),
    ("px", "padding", &["padding-left", "padding-right"], false),
    ("py", "padding", &["padding-top", "padding-bottom"], false),
    ("pt", "padding", &["padding-top"], false),
    ("pr", "padding", &["padding-right"], false),
    ("pb", "padding", &["padding-bottom"], false),
    ("pl", "padding", &["padding-left"], false),
    ("m", "margin", &["margin"], true),
    ("mx", "margin", &["margin-left", "margin-right"], true),
    ("my", "margin", &["margin-top", "margin-bottom"], true),
    ("mt", "margin", &["margin-top"], true),
    ("mr", "margin", &["margin-right"], true),
    ("mb", "margin", &["margin-bottom"], true),
    ("ml", "margin", &["margin-left"], true),
    ("gap", "gap", &["gap"], false),
    ("inset", "inset", &["inset"], true),
    ("top", "inset", &["top"], true),
    ("left", "inset", &["left"], true),
];

const TRANSFORM_SLOTS: [(&str, &str); 5] = [
    ("translate-x", "0"),
    ("translate-y", "0"),
    ("rotate", "0"),
    ("scale-x", "1"),
    ("scale-y", "1"),
];

/// `(root, custom-property slots, theme category)`
const TRANSFORMS: [(&str, &[&str], &str); 4] = [
    ("translate-x", &["translate-x"], "translate"),
    ("translate-y", &["translate-y"], "translate"),
    ("rotate", &["rotate"], "rotate"),
    ("scale", &["scale-x", "scale-y"], "scale"),
];

const FILTER_SLOTS: [&str; 2] = ["blur", "grayscale"];

/// Hosts the shared defaults for composed properties.
const UNIVERSAL: &str = "*, ::before, ::after";

pub(super) fn register_all(registry: &mut UtilityRegistry) {
    for (name, display) in DISPLAY {
        registry.register(Utility::bare(name, UtilityCategory::Layout, move |_, _| {
            Some(vec![decl("display", display)])
        }));
    }
    for position in POSITION {
        registry.register(Utility::bare(position, UtilityCategory::Layout, move |_, _| {
            Some(vec![decl("position", position)])
        }));
    }

    for (name, category, properties, negatable) in SPACING {
        registry.register(Utility::new(name, UtilityCategory::Layout, move |token, theme| {
            if token.negative && !negatable {
                return None;
            }
            let value = signed(token, themed_value(token, theme, category)?);
            Some(
                properties
                    .iter()
                    .map(|property| decl(*property, value.clone()))
                    .collect(),
            )
        }));
    }

    for (name, category, property) in [("w", "width", "width"), ("h", "height", "height")] {
        registry.register(Utility::new(name, UtilityCategory::Layout, move |token, theme| {
            if token.negative {
                return None;
            }
            let value = match token.value.as_ref()? {
                UtilityValue::Fraction {
                    numerator,
                    denominator,
                } => fraction_percent(numerator, denominator)?,
                _ => themed_value(token, theme, category)?,
            };
            Some(vec![decl(property, value)])
        }));
    }

    registry.register(color_utility("bg", "background-color"));
    registry.register(color_utility("text", "color"));
    registry.register(Utility::new("text", UtilityCategory::Layout, font_size));
    registry.register(color_utility("border", "border-color"));
    registry.register(
        Utility::new("border", UtilityCategory::Layout, border_width).with_bare(),
    );

    registry.register(Utility::new("opacity", UtilityCategory::Paint, |token, theme| {
        if token.negative {
            return None;
        }
        Some(vec![decl("opacity", themed_value(token, theme, "opacity")?)])
    }));

    registry.register(
        Utility::new("rounded", UtilityCategory::Paint, |token, theme| {
            if token.negative {
                return None;
            }
            let value = match token.value {
                None => theme.theme_css(&["borderRadius", "DEFAULT"])?,
                Some(_) => themed_value(token, theme, "borderRadius")?,
            };
            Some(vec![decl("border-radius", value)])
        })
        .with_bare(),
    );

    for (name, slots, category) in TRANSFORMS {
        registry.register(Utility::new(name, UtilityCategory::Paint, move |token, theme| {
            let value = match (category, token.value.as_ref()?) {
                (
                    "translate",
                    UtilityValue::Fraction {
                        numerator,
                        denominator,
                    },
                ) => fraction_percent(numerator, denominator)?,
                ("translate", UtilityValue::Keyword(keyword)) if keyword == "full" => {
                    "100%".to_string()
                }
                _ => themed_value(token, theme, category)?,
            };
            let value = signed(token, value);
            let mut nodes = vec![transform_defaults(theme)];
            for slot in slots {
                nodes.push(decl(theme.var_name(slot), value.clone()));
            }
            nodes.push(decl("transform", transform_chain(theme)));
            Some(nodes)
        }));
    }

    for (name, function) in [("blur", "blur"), ("grayscale", "grayscale")] {
        registry.register(
            Utility::new(name, UtilityCategory::Paint, move |token, theme| {
                if token.negative {
                    return None;
                }
                let slot = match &token.value {
                    Some(UtilityValue::Keyword(keyword)) if keyword == "none" => String::new(),
                    None => format!("{}({})", function, theme.theme_css(&[name, "DEFAULT"])?),
                    Some(_) => format!("{}({})", function, themed_value(token, theme, name)?),
                };
                Some(vec![
                    filter_defaults(theme),
                    decl(theme.var_name(name), slot),
                    decl("filter", filter_chain(theme)),
                ])
            })
            .with_bare(),
        );
    }

    registry.register(Utility::new("animate", UtilityCategory::Paint, animate));

    registry.register(Utility::bare("@container", UtilityCategory::Layout, |token, _| {
        let mut nodes = vec![decl("container-type", "inline-size")];
        match &token.modifier {
            Some(Modifier::Named(name)) | Some(Modifier::Arbitrary(name)) => {
                nodes.push(decl("container-name", name.clone()));
            }
            None => {}
        }
        Some(nodes)
    }));
}

fn color_utility(name: &'static str, property: &'static str) -> Utility {
    Utility::new(name, UtilityCategory::Paint, move |token, theme| {
        if token.negative {
            return None;
        }
        let color = color_value(token, theme)?;
        let color = match &token.modifier {
            Some(modifier) => with_opacity(&color, modifier, theme)?,
            None => color,
        };
        Some(vec![decl(property, color)])
    })
}

fn color_value(token: &ParsedToken, theme: &dyn ThemeResolver) -> Option<String> {
    match token.value.as_ref()? {
        UtilityValue::Keyword(keyword) => match theme.theme_path(&["colors", keyword.as_str()])? {
            ThemeValue::Str(color) => Some(color),
            _ => None,
        },
        UtilityValue::Arbitrary { value, hint } => match hint.as_deref() {
            None | Some("color") if !looks_like_length(value) => Some(value.clone()),
            _ => None,
        },
        UtilityValue::CustomProperty { name, hint } => match hint.as_deref() {
            None | Some("color") => Some(format!("var({})", name)),
            _ => None,
        },
        UtilityValue::Number(_) | UtilityValue::Fraction { .. } => None,
    }
}

fn with_opacity(
    color: &str,
    modifier: &Modifier,
    theme: &dyn ThemeResolver,
) -> Option<String> {
    let percent = match modifier {
        Modifier::Named(name) => {
            let ratio = theme.theme_css(&["opacity", name.as_str()])?;
            percent_of(&ratio)?
        }
        Modifier::Arbitrary(raw) => {
            if raw.ends_with('%') {
                raw.clone()
            } else {
                percent_of(raw)?
            }
        }
    };
    Some(format!("color-mix(in srgb, {} {}, transparent)", color, percent))
}

fn percent_of(ratio: &str) -> Option<String> {
    let ratio = ratio.parse::<f64>().ok()?;
    Some(format!("{}%", crate::theme::trim_float(ratio * 100.0)))
}

fn font_size(token: &ParsedToken, theme: &dyn ThemeResolver) -> Option<Vec<AstNode>> {
    if token.negative || token.modifier.is_some() {
        return None;
    }
    let size = match token.value.as_ref()? {
        UtilityValue::Keyword(keyword) => theme.theme_css(&["fontSize", keyword.as_str()])?,
        UtilityValue::Arbitrary { value, hint } => match hint.as_deref() {
            Some("length") => value.clone(),
            None if looks_like_length(value) => value.clone(),
            _ => return None,
        },
        UtilityValue::CustomProperty { name, hint } if hint.as_deref() == Some("length") => {
            format!("var({})", name)
        }
        _ => return None,
    };
    Some(vec![decl("font-size", size)])
}

fn border_width(token: &ParsedToken, _theme: &dyn ThemeResolver) -> Option<Vec<AstNode>> {
    if token.negative || token.modifier.is_some() {
        return None;
    }
    let width = match &token.value {
        None => "1px".to_string(),
        Some(UtilityValue::Number(number)) if !number.contains('.') => format!("{}px", number),
        Some(UtilityValue::Arbitrary { value, hint }) => match hint.as_deref() {
            Some("length") | Some("line-width") => value.clone(),
            None if looks_like_length(value) => value.clone(),
            _ => return None,
        },
        _ => return None,
    };
    Some(vec![decl("border-width", width)])
}

fn animate(token: &ParsedToken, theme: &dyn ThemeResolver) -> Option<Vec<AstNode>> {
    if token.negative {
        return None;
    }
    let value = themed_value(token, theme, "animation")?;
    let mut nodes = Vec::with_capacity(2);
    if let Some(UtilityValue::Keyword(name)) = &token.value {
        if let Some(ThemeValue::Map(frames)) = theme.theme_path(&["keyframes", name.as_str()]) {
            let frames = frames
                .iter()
                .filter_map(|(offset, body)| {
                    let declarations = body
                        .as_map()?
                        .iter()
                        .filter_map(|(prop, value)| Some(decl(prop.clone(), value.to_css_value()?)))
                        .collect::<Vec<_>>();
                    Some(style_rule(offset.clone(), declarations))
                })
                .collect::<Vec<_>>();
            nodes.push(at_root(vec![at_rule("keyframes", name.clone(), frames)]));
        }
    }
    nodes.push(decl("animation", value));
    Some(nodes)
}

/// Theme entry for keyword, number and fraction shapes; literal otherwise.
fn themed_value(token: &ParsedToken, theme: &dyn ThemeResolver, category: &str) -> Option<String> {
    let value = token.value.as_ref()?;
    if let Some(literal) = value.literal() {
        return Some(literal);
    }
    let key = value.theme_key()?;
    theme.theme_css(&[category, key.as_str()])
}

fn signed(token: &ParsedToken, value: String) -> String {
    if token.negative {
        format!("calc({} * -1)", value)
    } else {
        value
    }
}

fn fraction_percent(numerator: &str, denominator: &str) -> Option<String> {
    let numerator = numerator.parse::<f64>().ok()?;
    let denominator = denominator.parse::<f64>().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(format!(
        "{}%",
        crate::theme::trim_float(numerator / denominator * 100.0)
    ))
}

fn looks_like_length(value: &str) -> bool {
    let value = value.trim();
    value.starts_with(|ch: char| ch.is_ascii_digit() || ch == '.')
        || value.starts_with("calc(")
        || value.starts_with("clamp(")
}

fn transform_defaults(theme: &dyn ThemeResolver) -> AstNode {
    at_root_anchored(
        UNIVERSAL,
        TRANSFORM_SLOTS
            .iter()
            .map(|(slot, initial)| decl(theme.var_name(slot), *initial))
            .collect(),
    )
}

fn transform_chain(theme: &dyn ThemeResolver) -> String {
    format!(
        "translate(var({}), var({})) rotate(var({})) scale(var({}), var({}))",
        theme.var_name("translate-x"),
        theme.var_name("translate-y"),
        theme.var_name("rotate"),
        theme.var_name("scale-x"),
        theme.var_name("scale-y"),
    )
}

fn filter_defaults(theme: &dyn ThemeResolver) -> AstNode {
    at_root_anchored(
        UNIVERSAL,
        FILTER_SLOTS
            .iter()
            .map(|slot| decl(theme.var_name(slot), ""))
            .collect(),
    )
}

fn filter_chain(theme: &dyn ThemeResolver) -> String {
    FILTER_SLOTS
        .iter()
        .map(|slot| format!("var({})", theme.var_name(slot)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{fraction_percent, looks_like_length, percent_of};

    #[test]
    fn fractions_render_as_percentages() {
        assert_eq!(fraction_percent("1", "2").as_deref(), Some("50%"));
        assert_eq!(fraction_percent("1", "3").as_deref(), Some("33.333333%"));
        assert_eq!(fraction_percent("1", "0"), None);
    }

    #[test]
    fn opacity_ratios_become_percentages() {
        assert_eq!(percent_of("0.5").as_deref(), Some("50%"));
        assert_eq!(percent_of("1").as_deref(), Some("100%"));
    }

    #[test]
    fn lengths_are_told_apart_from_colors() {
        assert!(looks_like_length("14px"));
        assert!(looks_like_length("calc(1rem + 2px)"));
        assert!(!looks_like_length("#ff0000"));
        assert!(!looks_like_length("rgb(0 0 0)"));
    }
}
