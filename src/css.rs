use crate::ast::AstNode;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;

/// Generated stylesheet text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssOutput(String);

impl CssOutput {
    pub fn new(css: String) -> Self {
        Self(css)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for CssOutput {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for CssOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<String> for CssOutput {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<CssOutput> for String {
    fn from(value: CssOutput) -> Self {
        value.0
    }
}

/// Result of serializing one tree: the in-place rules and the hoisted blocks
/// collected from `AtRoot` nodes, each hoisted block listed once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Serialized {
    pub css: String,
    pub root_rules: Vec<String>,
}

/// At-rules whose bodies do not inherit the enclosing selector.
const UNSCOPED_AT_RULES: [&str; 5] = [
    "property",
    "font-face",
    "page",
    "counter-style",
    "keyframes",
];

pub fn serialize_class(nodes: &[AstNode], class_name: &str) -> Serialized {
    let selector = class_selector(class_name);
    serialize_with_selector(nodes, Some(&selector))
}

pub fn serialize_nodes(nodes: &[AstNode]) -> Serialized {
    serialize_with_selector(nodes, None)
}

fn serialize_with_selector(nodes: &[AstNode], selector: Option<&str>) -> Serialized {
    let mut emitter = Emitter::default();
    let rules = emitter.emit(nodes, selector);
    Serialized {
        css: rules.join(" "),
        root_rules: emitter.root_rules,
    }
}

#[derive(Default)]
struct Emitter {
    root_rules: Vec<String>,
    seen_roots: HashSet<String>,
}

impl Emitter {
    fn emit(&mut self, nodes: &[AstNode], selector: Option<&str>) -> Vec<String> {
        let mut out = Vec::new();
        let mut pending = Vec::new();

        for node in nodes {
            if let AstNode::Decl {
                prop,
                value,
                important,
            } = node
            {
                pending.push(format_declaration(prop, value, *important));
                continue;
            }

            flush_declarations(&mut pending, selector, &mut out);
            match node {
                AstNode::Decl { .. } => {}
                AstNode::Rule {
                    selector: nested,
                    children,
                } => {
                    let resolved = match selector {
                        Some(parent) => resolve_nested_selector(nested, parent),
                        None => nested.clone(),
                    };
                    out.extend(self.emit(children, Some(&resolved)));
                }
                AstNode::StyleRule {
                    selector: own,
                    children,
                } => {
                    out.extend(self.emit(children, Some(own)));
                }
                AstNode::AtRule {
                    name,
                    params,
                    children,
                } => {
                    let head = if params.is_empty() {
                        format!("@{}", name)
                    } else {
                        format!("@{} {}", name, params)
                    };
                    if children.is_empty() {
                        out.push(format!("{};", head));
                        continue;
                    }
                    let inner_selector = if UNSCOPED_AT_RULES.contains(&name.as_str()) {
                        None
                    } else {
                        selector
                    };
                    let inner = self.emit(children, inner_selector);
                    if !inner.is_empty() {
                        out.push(format!("{} {{ {} }}", head, inner.join(" ")));
                    }
                }
                AstNode::AtRoot { children, anchor } => {
                    let anchor = anchor.as_deref().unwrap_or(":root");
                    for hoisted in self.emit(children, Some(anchor)) {
                        if self.seen_roots.insert(hoisted.clone()) {
                            self.root_rules.push(hoisted);
                        }
                    }
                }
            }
        }

        flush_declarations(&mut pending, selector, &mut out);
        out
    }
}

fn flush_declarations(pending: &mut Vec<String>, selector: Option<&str>, out: &mut Vec<String>) {
    if pending.is_empty() {
        return;
    }
    let body = pending.join(" ");
    match selector {
        Some(selector) => out.push(format!("{} {{ {} }}", selector, body)),
        None => out.push(body),
    }
    pending.clear();
}

fn format_declaration(prop: &str, value: &str, important: bool) -> String {
    if important {
        format!("{}: {} !important;", prop, value)
    } else {
        format!("{}: {};", prop, value)
    }
}

pub fn class_selector(class: &str) -> String {
    format!(".{}", escape_selector(class))
}

pub fn escape_selector(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len() * 2);

    for ch in class.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\:"),
            '/' => escaped.push_str("\\/"),
            '[' => escaped.push_str("\\["),
            ']' => escaped.push_str("\\]"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '&' => escaped.push_str("\\&"),
            '>' => escaped.push_str("\\>"),
            '<' => escaped.push_str("\\<"),
            '+' => escaped.push_str("\\+"),
            '~' => escaped.push_str("\\~"),
            ',' => escaped.push_str("\\,"),
            '%' => escaped.push_str("\\%"),
            '=' => escaped.push_str("\\="),
            '!' => escaped.push_str("\\!"),
            '*' => escaped.push_str("\\*"),
            '@' => escaped.push_str("\\@"),
            '#' => escaped.push_str("\\#"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '.' => escaped.push_str("\\."),
            ' ' => escaped.push_str("\\ "),
            _ => escaped.push(ch),
        }
    }

    escaped
}

/// Substitutes `parent` into `nested`. Both sides may be selector lists; the
/// result is their cross product.
pub fn resolve_nested_selector(nested: &str, parent: &str) -> String {
    let parents = split_selector_list(parent);
    let mut resolved = Vec::new();

    for part in split_selector_list(nested) {
        for parent in &parents {
            if contains_nesting_marker(part) {
                resolved.push(replace_nesting_marker(part, parent));
            } else {
                resolved.push(format!("{} {}", parent, part));
            }
        }
    }

    resolved.join(", ")
}

/// Splits on top-level commas, skipping escapes, quotes and bracketed groups.
pub fn split_selector_list(selector: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0usize;

    for (idx, ch) in selector.char_indices() {
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
            '(' | '[' if quote.is_none() => depth += 1,
            ')' | ']' if quote.is_none() => depth = depth.saturating_sub(1),
            ',' if quote.is_none() && depth == 0 => {
                parts.push(selector[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(selector[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

fn contains_nesting_marker(selector: &str) -> bool {
    let mut escaped = false;
    for ch in selector.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '&' => return true,
            _ => {}
        }
    }
    false
}

fn replace_nesting_marker(selector: &str, parent: &str) -> String {
    let mut out = String::with_capacity(selector.len() + parent.len());
    let mut escaped = false;
    for ch in selector.chars() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' => {
                escaped = true;
                out.push(ch);
            }
            '&' => out.push_str(parent),
            _ => out.push(ch),
        }
    }
    out
}
