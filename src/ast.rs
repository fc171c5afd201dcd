//! Node types produced by the compiler for a single utility class.
//!
//! Trees are plain data: two compilations of the same class against the same
//! context produce trees that compare equal.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AstNode {
    /// A single `property: value` pair. An empty value is kept and printed.
    Decl {
        prop: String,
        value: String,
        important: bool,
    },
    /// A selector relative to the enclosing one. `&` marks where the parent
    /// selector is substituted; without `&` the rule nests as a descendant.
    Rule {
        selector: String,
        children: Vec<AstNode>,
    },
    /// A selector emitted as written, ignoring the enclosing selector.
    StyleRule {
        selector: String,
        children: Vec<AstNode>,
    },
    AtRule {
        name: String,
        params: String,
        children: Vec<AstNode>,
    },
    /// Content hoisted out of document order and emitted once per stylesheet.
    /// `anchor` is the selector that hosts bare declarations in the block
    /// (`:root` when absent).
    AtRoot {
        children: Vec<AstNode>,
        anchor: Option<String>,
    },
}

pub fn decl(prop: impl Into<String>, value: impl Into<String>) -> AstNode {
    AstNode::Decl {
        prop: prop.into(),
        value: value.into(),
        important: false,
    }
}

pub fn rule(selector: impl Into<String>, children: Vec<AstNode>) -> AstNode {
    AstNode::Rule {
        selector: selector.into(),
        children,
    }
}

pub fn style_rule(selector: impl Into<String>, children: Vec<AstNode>) -> AstNode {
    AstNode::StyleRule {
        selector: selector.into(),
        children,
    }
}

pub fn at_rule(
    name: impl Into<String>,
    params: impl Into<String>,
    children: Vec<AstNode>,
) -> AstNode {
    AstNode::AtRule {
        name: name.into(),
        params: params.into(),
        children,
    }
}

pub fn at_root(children: Vec<AstNode>) -> AstNode {
    AstNode::AtRoot {
        children,
        anchor: None,
    }
}

pub fn at_root_anchored(anchor: impl Into<String>, children: Vec<AstNode>) -> AstNode {
    AstNode::AtRoot {
        children,
        anchor: Some(anchor.into()),
    }
}

impl AstNode {
    pub fn is_decl(&self) -> bool {
        matches!(self, AstNode::Decl { .. })
    }

    pub fn is_at_root(&self) -> bool {
        matches!(self, AstNode::AtRoot { .. })
    }

    pub fn children(&self) -> &[AstNode] {
        match self {
            AstNode::Decl { .. } => &[],
            AstNode::Rule { children, .. }
            | AstNode::StyleRule { children, .. }
            | AstNode::AtRule { children, .. }
            | AstNode::AtRoot { children, .. } => children,
        }
    }

    /// Marks every declaration in the subtree as `!important`, except the
    /// ones inside hoisted blocks.
    pub fn into_important(self) -> AstNode {
        match self {
            AstNode::Decl { prop, value, .. } => AstNode::Decl {
                prop,
                value,
                important: true,
            },
            AstNode::Rule { selector, children } => AstNode::Rule {
                selector,
                children: mark_important(children),
            },
            AstNode::StyleRule { selector, children } => AstNode::StyleRule {
                selector,
                children: mark_important(children),
            },
            AstNode::AtRule {
                name,
                params,
                children,
            } => AstNode::AtRule {
                name,
                params,
                children: mark_important(children),
            },
            root @ AstNode::AtRoot { .. } => root,
        }
    }
}

fn mark_important(children: Vec<AstNode>) -> Vec<AstNode> {
    children.into_iter().map(AstNode::into_important).collect()
}
