use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq, Clone)]
pub enum NodeKind {
    File,
    Set,
    Call,
    Give,
    Repeat,
    Method,
    New,
    Extends,
    Identifier(String),
    IdentifierPath,
    Expression,
    ArgList,
    ExpressionList,
    CallArguments,
    Block,
    Break(usize),
    ClassDef,
    If,
    Condition,
    Load,

    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::File => "FILE",
            NodeKind::Set => "SET",
            NodeKind::Call => "CAWL",
            NodeKind::Give => "GIVE",
            NodeKind::Repeat => "REPEAT",
            NodeKind::Method => "MWETHOD",
            NodeKind::New => "NEW",
            NodeKind::Extends => "EXTENDS",
            NodeKind::Identifier(_) => "IDENTIFIER",
            NodeKind::IdentifierPath => "IDENTIFIER_EXPR",
            NodeKind::Expression => "EXPWESSION",
            NodeKind::ArgList => "ARGLIST",
            NodeKind::ExpressionList => "EXPWESSIONLIST",
            NodeKind::CallArguments => "FCALL",
            NodeKind::Block => "FDEF",
            NodeKind::Break(_) => "BWEAK",
            NodeKind::ClassDef => "CLASSDEF",
            NodeKind::If => "IFFU",
            NodeKind::Condition => "COND",
            NodeKind::Load => "WOAD",
            NodeKind::Number(_) => "CONST_NUMBWER",
            NodeKind::String(_) => "CONST_STWING",
            NodeKind::Boolean(_) => "CONST_BWOOLEAN",
            NodeKind::Null => "CONST_NWULL",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Identifier(name) => write!(f, "{}: {}", self.name(), name),
            NodeKind::String(s) => write!(f, "{}: {:?}", self.name(), s),
            NodeKind::Number(n) => write!(f, "{}: {}", self.name(), n),
            NodeKind::Boolean(b) => write!(f, "{}: {}", self.name(), b),
            NodeKind::Break(levels) => write!(f, "{}: {}", self.name(), levels),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// A syntax tree node. Children are always stored in parse order.
#[derive(Debug, PartialEq, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Node>,
    pub line: usize,
}

impl Node {
    pub fn new(kind: NodeKind, line: usize) -> Self { Node { kind, children: Vec::new(), line } }

    pub fn with_children(kind: NodeKind, line: usize, children: Vec<Node>) -> Self {
        Node { kind, children, line }
    }

    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Names of the identifier leaves under this node, e.g. the parameters of an argument list.
    pub fn identifier_names(&self) -> Vec<String> {
        self.children.iter().filter_map(|e| e.identifier_name().map(str::to_owned)).collect()
    }

    /// Source form of an identifier path, `a's b's c`.
    pub fn path_string(&self) -> String {
        self.identifier_names().join("'s ")
    }

    pub fn pretty_print(&self) -> String {
        fn aux(node: &Node, prefix: &str, out: &mut Vec<String>, first: String) {
            out.push(format!("{}{}", first, node.kind));
            let count = node.children.len();
            for (i, child) in node.children.iter().enumerate() {
                let last = i + 1 == count;
                let connector = if last { "└─" } else { "├─" };
                let extension = if last { "  " } else { "│ " };
                aux(
                    child,
                    &format!("{}{}", prefix, extension),
                    out,
                    format!("{}{}", prefix, connector),
                );
            }
        }
        let mut lines = Vec::new();
        aux(self, "", &mut lines, String::new());
        lines.join("\n")
    }
}

/// Builds a tree top-down: `push` opens a node, `shift` appends a leaf to the open node and
/// `pop` closes the open node into its parent.
#[derive(Debug)]
pub struct TreeBuilder {
    root: Node,
    open: Vec<Node>,
}

impl TreeBuilder {
    pub fn new(root: Node) -> Self { TreeBuilder { root, open: Vec::new() } }

    fn current(&mut self) -> &mut Node {
        self.open.last_mut().unwrap_or(&mut self.root)
    }

    pub fn push(&mut self, node: Node) {
        self.open.push(node);
    }

    pub fn shift(&mut self, node: Node) {
        self.current().children.push(node);
    }

    pub fn pop(&mut self) {
        if let Some(node) = self.open.pop() {
            self.current().children.push(node);
        }
    }

    pub fn finish(mut self) -> Node {
        while !self.open.is_empty() {
            self.pop();
        }
        self.root
    }
}
