use std::{
    fmt,
    str::FromStr,
    sync::{Arc, OnceLock},
};

use crate::{
    ast::operators::{BinaryOp, CompareOp, UnaryOp},
    parser::{ParseError, Parser},
    value::Value,
};

/// Index of a node inside its [`Expression`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Closed set of node kinds, each carrying exactly its own payload.
///
/// Operands and steps are children of the node, never part of the kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `a, b, c`: evaluates all children, yields the last
    Sequence,
    /// `lhs = rhs`
    Assign,
    /// `cond ? then : else`
    Test,
    /// `a || b`
    Or,
    /// `a && b`
    And,
    Unary(UnaryOp),
    Binary(BinaryOp),
    Compare(CompareOp),
    /// `a in b` / `a not in b`
    In { negated: bool },
    /// `x instanceof Class`
    Instanceof { class_name: String },
    /// Literal, including lambdas and dynamic subscripts
    Const(Value),
    /// `#this`
    ThisVarRef,
    /// `#root`
    RootVarRef,
    /// `#name`
    VarRef { name: String },
    /// `.name` (child: name constant) or `[index]` (child: index expression)
    Property { indexed: bool },
    /// `name(args)`
    Method { name: String },
    /// `@Class@field`
    StaticField { class_name: String, field: String },
    /// `@Class@method(args)`
    StaticMethod { class_name: String, method: String },
    /// `new Class(args)`, or for arrays `new T[size]` / `new T[] { items }`
    Ctor { class_name: String, array: bool },
    /// `a.b[c].d()`
    Chain { null_safe: bool },
    /// `(expr)(arg)`: evaluates `expr` to an expression and runs it with `arg` as root
    Eval,
    /// `{ a, b }`
    List,
    /// `#{ k : v }` or `#@Class@{ k : v }`
    Map { class_name: Option<String> },
    /// One `k : v` entry of a map literal
    KeyValue,
    /// `.{ expr }`
    Project,
    /// `.{? expr }`
    Select,
    /// `.{^ expr }`
    SelectFirst,
    /// `.{$ expr }`
    SelectLast,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Sequence => "Sequence",
            NodeKind::Assign => "Assign",
            NodeKind::Test => "Test",
            NodeKind::Or => "Or",
            NodeKind::And => "And",
            NodeKind::Unary(_) => "Unary",
            NodeKind::Binary(_) => "Binary",
            NodeKind::Compare(_) => "Compare",
            NodeKind::In { .. } => "In",
            NodeKind::Instanceof { .. } => "Instanceof",
            NodeKind::Const(_) => "Const",
            NodeKind::ThisVarRef => "ThisVarRef",
            NodeKind::RootVarRef => "RootVarRef",
            NodeKind::VarRef { .. } => "VarRef",
            NodeKind::Property { .. } => "Property",
            NodeKind::Method { .. } => "Method",
            NodeKind::StaticField { .. } => "StaticField",
            NodeKind::StaticMethod { .. } => "StaticMethod",
            NodeKind::Ctor { .. } => "Ctor",
            NodeKind::Chain { .. } => "Chain",
            NodeKind::Eval => "Eval",
            NodeKind::List => "List",
            NodeKind::Map { .. } => "Map",
            NodeKind::KeyValue => "KeyValue",
            NodeKind::Project => "Project",
            NodeKind::Select => "Select",
            NodeKind::SelectFirst => "SelectFirst",
            NodeKind::SelectLast => "SelectLast",
        }
    }

    /// Whether a child of kind `child` is spliced into a parent of this kind on close.
    fn absorbs(&self, child: &NodeKind) -> bool {
        match (self, child) {
            (NodeKind::Sequence, NodeKind::Sequence)
            | (NodeKind::Or, NodeKind::Or)
            | (NodeKind::And, NodeKind::And)
            | (NodeKind::Chain { .. }, NodeKind::Chain { .. }) => true,
            (NodeKind::Binary(a), NodeKind::Binary(b)) => a == b && a.is_associative(),
            _ => false,
        }
    }

    fn check_arity(&self, count: usize) {
        let ok = match self {
            NodeKind::Test => count == 3,
            NodeKind::Assign | NodeKind::Compare(_) | NodeKind::In { .. } | NodeKind::Eval => {
                count == 2
            }
            NodeKind::Unary(_)
            | NodeKind::Instanceof { .. }
            | NodeKind::Property { .. }
            | NodeKind::Project
            | NodeKind::Select
            | NodeKind::SelectFirst
            | NodeKind::SelectLast => count == 1,
            NodeKind::Const(_)
            | NodeKind::ThisVarRef
            | NodeKind::RootVarRef
            | NodeKind::VarRef { .. }
            | NodeKind::StaticField { .. } => count == 0,
            NodeKind::Ctor { array: true, .. } => count == 1,
            NodeKind::KeyValue => count == 1 || count == 2,
            NodeKind::Binary(_) | NodeKind::Or | NodeKind::And => count >= 2,
            NodeKind::Sequence | NodeKind::Chain { .. } => count >= 1,
            NodeKind::Method { .. }
            | NodeKind::StaticMethod { .. }
            | NodeKind::Ctor { array: false, .. }
            | NodeKind::List
            | NodeKind::Map { .. } => true,
        };
        assert!(
            ok,
            "malformed tree: {} node cannot have {} children",
            self.name(),
            count
        );
    }

    /// Binding strength used when printing; higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            NodeKind::Sequence => 1,
            NodeKind::Assign => 2,
            NodeKind::Test => 3,
            NodeKind::Or => 4,
            NodeKind::And => 5,
            NodeKind::Binary(BinaryOp::BitOr) => 6,
            NodeKind::Binary(BinaryOp::Xor) => 7,
            NodeKind::Binary(BinaryOp::BitAnd) => 8,
            NodeKind::Compare(op) if op.is_equality() => 9,
            NodeKind::Compare(_) | NodeKind::In { .. } => 10,
            NodeKind::Binary(op) if op.is_shift() => 11,
            NodeKind::Binary(BinaryOp::Add | BinaryOp::Subtract) => 12,
            NodeKind::Binary(_) => 13,
            NodeKind::Unary(_) => 14,
            NodeKind::Instanceof { .. } => 15,
            _ => 16,
        }
    }
}

/// One node of the tree.
///
/// The constant flag and the folded value are each published at most once.
/// Racing first evaluations may both compute, but readers only ever see a
/// fully built value.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    constant: OnceLock<bool>,
    value: OnceLock<Value>,
}

impl Node {
    fn new(kind: NodeKind, children: Vec<NodeId>) -> Self {
        Node {
            kind,
            parent: None,
            children,
            constant: OnceLock::new(),
            value: OnceLock::new(),
        }
    }
}

/// A closed, immutable expression tree.
///
/// Nodes live in one arena; parent links are indices, so the tree can be
/// shared across threads and evaluated concurrently against independent
/// contexts.
#[derive(Debug, Clone)]
pub struct Expression {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Expression {
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { expr: self, id }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn into_shared(self) -> Arc<Expression> {
        Arc::new(self)
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s)?.parse()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root())
    }
}

/// Borrowed handle to one node of an [`Expression`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    expr: &'a Expression,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a Node {
        &self.expr.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn expression(&self) -> &'a Expression {
        self.expr
    }

    pub fn kind(&self) -> &'a NodeKind {
        &self.data().kind
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|id| self.expr.node(id))
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// The `index`th child. Panics on a malformed tree.
    pub fn child(&self, index: usize) -> NodeRef<'a> {
        let id = *self.data().children.get(index).unwrap_or_else(|| {
            panic!(
                "malformed tree: {} node has no child {}",
                self.kind().name(),
                index
            )
        });
        self.expr.node(id)
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeRef<'a>> + DoubleEndedIterator + 'a {
        let expr = self.expr;
        self.data().children.iter().map(move |id| expr.node(*id))
    }

    pub(crate) fn constant_flag(&self) -> &'a OnceLock<bool> {
        &self.data().constant
    }

    pub(crate) fn constant_value(&self) -> &'a OnceLock<Value> {
        &self.data().value
    }

    /// The name constant of a non-indexed property step.
    pub fn property_name(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Property { indexed: false } => match self.child(0).kind() {
                NodeKind::Const(Value::String(name)) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    fn needs_parens(&self, child: NodeRef<'_>, position: usize) -> bool {
        let (parent, inner) = (self.kind().precedence(), child.kind().precedence());
        inner < parent || (inner == parent && inner < 16 && position > 0)
    }

    fn write_child(&self, f: &mut fmt::Formatter<'_>, position: usize) -> fmt::Result {
        let child = self.child(position);
        if self.needs_parens(child, position) {
            write!(f, "({})", child)
        } else {
            write!(f, "{}", child)
        }
    }

    fn write_joined(&self, f: &mut fmt::Formatter<'_>, separator: &str) -> fmt::Result {
        for i in 0..self.child_count() {
            if i > 0 {
                f.write_str(separator)?;
            }
            self.write_child(f, i)?;
        }
        Ok(())
    }

    fn write_args(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.children().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if matches!(arg.kind(), NodeKind::Sequence) {
                write!(f, "({})", arg)?;
            } else {
                write!(f, "{}", arg)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", self.kind())
            .field("text", &self.to_string())
            .finish()
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "{:?}", &**s),
        Value::Char(c) => write!(f, "'{}'", c.escape_default()),
        Value::Long(n) => write!(f, "{}L", n),
        Value::BigInteger(n) => write!(f, "{}H", n),
        Value::Float(n) => write!(f, "{:?}F", n),
        Value::BigDecimal(n) => write!(f, "{}B", n),
        Value::Byte(n) => write!(f, "{}", n),
        Value::Short(n) => write!(f, "{}", n),
        Value::Lambda(body) => write!(f, ":[{}]", body),
        other => write!(f, "{}", other),
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            NodeKind::Sequence => self.write_joined(f, ", "),
            NodeKind::Assign => self.write_joined(f, " = "),
            NodeKind::Test => {
                self.write_child(f, 0)?;
                f.write_str(" ? ")?;
                self.write_child(f, 1)?;
                f.write_str(" : ")?;
                self.write_child(f, 2)
            }
            NodeKind::Or => self.write_joined(f, " || "),
            NodeKind::And => self.write_joined(f, " && "),
            NodeKind::Unary(op) => {
                f.write_str(op.symbol())?;
                self.write_child(f, 0)
            }
            NodeKind::Binary(op) => self.write_joined(f, &format!(" {} ", op)),
            NodeKind::Compare(op) => self.write_joined(f, &format!(" {} ", op)),
            NodeKind::In { negated } => {
                self.write_joined(f, if *negated { " not in " } else { " in " })
            }
            NodeKind::Instanceof { class_name } => {
                self.write_child(f, 0)?;
                write!(f, " instanceof {}", class_name)
            }
            NodeKind::Const(value) => write_literal(f, value),
            NodeKind::ThisVarRef => f.write_str("#this"),
            NodeKind::RootVarRef => f.write_str("#root"),
            NodeKind::VarRef { name } => write!(f, "#{}", name),
            NodeKind::Property { indexed: true } => write!(f, "[{}]", self.child(0)),
            NodeKind::Property { indexed: false } => match self.property_name() {
                Some(name) => f.write_str(name),
                None => write!(f, "{}", self.child(0)),
            },
            NodeKind::Method { name } => {
                write!(f, "{}(", name)?;
                self.write_args(f)?;
                f.write_str(")")
            }
            NodeKind::StaticField { class_name, field } => write!(f, "@{}@{}", class_name, field),
            NodeKind::StaticMethod { class_name, method } => {
                write!(f, "@{}@{}(", class_name, method)?;
                self.write_args(f)?;
                f.write_str(")")
            }
            NodeKind::Ctor { class_name, array: false } => {
                write!(f, "new {}(", class_name)?;
                self.write_args(f)?;
                f.write_str(")")
            }
            NodeKind::Ctor { class_name, array: true } => {
                let init = self.child(0);
                if matches!(init.kind(), NodeKind::List) {
                    write!(f, "new {}[] {}", class_name, init)
                } else {
                    write!(f, "new {}[{}]", class_name, init)
                }
            }
            NodeKind::Chain { null_safe } => {
                let separator = if *null_safe { "?." } else { "." };
                for (i, step) in self.children().enumerate() {
                    let bracketed = matches!(step.kind(), NodeKind::Property { indexed: true });
                    if i > 0 && !bracketed {
                        f.write_str(separator)?;
                    }
                    if step.kind().precedence() < 16 {
                        write!(f, "({})", step)?;
                    } else {
                        write!(f, "{}", step)?;
                    }
                }
                Ok(())
            }
            NodeKind::Eval => write!(f, "({})({})", self.child(0), self.child(1)),
            NodeKind::List => {
                f.write_str("{ ")?;
                self.write_args(f)?;
                f.write_str(" }")
            }
            NodeKind::Map { class_name } => {
                match class_name {
                    Some(name) => write!(f, "#@{}@{{ ", name)?,
                    None => f.write_str("#{ ")?,
                }
                self.write_args(f)?;
                f.write_str(" }")
            }
            NodeKind::KeyValue => {
                write!(f, "{}", self.child(0))?;
                if self.child_count() == 2 {
                    write!(f, " : {}", self.child(1))?;
                }
                Ok(())
            }
            NodeKind::Project => write!(f, "{{ {} }}", self.child(0)),
            NodeKind::Select => write!(f, "{{? {} }}", self.child(0)),
            NodeKind::SelectFirst => write!(f, "{{^ {} }}", self.child(0)),
            NodeKind::SelectLast => write!(f, "{{$ {} }}", self.child(0)),
        }
    }
}

/// Builds an [`Expression`] bottom-up.
///
/// Each call to [`node`](Self::node) is the close step for that node: its
/// arity is checked and children of the same associative kind are spliced
/// in place, so `a + b + c` ends up as one `Add` node with three children.
///
/// ```
/// use ognl::ast::{BinaryOp, ExpressionBuilder, NodeKind};
/// use ognl::Value;
///
/// let mut b = ExpressionBuilder::new();
/// let one = b.leaf(NodeKind::Const(Value::Int(1)));
/// let two = b.leaf(NodeKind::Const(Value::Int(2)));
/// let three = b.leaf(NodeKind::Const(Value::Int(3)));
/// let inner = b.node(NodeKind::Binary(BinaryOp::Add), vec![one, two]);
/// let outer = b.node(NodeKind::Binary(BinaryOp::Add), vec![inner, three]);
/// let expr = b.finish(outer);
/// assert_eq!(expr.root().child_count(), 3);
/// assert_eq!(expr.to_string(), "1 + 2 + 3");
/// ```
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    nodes: Vec<Node>,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(&mut self, kind: NodeKind) -> NodeId {
        self.node(kind, Vec::new())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Adds a node over `children`, flattening same-kind children.
    ///
    /// # Panics
    ///
    /// Panics when the child count does not fit the kind.
    pub fn node(&mut self, mut kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            let child_kind = &self.nodes[child.0].kind;
            if kind.absorbs(child_kind) {
                if let (
                    NodeKind::Chain { null_safe },
                    NodeKind::Chain {
                        null_safe: child_safe,
                    },
                ) = (&mut kind, child_kind)
                {
                    *null_safe |= *child_safe;
                }
                flat.extend(self.nodes[child.0].children.iter().copied());
            } else {
                flat.push(child);
            }
        }
        kind.check_arity(flat.len());
        let id = NodeId(self.nodes.len());
        for child in &flat {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(Node::new(kind, flat));
        id
    }

    /// Closes the tree at `root`, dropping nodes absorbed by flattening.
    pub fn finish(self, root: NodeId) -> Expression {
        let mut remap = vec![None; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            remap[id.0] = Some(NodeId(order.len()));
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }

        let mut old: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for id in &order {
            let Some(mut node) = old[id.0].take() else {
                panic!("malformed tree: node {} is shared by two parents", id.0);
            };
            node.children = node
                .children
                .iter()
                .map(|c| remap[c.0].unwrap_or_else(|| panic!("malformed tree: dangling child")))
                .collect();
            node.parent = None;
            nodes.push(node);
        }
        for i in 0..nodes.len() {
            for c in nodes[i].children.clone() {
                nodes[c.0].parent = Some(NodeId(i));
            }
        }
        Expression {
            nodes,
            root: NodeId(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(b: &mut ExpressionBuilder, n: i32) -> NodeId {
        b.leaf(NodeKind::Const(Value::Int(n)))
    }

    #[test]
    fn subtraction_is_not_flattened() {
        let mut b = ExpressionBuilder::new();
        let (x, y, z) = (int(&mut b, 1), int(&mut b, 2), int(&mut b, 3));
        let inner = b.node(NodeKind::Binary(BinaryOp::Subtract), vec![x, y]);
        let outer = b.node(NodeKind::Binary(BinaryOp::Subtract), vec![inner, z]);
        let expr = b.finish(outer);
        assert_eq!(expr.root().child_count(), 2);
        assert_eq!(expr.to_string(), "1 - 2 - 3");
    }

    #[test]
    fn parents_point_at_owners_after_finish() {
        let mut b = ExpressionBuilder::new();
        let (x, y, z) = (int(&mut b, 1), int(&mut b, 2), int(&mut b, 3));
        let inner = b.node(NodeKind::Binary(BinaryOp::Multiply), vec![x, y]);
        let outer = b.node(NodeKind::Binary(BinaryOp::Multiply), vec![inner, z]);
        let expr = b.finish(outer);
        let root = expr.root();
        assert!(root.parent().is_none());
        for child in root.children() {
            assert_eq!(child.parent().map(|p| p.id()), Some(root.id()));
        }
        assert_eq!(expr.len(), 4);
    }

    #[test]
    fn chain_flattening_keeps_null_safety() {
        let mut b = ExpressionBuilder::new();
        let name = b.leaf(NodeKind::Const(Value::string("a")));
        let a = b.node(NodeKind::Property { indexed: false }, vec![name]);
        let name = b.leaf(NodeKind::Const(Value::string("b")));
        let bb = b.node(NodeKind::Property { indexed: false }, vec![name]);
        let inner = b.node(NodeKind::Chain { null_safe: true }, vec![a, bb]);
        let name = b.leaf(NodeKind::Const(Value::string("c")));
        let c = b.node(NodeKind::Property { indexed: false }, vec![name]);
        let outer = b.node(NodeKind::Chain { null_safe: false }, vec![inner, c]);
        let expr = b.finish(outer);
        assert_eq!(expr.root().kind(), &NodeKind::Chain { null_safe: true });
        assert_eq!(expr.to_string(), "a?.b?.c");
    }

    #[test]
    #[should_panic(expected = "malformed tree")]
    fn ternary_requires_three_children() {
        let mut b = ExpressionBuilder::new();
        let (x, y) = (int(&mut b, 1), int(&mut b, 2));
        b.node(NodeKind::Test, vec![x, y]);
    }

    #[test]
    fn display_parenthesizes_weaker_children() {
        let mut b = ExpressionBuilder::new();
        let (x, y, z) = (int(&mut b, 1), int(&mut b, 2), int(&mut b, 3));
        let sum = b.node(NodeKind::Binary(BinaryOp::Add), vec![x, y]);
        let product = b.node(NodeKind::Binary(BinaryOp::Multiply), vec![sum, z]);
        assert_eq!(b.finish(product).to_string(), "(1 + 2) * 3");
    }
}
