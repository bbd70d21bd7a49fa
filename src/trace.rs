//! Evaluation trace.
//!
//! When tracing is enabled every node evaluation opens an [`Evaluation`]
//! that records the node, its source, and finally its result or error.
//! Evaluations form a multiway tree mirroring the recursion, stored in an
//! [`EvaluationPool`] arena and linked with first/last child and
//! next/previous sibling indices.

use std::fmt::{self, Write as _};

use crate::{
    ast::{NodeId, NodeRef},
    error::{OgnlError, Result},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvaluationId(usize);

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub node: NodeId,
    /// Printed form of the node
    pub text: String,
    pub source: Value,
    pub set_operation: bool,
    pub result: Option<Value>,
    pub error: Option<OgnlError>,
    parent: Option<EvaluationId>,
    first_child: Option<EvaluationId>,
    last_child: Option<EvaluationId>,
    next: Option<EvaluationId>,
    previous: Option<EvaluationId>,
}

impl Evaluation {
    pub fn parent(&self) -> Option<EvaluationId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<EvaluationId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<EvaluationId> {
        self.last_child
    }

    pub fn next(&self) -> Option<EvaluationId> {
        self.next
    }

    pub fn previous(&self) -> Option<EvaluationId> {
        self.previous
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationPool {
    evaluations: Vec<Evaluation>,
    root: Option<EvaluationId>,
    current: Option<EvaluationId>,
    last: Option<EvaluationId>,
}

impl EvaluationPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an evaluation as the last child of the current one.
    pub fn push(&mut self, node: NodeRef<'_>, source: &Value, set_operation: bool) -> EvaluationId {
        if self.current.is_none() {
            // a new top-level evaluation drops the previous tree
            self.evaluations.clear();
            self.last = None;
        }
        let id = EvaluationId(self.evaluations.len());
        let parent = self.current;
        let previous = parent.and_then(|p| self.evaluations[p.0].last_child);
        self.evaluations.push(Evaluation {
            node: node.id(),
            text: node.to_string(),
            source: source.clone(),
            set_operation,
            result: None,
            error: None,
            parent,
            first_child: None,
            last_child: None,
            next: None,
            previous,
        });
        if let Some(prev) = previous {
            self.evaluations[prev.0].next = Some(id);
        }
        match parent {
            Some(p) => {
                let parent = &mut self.evaluations[p.0];
                parent.first_child.get_or_insert(id);
                parent.last_child = Some(id);
            }
            None => self.root = Some(id),
        }
        self.current = Some(id);
        id
    }

    /// Closes the current evaluation with its outcome.
    pub fn pop(&mut self, outcome: &Result<Value>, keep_last: bool) {
        let Some(id) = self.current else {
            return;
        };
        let evaluation = &mut self.evaluations[id.0];
        match outcome {
            Ok(value) => evaluation.result = Some(value.clone()),
            Err(err) => evaluation.error = Some(err.clone()),
        }
        self.current = evaluation.parent;
        self.last = Some(id);
        if self.current.is_none() {
            self.root = None;
            if !keep_last {
                self.last = None;
            }
        }
    }

    pub fn get(&self, id: EvaluationId) -> &Evaluation {
        &self.evaluations[id.0]
    }

    /// Root of the evaluation in progress.
    pub fn root_evaluation(&self) -> Option<&Evaluation> {
        self.root.map(|id| self.get(id))
    }

    pub fn current_evaluation(&self) -> Option<&Evaluation> {
        self.current.map(|id| self.get(id))
    }

    /// Most recently finished evaluation. After a top-level call completes
    /// this is its root, when the context keeps it.
    pub fn last_evaluation(&self) -> Option<EvaluationId> {
        self.last
    }

    pub fn children(&self, id: EvaluationId) -> impl Iterator<Item = EvaluationId> + '_ {
        std::iter::successors(self.get(id).first_child, |c| self.get(*c).next)
    }

    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Indented rendering of the subtree under `id`.
    pub fn render(&self, id: EvaluationId) -> String {
        let mut out = String::new();
        self.render_into(&mut out, id, 0);
        out
    }

    fn render_into(&self, out: &mut String, id: EvaluationId, depth: usize) {
        let e = self.get(id);
        let op = if e.set_operation { "set" } else { "get" };
        let _ = write!(out, "{:indent$}{} {} <- {}", "", op, e.text, e.source, indent = depth * 2);
        match (&e.result, &e.error) {
            (_, Some(err)) => {
                let _ = writeln!(out, " => error: {}", err);
            }
            (Some(v), None) => {
                let _ = writeln!(out, " => {}", v);
            }
            (None, None) => out.push('\n'),
        }
        for child in self.children(id) {
            self.render_into(out, child, depth + 1);
        }
    }
}

impl fmt::Display for EvaluationPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root.or(self.last) {
            Some(id) => f.write_str(&self.render(id)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;

    #[test]
    fn siblings_link_in_evaluation_order() {
        let expr: Expression = "a + b".parse().unwrap();
        let root = expr.root();
        let mut pool = EvaluationPool::new();
        let top = pool.push(root, &Value::Null, false);
        let first = pool.push(root.child(0), &Value::Null, false);
        pool.pop(&Ok(Value::Int(1)), true);
        let second = pool.push(root.child(1), &Value::Null, false);
        pool.pop(&Ok(Value::Int(2)), true);
        pool.pop(&Ok(Value::Int(3)), true);

        assert_eq!(pool.children(top).collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(pool.get(second).previous(), Some(first));
        assert_eq!(pool.get(first).parent(), Some(top));
        assert_eq!(pool.last_evaluation(), Some(top));
        assert_eq!(
            pool.to_string(),
            "get a + b <- null => 3\n  get a <- null => 1\n  get b <- null => 2\n"
        );
    }

    #[test]
    fn finished_trees_are_dropped_unless_kept() {
        let expr: Expression = "1".parse().unwrap();
        let mut pool = EvaluationPool::new();
        pool.push(expr.root(), &Value::Null, false);
        pool.pop(&Err(OgnlError::DivisionByZero), false);
        assert_eq!(pool.last_evaluation(), None);
        assert_eq!(pool.len(), 1);
    }
}
