//! # Expression Tree
//!
//! The parser turns expression text into an [`Expression`]: an arena of
//! nodes with parent back-links, closed once and immutable afterwards.
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Arithmetic, comparison and unary operator families
//! - **[node]** - [`NodeKind`], the arena tree and [`ExpressionBuilder`]
//!
//! ## Quick Start
//!
//! ```text
//! customer.orders.{? #this.total > 100 }.{ id }
//! ```
//!
//! Selects the orders of `customer` whose total exceeds 100 and projects
//! their ids.
//!
//! ## Core Concepts
//!
//! ### Chains
//!
//! Navigation steps separated by `.` (or `?.` for null-safe navigation)
//! form one flat `Chain` node. Each step is evaluated against the result of
//! the previous one; index expressions inside `[...]` are evaluated against
//! the root.
//!
//! ### Flattening
//!
//! Nested nodes of the same associative kind are merged while the tree is
//! built, so `a + b + c` is one `Add` node with three children and its
//! operands are folded left to right.
//!
//! ### Constant folding
//!
//! Literal-only subtrees are evaluated once and cached on the node. The
//! cache is a compute-once cell, so the tree can be shared across threads.
//!
//! ## Examples
//!
//! ```text
//! #{ "a" : 1, "b" : 2 }.keys.size()
//! @java.lang.Math@max(3, 4) + 1
//! items[^].name, items[$].name
//! #fact = :[ #this <= 1 ? 1 : #this * #fact(#this - 1) ], #fact(5)
//! ```
pub mod node;
pub mod operators;
pub mod tokens;

pub use node::{Expression, ExpressionBuilder, Node, NodeId, NodeKind, NodeRef};
pub use operators::{BinaryOp, CompareOp, UnaryOp};
pub use tokens::Token;
