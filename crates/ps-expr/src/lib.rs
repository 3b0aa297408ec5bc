//! ps-expr: sandboxed rate-expression language.
//!
//! Rate expressions are parsed once into a closed AST (numeric literals,
//! names, `+ - * / % ^`, unary minus, and the functions `abs`, `min`, `max`,
//! `pow`) and evaluated against a [`VariableSource`]. Nothing outside the
//! supplied scope is reachable during evaluation.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use ps_expr::RateExpression;
//!
//! let rate = RateExpression::parse("beta * S * lambda_i").unwrap();
//! let mut env = BTreeMap::new();
//! env.insert("beta".to_string(), 0.5);
//! env.insert("S".to_string(), 10.0);
//! env.insert("lambda_i".to_string(), 0.2);
//! assert_eq!(rate.evaluate(&env).unwrap(), 1.0);
//! ```

pub mod ast;
pub mod error;
pub mod expression;
pub mod parser;
pub mod scope;

pub use ast::{BinaryOperator, Expr, Function};
pub use error::{ExprError, ExprResult};
pub use expression::RateExpression;
pub use scope::{NamedSlice, Scope, VariableSource};
