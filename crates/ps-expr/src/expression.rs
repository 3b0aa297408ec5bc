//! Parsed rate expressions that remember their source text.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ast::Expr;
use crate::error::{ExprError, ExprResult};
use crate::parser::parse_expression;
use crate::scope::VariableSource;

/// A rate formula parsed once and evaluated many times.
#[derive(Debug, Clone, PartialEq)]
pub struct RateExpression {
    source: String,
    expr: Expr,
}

impl RateExpression {
    pub fn parse(source: impl Into<String>) -> ExprResult<Self> {
        let source = source.into();
        let expr = parse_expression(&source)?;
        Ok(Self { source, expr })
    }

    /// Wrap a constant rate.
    pub fn constant(value: f64) -> Self {
        Self {
            source: value.to_string(),
            expr: Expr::Constant(value),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn evaluate(&self, scope: &dyn VariableSource) -> ExprResult<f64> {
        self.expr.eval(scope)
    }

    pub fn variables(&self) -> BTreeSet<&str> {
        self.expr.variables()
    }
}

impl fmt::Display for RateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for RateExpression {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RateExpression {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for RateExpression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let source = String::deserialize(deserializer)?;
        Self::parse(source).map_err(serde::de::Error::custom)
    }
}
