//! Closed expression tree and its evaluator.

use std::collections::BTreeSet;

use crate::error::{ExprError, ExprResult};
use crate::scope::VariableSource;

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    /// Floored modulo: the result takes the sign of the divisor.
    Mod,
    Pow,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "^",
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> ExprResult<f64> {
        match self {
            BinaryOperator::Add => Ok(lhs + rhs),
            BinaryOperator::Sub => Ok(lhs - rhs),
            BinaryOperator::Mul => Ok(lhs * rhs),
            BinaryOperator::Div => {
                if rhs == 0.0 {
                    return Err(ExprError::DivisionByZero { op: "/" });
                }
                Ok(lhs / rhs)
            }
            BinaryOperator::Mod => {
                if rhs == 0.0 {
                    return Err(ExprError::DivisionByZero { op: "%" });
                }
                let r = lhs % rhs;
                if r != 0.0 && (r < 0.0) != (rhs < 0.0) {
                    Ok(r + rhs)
                } else {
                    Ok(r)
                }
            }
            BinaryOperator::Pow => {
                if lhs == 0.0 && rhs < 0.0 {
                    return Err(ExprError::DivisionByZero { op: "^" });
                }
                Ok(lhs.powf(rhs))
            }
        }
    }
}

/// The only functions callable from a rate expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Min,
    Max,
    Pow,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(Function::Abs),
            "min" => Some(Function::Min),
            "max" => Some(Function::Max),
            "pow" => Some(Function::Pow),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Min => "min",
            Function::Max => "max",
            Function::Pow => "pow",
        }
    }

    pub(crate) fn check_arity(self, got: usize) -> ExprResult<()> {
        let (ok, expected) = match self {
            Function::Abs => (got == 1, "1"),
            Function::Pow => (got == 2, "2"),
            Function::Min | Function::Max => (got >= 1, "at least 1"),
        };
        if ok {
            Ok(())
        } else {
            Err(ExprError::Arity {
                name: self.name(),
                expected,
                got,
            })
        }
    }

    fn apply(self, args: &[f64]) -> ExprResult<f64> {
        self.check_arity(args.len())?;
        match self {
            Function::Abs => Ok(args[0].abs()),
            Function::Pow => BinaryOperator::Pow.apply(args[0], args[1]),
            Function::Min => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
            Function::Max => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        }
    }
}

/// Rate expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Variable(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOperator, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn neg(operand: Expr) -> Self {
        Expr::Neg(Box::new(operand))
    }

    /// Evaluate against `scope`. The first unresolved name aborts evaluation.
    pub fn eval(&self, scope: &dyn VariableSource) -> ExprResult<f64> {
        match self {
            Expr::Constant(value) => Ok(*value),
            Expr::Variable(name) => {
                scope
                    .lookup(name)
                    .ok_or_else(|| ExprError::UndefinedVariable { name: name.clone() })
            }
            Expr::Neg(operand) => Ok(-operand.eval(scope)?),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.eval(scope)?;
                let rhs = rhs.eval(scope)?;
                op.apply(lhs, rhs)
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(scope))
                    .collect::<ExprResult<Vec<f64>>>()?;
                function.apply(&values)
            }
        }
    }

    /// Names referenced anywhere in the tree.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Variable(name) => {
                names.insert(name.as_str());
            }
            Expr::Neg(operand) => operand.collect_variables(names),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn floored_modulo_follows_divisor_sign() {
        assert_eq!(BinaryOperator::Mod.apply(-7.0, 3.0), Ok(2.0));
        assert_eq!(BinaryOperator::Mod.apply(7.0, -3.0), Ok(-2.0));
        assert_eq!(BinaryOperator::Mod.apply(7.0, 3.0), Ok(1.0));
    }

    #[test]
    fn zero_to_negative_power_fails() {
        assert!(matches!(
            BinaryOperator::Pow.apply(0.0, -1.0),
            Err(ExprError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn min_max_fold_all_arguments() {
        let e = Expr::Call {
            function: Function::Max,
            args: vec![
                Expr::Constant(1.0),
                Expr::Variable("x".into()),
                Expr::Constant(-4.0),
            ],
        };
        assert_eq!(e.eval(&env(&[("x", 3.0)])), Ok(3.0));
    }

    #[test]
    fn variables_are_deduplicated() {
        let e = Expr::binary(
            BinaryOperator::Mul,
            Expr::Variable("S".into()),
            Expr::binary(
                BinaryOperator::Add,
                Expr::Variable("S".into()),
                Expr::Variable("I".into()),
            ),
        );
        let names: Vec<&str> = e.variables().into_iter().collect();
        assert_eq!(names, vec!["I", "S"]);
    }
}
