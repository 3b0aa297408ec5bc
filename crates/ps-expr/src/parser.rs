//! Parser from formula text to the closed [`Expr`] tree.
//!
//! evalexpr builds the operator tree; every node is then converted into our
//! own AST. Any operator outside the arithmetic subset is rejected here, so
//! evaluation never reaches evalexpr's context or function machinery.

use evalexpr::{Node, Operator, Value};

use crate::ast::{BinaryOperator, Expr, Function};
use crate::error::{ExprError, ExprResult};

/// Rewrite `**` into evalexpr's `^` power operator.
fn preprocess(formula: &str) -> String {
    formula.replace("**", "^")
}

/// Parse a formula into an [`Expr`].
pub fn parse_expression(formula: &str) -> ExprResult<Expr> {
    let preprocessed = preprocess(formula);
    let tree: Node = evalexpr::build_operator_tree(&preprocessed).map_err(|e| ExprError::Parse {
        source_text: formula.to_string(),
        message: e.to_string(),
    })?;
    convert_node(&tree)
}

fn unsupported(what: impl Into<String>) -> ExprError {
    ExprError::Unsupported { what: what.into() }
}

fn binary(node: &Node, op: BinaryOperator) -> ExprResult<Expr> {
    let children = node.children();
    if children.len() != 2 {
        return Err(unsupported(format!(
            "`{}` requires exactly 2 operands",
            op.symbol()
        )));
    }
    Ok(Expr::binary(
        op,
        convert_node(&children[0])?,
        convert_node(&children[1])?,
    ))
}

/// evalexpr groups `a ^ b ^ c` as `(a ^ b) ^ c`; powers group to the right,
/// so an unparenthesized chain is rebuilt as `a ^ (b ^ c)`. A parenthesized
/// base sits under its own `RootNode` and ends the chain.
fn power_chain(node: &Node) -> ExprResult<Expr> {
    let mut exponents = Vec::new();
    let mut current = node;
    let base = loop {
        match current.children() {
            [base, exponent] => {
                exponents.push(exponent);
                if matches!(base.operator(), Operator::Exp) {
                    current = base;
                } else {
                    break base;
                }
            }
            _ => return Err(unsupported("`^` requires exactly 2 operands")),
        }
    };
    // Exponents were collected outermost first, i.e. rightmost first.
    let mut acc: Option<Expr> = None;
    for operand in exponents.into_iter().chain(std::iter::once(base)) {
        let value = convert_node(operand)?;
        acc = Some(match acc {
            Some(rhs) => Expr::binary(BinaryOperator::Pow, value, rhs),
            None => value,
        });
    }
    acc.ok_or_else(|| unsupported("empty power"))
}

fn convert_node(node: &Node) -> ExprResult<Expr> {
    match node.operator() {
        Operator::RootNode => match node.children() {
            [child] => convert_node(child),
            [] => Err(unsupported("empty expression")),
            _ => Err(unsupported("multiple top-level expressions")),
        },

        Operator::Const { value } => match value {
            Value::Float(f) => Ok(Expr::Constant(*f)),
            Value::Int(i) => Ok(Expr::Constant(*i as f64)),
            Value::Boolean(_) => Err(unsupported("boolean literal")),
            Value::String(_) => Err(unsupported("string literal")),
            _ => Err(unsupported("non-numeric literal")),
        },

        Operator::VariableIdentifierRead { identifier } => Ok(Expr::Variable(identifier.clone())),

        Operator::Add => match node.children() {
            [operand] => convert_node(operand),
            _ => binary(node, BinaryOperator::Add),
        },
        Operator::Sub => binary(node, BinaryOperator::Sub),
        Operator::Mul => binary(node, BinaryOperator::Mul),
        Operator::Div => binary(node, BinaryOperator::Div),
        Operator::Mod => binary(node, BinaryOperator::Mod),
        Operator::Exp => power_chain(node),

        Operator::Neg => match node.children() {
            [operand] => Ok(Expr::neg(convert_node(operand)?)),
            _ => Err(unsupported("negation requires exactly 1 operand")),
        },

        Operator::FunctionIdentifier { identifier } => {
            let function = Function::from_name(identifier).ok_or_else(|| {
                ExprError::UnknownFunction {
                    name: identifier.clone(),
                }
            })?;
            let args = function_arguments(node)?;
            function.check_arity(args.len())?;
            Ok(Expr::Call { function, args })
        }

        other => Err(unsupported(format!("operator {other:?}"))),
    }
}

/// evalexpr wraps call arguments as `FunctionIdentifier -> RootNode -> Tuple -> [args]`
/// for several arguments and `FunctionIdentifier -> RootNode -> arg` for one.
fn function_arguments(node: &Node) -> ExprResult<Vec<Expr>> {
    match node.children() {
        [] => Ok(Vec::new()),
        [child] => {
            let inner = match (child.operator(), child.children()) {
                (Operator::RootNode, [grandchild]) => grandchild,
                _ => child,
            };
            if matches!(inner.operator(), Operator::Tuple) {
                inner.children().iter().map(convert_node).collect()
            } else {
                Ok(vec![convert_node(child)?])
            }
        }
        children => children.iter().map(convert_node).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_products_of_names() {
        let e = parse_expression("beta*S*lambda_i").unwrap();
        let names: Vec<&str> = e.variables().into_iter().collect();
        assert_eq!(names, vec!["S", "beta", "lambda_i"]);
    }

    #[test]
    fn double_star_is_power() {
        assert_eq!(
            parse_expression("x**2").unwrap(),
            parse_expression("x^2").unwrap()
        );
    }

    #[test]
    fn power_chains_group_to_the_right() {
        assert_eq!(
            parse_expression("a**b**c").unwrap(),
            parse_expression("a^(b^c)").unwrap()
        );
        assert_eq!(
            parse_expression("(a**b)**c").unwrap(),
            Expr::binary(
                BinaryOperator::Pow,
                parse_expression("a^b").unwrap(),
                Expr::Variable("c".to_string()),
            )
        );
    }

    #[test]
    fn unary_plus_is_identity() {
        assert_eq!(
            parse_expression("+x").unwrap(),
            Expr::Variable("x".to_string())
        );
    }

    #[test]
    fn rejects_assignment() {
        assert!(matches!(
            parse_expression("S = 1"),
            Err(ExprError::Unsupported { .. })
        ));
    }

    #[test]
    fn rejects_comparison_and_booleans() {
        assert!(parse_expression("S < I").is_err());
        assert!(parse_expression("true").is_err());
    }

    #[test]
    fn rejects_strings() {
        assert!(parse_expression("\"hello\"").is_err());
    }

    #[test]
    fn rejects_unknown_functions() {
        assert!(matches!(
            parse_expression("exp(1)"),
            Err(ExprError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn checks_function_arity() {
        assert!(matches!(
            parse_expression("pow(2)"),
            Err(ExprError::Arity { name: "pow", .. })
        ));
        assert!(parse_expression("pow(2, 3)").is_ok());
        assert!(parse_expression("min(a, b, c)").is_ok());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_expression("").is_err());
    }
}
