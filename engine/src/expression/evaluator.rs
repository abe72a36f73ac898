//! Expression evaluation.
//!
//! All binary comparison operators share one contract: strip literal
//! wrappers, try arbitrary-precision numeric coercion of both operands,
//! fall back to the natural ordering of two values of the same type, and
//! fail otherwise. Only the predicate applied to the three-way comparison
//! result differs between operators.

use std::cmp::Ordering;

use log::trace;

use crate::error::EngineError;
use crate::expression::ast::{ComparisonOp, EqualityOp, Expression};
use crate::processing::Context;
use crate::value::Value;

/// Evaluate an expression tree against an execution context.
///
/// Evaluation never mutates the tree; processor side effects at a higher
/// layer may mutate the surrounding node tree between evaluations.
pub fn evaluate(ctx: &Context, expression: &Expression) -> Result<Value, EngineError> {
    match expression {
        Expression::Literal(value) => Ok(Value::Literal(Box::new(value.clone()))),
        Expression::Variable(name) => Ok(ctx.variable(name).cloned().unwrap_or(Value::Null)),
        Expression::Comparison { op, left, right } => evaluate_comparison(ctx, *op, left, right),
        Expression::Equality { op, left, right } => evaluate_equality(ctx, *op, left, right),
        Expression::Conditional {
            condition,
            then,
            otherwise,
        } => {
            let condition = evaluate(ctx, condition)?;
            if condition.as_boolean() {
                evaluate(ctx, then)
            } else {
                evaluate(ctx, otherwise)
            }
        }
        Expression::Not(inner) => {
            let value = evaluate(ctx, inner)?;
            Ok(Value::Boolean(!value.as_boolean()))
        }
    }
}

fn evaluate_comparison(
    ctx: &Context,
    op: ComparisonOp,
    left: &Expression,
    right: &Expression,
) -> Result<Value, EngineError> {
    let left = evaluate(ctx, left)?.unwrap_literal();
    let right = evaluate(ctx, right)?.unwrap_literal();

    let ordering = match (left.as_number(), right.as_number()) {
        (Some(left_number), Some(right_number)) => left_number.cmp(&right_number),
        _ => match left.natural_cmp(&right) {
            Some(ordering) => ordering,
            None => {
                return Err(EngineError::expression(format!(
                    "Cannot execute comparison \"{}\": left is \"{}\" ({}), right is \"{}\" ({})",
                    op.symbol(),
                    left,
                    left.type_name(),
                    right,
                    right.type_name()
                )));
            }
        },
    };

    let result = match op {
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::Ge => ordering != Ordering::Less,
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Le => ordering != Ordering::Greater,
    };
    trace!(
        "Evaluated \"{} {} {}\" -> {}",
        left,
        op.symbol(),
        right,
        result
    );
    Ok(Value::Boolean(result))
}

fn evaluate_equality(
    ctx: &Context,
    op: EqualityOp,
    left: &Expression,
    right: &Expression,
) -> Result<Value, EngineError> {
    let left = evaluate(ctx, left)?.unwrap_literal();
    let right = evaluate(ctx, right)?.unwrap_literal();

    // Numeric tier first, so 5 == "5.0" holds; otherwise structural
    // equality. Mixed incomparable types answer false rather than erroring.
    let equal = match (left.as_number(), right.as_number()) {
        (Some(left_number), Some(right_number)) => left_number.cmp(&right_number) == Ordering::Equal,
        _ => left == right,
    };

    let result = match op {
        EqualityOp::Eq => equal,
        EqualityOp::Ne => !equal,
    };
    trace!(
        "Evaluated \"{} {} {}\" -> {}",
        left,
        op.symbol(),
        right,
        result
    );
    Ok(Value::Boolean(result))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::dom::{Document, NodeId};
    use crate::extensions::{ProcessorBinding, ProcessorResolver};

    struct EmptyResolver;

    impl ProcessorResolver for EmptyResolver {
        fn resolve_processors(
            &self,
            _doc: &Document,
            _node: NodeId,
        ) -> Result<Vec<Arc<ProcessorBinding>>, EngineError> {
            Ok(Vec::new())
        }
    }

    fn setup_context() -> Context {
        Context::with_variables(
            Arc::new(EmptyResolver),
            HashMap::from([
                ("count".to_string(), Value::from(5i64)),
                ("label".to_string(), Value::from("beta")),
            ]),
        )
    }

    fn eval(expression: &Expression) -> Result<Value, EngineError> {
        evaluate(&setup_context(), expression)
    }

    #[test]
    fn numeric_coercion_compares_by_value() {
        let ge = |l: Expression, r: Expression| eval(&Expression::ge(l, r)).unwrap();
        assert_eq!(
            ge(Expression::literal(5i64), Expression::literal("5.0")),
            Value::Boolean(true)
        );
        assert_eq!(
            ge(Expression::literal(5i64), Expression::literal(4i64)),
            Value::Boolean(true)
        );
        assert_eq!(
            ge(Expression::literal(5i64), Expression::literal(6i64)),
            Value::Boolean(false)
        );
        assert_eq!(
            eval(&Expression::lt(
                Expression::literal("2"),
                Expression::literal(10i64)
            ))
            .unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn comparison_falls_back_to_natural_ordering() {
        assert_eq!(
            eval(&Expression::ge(
                Expression::literal("pear"),
                Expression::literal("apple")
            ))
            .unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            eval(&Expression::le(
                Expression::literal("alpha"),
                Expression::variable("label")
            ))
            .unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn comparison_of_incompatible_types_fails() {
        let err = eval(&Expression::ge(
            Expression::literal("text"),
            Expression::literal(true),
        ))
        .unwrap_err();
        match err {
            EngineError::Expression(message) => {
                assert!(message.contains(">="));
                assert!(message.contains("text"));
                assert!(message.contains("true"));
            }
            other => panic!("Expected expression error, got {:?}", other),
        }

        // Null never satisfies the natural-ordering tier.
        assert!(
            eval(&Expression::gt(
                Expression::variable("missing"),
                Expression::literal(1i64)
            ))
            .is_err()
        );
    }

    #[test]
    fn equality_uses_numeric_tier_then_structure() {
        assert_eq!(
            eval(&Expression::eq(
                Expression::literal(5i64),
                Expression::literal("5")
            ))
            .unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            eval(&Expression::ne(
                Expression::literal(5i64),
                Expression::literal("5.00")
            ))
            .unwrap(),
            Value::Boolean(false)
        );
        // Mixed incomparable types answer false, they do not error.
        assert_eq!(
            eval(&Expression::eq(
                Expression::literal("a"),
                Expression::literal(1i64)
            ))
            .unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            eval(&Expression::eq(
                Expression::variable("missing"),
                Expression::variable("also-missing")
            ))
            .unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn conditional_uses_truthiness() {
        let expression = Expression::conditional(
            Expression::ge(Expression::variable("count"), Expression::literal(3i64)),
            Expression::literal("many"),
            Expression::literal("few"),
        );
        assert_eq!(
            eval(&expression).unwrap().unwrap_literal(),
            Value::from("many")
        );

        let negated = Expression::conditional(
            Expression::not(Expression::variable("count")),
            Expression::literal("zero"),
            Expression::literal("nonzero"),
        );
        assert_eq!(
            eval(&negated).unwrap().unwrap_literal(),
            Value::from("nonzero")
        );
    }

    #[test]
    fn literal_wrappers_are_stripped_before_comparison() {
        // A literal-wrapped operand compares exactly like its payload.
        let expression = Expression::gt(
            Expression::Literal(Value::literal("10")),
            Expression::literal(2i64),
        );
        assert_eq!(eval(&expression).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn variables_resolve_through_the_context() {
        assert_eq!(
            eval(&Expression::variable("count")).unwrap(),
            Value::from(5i64)
        );
        assert_eq!(eval(&Expression::variable("missing")).unwrap(), Value::Null);
    }
}
