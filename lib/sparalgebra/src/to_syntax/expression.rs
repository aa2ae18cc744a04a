use crate::algebra::{AggregateExpression, Expression};
use crate::error::AlgebraError;
use crate::syntax::{
    self, Aggregate, GroupPattern, Iri, SyntaxNodeType, SyntaxRef, SyntaxSubType,
};
use crate::term::Variable;
use crate::to_syntax::{SyntaxContext, term};
use crate::tree::{VisitControl, Visitor};
use std::collections::HashMap;

impl SyntaxContext {
    pub(super) fn translate_expression(
        &mut self,
        expression: &Expression,
    ) -> Result<syntax::Expression, AlgebraError> {
        Ok(match expression {
            Expression::Aggregate(aggregate) => self.translate_aggregate(aggregate)?.into(),
            Expression::Existence { not, input, .. } => {
                // The pattern of EXISTS is never the input of a projection
                self.project = false;
                syntax::Expression::Exists {
                    negated: *not,
                    group: self.translate_group(input)?,
                }
            }
            Expression::Named { name, args, .. } => syntax::Expression::FunctionCall {
                function: Iri::from(name.clone()),
                args: self.translate_expressions(args)?,
                distinct: false,
                location: None,
            },
            Expression::Operator { operator, args, .. } => {
                syntax::Expression::operation(operator.clone(), self.translate_expressions(args)?)
            }
            Expression::Term { term: t, .. } => syntax::Expression::Term(term(t)),
            Expression::Wildcard { .. } => syntax::Expression::Wildcard,
        })
    }

    fn translate_expressions(
        &mut self,
        expressions: &[Expression],
    ) -> Result<Vec<syntax::Expression>, AlgebraError> {
        expressions
            .iter()
            .map(|expression| self.translate_expression(expression))
            .collect()
    }

    pub(super) fn translate_aggregate(
        &mut self,
        aggregate: &AggregateExpression,
    ) -> Result<Aggregate, AlgebraError> {
        Ok(Aggregate {
            aggregator: aggregate.aggregator,
            distinct: aggregate.distinct,
            expression: Box::new(self.translate_expression(&aggregate.expression)?),
            separator: aggregate.separator.clone(),
            location: None,
        })
    }
}

/// Substitutes the variables bound by a grouping with the aggregates they stand for.
///
/// In `EXISTS` patterns only the expressions of filters and binds are rewritten.
pub(super) fn replace_aggregates(
    expression: syntax::Expression,
    aggregates: &HashMap<Variable, syntax::Expression>,
) -> syntax::Expression {
    match expression {
        syntax::Expression::Term(syntax::Term::Variable(variable)) => {
            match aggregates.get(&variable) {
                Some(aggregate) => aggregate.clone(),
                None => syntax::Term::Variable(variable).into(),
            }
        }
        syntax::Expression::Aggregate(mut aggregate) => {
            aggregate.expression = Box::new(replace_aggregates(*aggregate.expression, aggregates));
            aggregate.into()
        }
        syntax::Expression::FunctionCall {
            function,
            args,
            distinct,
            location,
        } => syntax::Expression::FunctionCall {
            function,
            args: args
                .into_iter()
                .map(|arg| replace_aggregates(arg, aggregates))
                .collect(),
            distinct,
            location,
        },
        syntax::Expression::Operation {
            operator,
            args,
            location,
        } => syntax::Expression::Operation {
            operator,
            args: args
                .into_iter()
                .map(|arg| replace_aggregates(arg, aggregates))
                .collect(),
            location,
        },
        syntax::Expression::Exists { negated, group } => syntax::Expression::Exists {
            negated,
            group: replace_in_group(group, aggregates),
        },
        expression => expression,
    }
}

fn replace_in_group(
    group: GroupPattern,
    aggregates: &HashMap<Variable, syntax::Expression>,
) -> GroupPattern {
    GroupPattern::new(
        group
            .patterns
            .into_iter()
            .map(|pattern| match pattern {
                syntax::Pattern::Filter(expression) => {
                    syntax::Pattern::Filter(replace_aggregates(expression, aggregates))
                }
                syntax::Pattern::Bind {
                    expression,
                    variable,
                } => syntax::Pattern::Bind {
                    expression: replace_aggregates(expression, aggregates),
                    variable,
                },
                syntax::Pattern::Group(group) => {
                    syntax::Pattern::Group(replace_in_group(group, aggregates))
                }
                syntax::Pattern::Optional(group) => {
                    syntax::Pattern::Optional(replace_in_group(group, aggregates))
                }
                syntax::Pattern::Minus(group) => {
                    syntax::Pattern::Minus(replace_in_group(group, aggregates))
                }
                syntax::Pattern::Union(groups) => syntax::Pattern::Union(
                    groups
                        .into_iter()
                        .map(|group| replace_in_group(group, aggregates))
                        .collect(),
                ),
                syntax::Pattern::Graph { name, group } => syntax::Pattern::Graph {
                    name,
                    group: replace_in_group(group, aggregates),
                },
                pattern => pattern,
            })
            .collect(),
    )
}

/// Checks if the expression uses one of the variables bound by a grouping, `EXISTS` patterns
/// included.
pub(super) fn mentions_any(
    expression: &syntax::Expression,
    aggregates: &HashMap<Variable, syntax::Expression>,
) -> bool {
    !Visitor::<SyntaxRef<'_>, ()>::new()
        .pre_visit_sub_type(
            SyntaxNodeType::Term,
            SyntaxSubType::Variable,
            |_, node| match node {
                SyntaxRef::Term(syntax::Term::Variable(variable))
                    if aggregates.contains_key(variable) =>
                {
                    VisitControl::SHORTCUT
                }
                _ => VisitControl::CONTINUE,
            },
        )
        .visit(SyntaxRef::Expression(expression), &mut ())
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::algebra::{Aggregator, Operation, Pattern};
    use crate::syntax::Triple;
    use crate::term::NamedNode;

    #[test]
    fn test_existence() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let p = NamedNode::new("http://example.com/p")?;
        let expression = Expression::existence(
            true,
            Operation::bgp(vec![Pattern::new(s.clone(), p.clone(), s.clone(), None)]),
        );
        assert_eq!(
            SyntaxContext::default().translate_expression(&expression)?,
            syntax::Expression::Exists {
                negated: true,
                group: GroupPattern::new(vec![syntax::Pattern::Bgp(vec![
                    Triple::new(s.clone(), Iri::from(p), s).into()
                ])])
            }
        );
        Ok(())
    }

    #[test]
    fn test_function_calls_are_not_distinct() -> Result<(), Box<dyn std::error::Error>> {
        let f = NamedNode::new("http://example.com/f")?;
        let expression = Expression::named(f.clone(), vec![Expression::wildcard()]);
        assert_eq!(
            SyntaxContext::default().translate_expression(&expression)?,
            syntax::Expression::FunctionCall {
                function: Iri::from(f),
                args: vec![syntax::Expression::Wildcard],
                distinct: false,
                location: None,
            }
        );
        Ok(())
    }

    #[test]
    fn test_replace_aggregates() -> Result<(), Box<dyn std::error::Error>> {
        let x = Variable::new("x")?;
        let counted = Variable::new("var0")?;
        let count: syntax::Expression = Aggregate::new(
            Aggregator::Count,
            true,
            syntax::Term::Variable(x.clone()).into(),
        )
        .into();
        let aggregates = HashMap::from([(counted.clone(), count.clone())]);
        let expression = syntax::Expression::operation(
            "+",
            vec![
                syntax::Term::Variable(counted).into(),
                syntax::Term::Variable(x.clone()).into(),
            ],
        );
        assert!(mentions_any(&expression, &aggregates));
        assert_eq!(
            replace_aggregates(expression, &aggregates),
            syntax::Expression::operation("+", vec![count, syntax::Term::Variable(x).into()])
        );
        Ok(())
    }

    #[test]
    fn test_aggregates_in_exists() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let counted = Variable::new("var0")?;
        let count: syntax::Expression =
            Aggregate::new(Aggregator::Count, false, syntax::Expression::Wildcard).into();
        let aggregates = HashMap::from([(counted.clone(), count.clone())]);
        let exists = |value: syntax::Expression| syntax::Expression::Exists {
            negated: false,
            group: GroupPattern::new(vec![
                syntax::Pattern::Bgp(vec![
                    Triple::new(
                        s.clone(),
                        Iri::full("http://example.com/p"),
                        Variable::new_unchecked("o"),
                    )
                    .into(),
                ]),
                syntax::Pattern::Filter(syntax::Expression::operation(
                    ">",
                    vec![syntax::Term::Variable(Variable::new_unchecked("o")).into(), value],
                )),
            ]),
        };
        let expression = exists(syntax::Term::Variable(counted).into());
        assert!(mentions_any(&expression, &aggregates));
        assert!(!mentions_any(
            &exists(syntax::Term::Variable(s.clone()).into()),
            &aggregates
        ));
        assert_eq!(replace_aggregates(expression, &aggregates), exists(count));
        Ok(())
    }
}
