use crate::algebra::{Expression, Operation, Pattern};
use crate::error::AlgebraError;
use crate::syntax::{
    self, DatasetClause, GroupCondition, GroupPattern, Iri, Ordering, Projection, Query,
    QueryForm, SelectItem, SolutionModifiers,
};
use crate::term::{NamedNode, NamedNodePattern, Variable};
use crate::to_syntax::expression::{mentions_any, replace_aggregates};
use crate::to_syntax::pattern::triple;
use crate::to_syntax::{SyntaxContext, Translated, group_pattern, named_node_pattern};
use std::collections::HashMap;
use std::mem::{replace, take};
use tracing::trace;

/// The operator a query is built from.
pub(super) enum QueryShape<'a> {
    Select(&'a [Variable]),
    Ask,
    Describe(&'a [NamedNodePattern]),
    Construct(&'a [Pattern]),
}

impl SyntaxContext {
    /// Translates `op` into a query, a graph pattern becoming a `SELECT *`.
    pub(super) fn translate_query(&mut self, op: &Operation) -> Result<Box<Query>, AlgebraError> {
        Ok(match op {
            Operation::Distinct(op) => {
                let mut query = self.translate_query(&op.input)?;
                let QueryForm::Select { distinct, .. } = &mut query.form else {
                    return Err(AlgebraError::unsupported(
                        "DISTINCT can only be applied to a SELECT query",
                    ));
                };
                *distinct = true;
                query
            }
            Operation::Reduced(op) => {
                let mut query = self.translate_query(&op.input)?;
                let QueryForm::Select { reduced, .. } = &mut query.form else {
                    return Err(AlgebraError::unsupported(
                        "REDUCED can only be applied to a SELECT query",
                    ));
                };
                *reduced = true;
                query
            }
            Operation::Slice(op) => {
                let mut query = self.translate_query(&op.input)?;
                if op.start > 0 {
                    query.modifiers.offset = Some(op.start);
                }
                if op.length.is_some() {
                    query.modifiers.limit = op.length;
                }
                query
            }
            Operation::From(op) => {
                let mut query = self.translate_query(&op.input)?;
                query.datasets = dataset_clauses(&op.default, &op.named);
                query
            }
            Operation::Ask(_)
            | Operation::Construct(_)
            | Operation::Describe(_)
            | Operation::Project(_) => match self.translate_operation(op)? {
                Translated::Query(query) => query,
                _ => return Err(AlgebraError::unexpected_node("query form", "graph pattern")),
            },
            op => self.translate_query_form(op, QueryShape::Select(&[]))?,
        })
    }

    /// Builds a query of the given shape, collecting the grouping, the aggregates, the
    /// extensions and the orderings found between it and its graph pattern.
    pub(super) fn translate_query_form(
        &mut self,
        input: &Operation,
        shape: QueryShape<'_>,
    ) -> Result<Box<Query>, AlgebraError> {
        let outer = take(&mut self.modifiers);
        self.project = !matches!(shape, QueryShape::Construct(_));
        let where_patterns = self.translate_patterns(input)?;
        let inner = replace(&mut self.modifiers, outer);
        let mut where_patterns = group_pattern(where_patterns).patterns;

        let mut aggregates = HashMap::new();
        for bound in &inner.aggregates {
            aggregates.insert(
                bound.variable.clone(),
                syntax::Expression::Aggregate(self.translate_aggregate(&bound.aggregate)?),
            );
        }

        // The innermost extensions first: the outer ones may use their variables
        let mut extensions = Vec::new();
        for (variable, expression) in inner.extend.iter().rev() {
            let expression = self.translate_expression(expression)?;
            extensions.push((variable.clone(), replace_aggregates(expression, &aggregates)));
        }

        let group_by = inner
            .group
            .iter()
            .map(|variable| match take_extension(&mut extensions, variable) {
                Some(expression) => GroupCondition::Bind {
                    expression,
                    variable: variable.clone(),
                },
                None => GroupCondition::Variable(variable.clone()),
            })
            .collect::<Vec<_>>();

        let order_by = inner
            .order
            .iter()
            .map(|expression| {
                let (expression, descending) = match expression {
                    Expression::Operator { operator, args, .. } if operator == "desc" => {
                        match args.as_slice() {
                            [arg] => (arg, true),
                            _ => (expression, false),
                        }
                    }
                    expression => (expression, false),
                };
                Ok(Ordering {
                    expression: replace_aggregates(
                        self.translate_expression(expression)?,
                        &aggregates,
                    ),
                    descending,
                })
            })
            .collect::<Result<Vec<_>, AlgebraError>>()?;

        let form = match shape {
            QueryShape::Select(variables) => {
                let items = variables
                    .iter()
                    .map(|variable| match take_extension(&mut extensions, variable) {
                        Some(expression) => SelectItem::Bind {
                            expression,
                            variable: variable.clone(),
                        },
                        None => SelectItem::Variable(variable.clone()),
                    })
                    .collect::<Vec<_>>();
                QueryForm::Select {
                    distinct: false,
                    reduced: false,
                    projection: if items.is_empty() {
                        Projection::Wildcard
                    } else {
                        Projection::Items(items)
                    },
                }
            }
            QueryShape::Ask => QueryForm::Ask,
            QueryShape::Describe(terms) => QueryForm::Describe {
                targets: terms.iter().map(named_node_pattern).collect(),
            },
            QueryShape::Construct(template) => QueryForm::Construct {
                template: template.iter().map(|pattern| triple(pattern).into()).collect(),
            },
        };

        // Extensions nothing projects are still needed by the others
        for (variable, expression) in extensions {
            where_patterns.push(syntax::Pattern::Bind {
                expression,
                variable,
            });
        }

        let mut having = Vec::new();
        let where_patterns = extract_having(where_patterns, &aggregates, &mut having);

        let where_clause = if where_patterns.is_empty() && matches!(form, QueryForm::Describe { .. })
        {
            None
        } else {
            Some(GroupPattern::new(where_patterns))
        };
        Ok(Box::new(Query {
            prologue: Vec::new(),
            form,
            datasets: Vec::new(),
            where_clause,
            modifiers: SolutionModifiers {
                group_by,
                having,
                order_by,
                limit: None,
                offset: None,
            },
            values: None,
        }))
    }
}

fn take_extension(
    extensions: &mut Vec<(Variable, syntax::Expression)>,
    variable: &Variable,
) -> Option<syntax::Expression> {
    let position = extensions.iter().position(|(v, _)| v == variable)?;
    Some(extensions.remove(position).1)
}

/// Moves the filters on aggregated values to `having`.
fn extract_having(
    patterns: Vec<syntax::Pattern>,
    aggregates: &HashMap<Variable, syntax::Expression>,
    having: &mut Vec<syntax::Expression>,
) -> Vec<syntax::Pattern> {
    if aggregates.is_empty() {
        return patterns;
    }
    patterns
        .into_iter()
        .filter_map(|pattern| match pattern {
            syntax::Pattern::Filter(expression) if mentions_any(&expression, aggregates) => {
                trace!("filter moved to HAVING");
                having.push(replace_aggregates(expression, aggregates));
                None
            }
            syntax::Pattern::Group(group) => Some(syntax::Pattern::Group(GroupPattern::new(
                extract_having(group.patterns, aggregates, having),
            ))),
            pattern => Some(pattern),
        })
        .collect()
}

pub(super) fn dataset_clauses(default: &[NamedNode], named: &[NamedNode]) -> Vec<DatasetClause> {
    default
        .iter()
        .map(|graph| DatasetClause::Default(Iri::from(graph.clone())))
        .chain(
            named
                .iter()
                .map(|graph| DatasetClause::Named(Iri::from(graph.clone()))),
        )
        .collect()
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::algebra::{AggregateExpression, Aggregator, BoundAggregate};
    use crate::syntax::{Aggregate, Sparql, Term, Triple};
    use crate::to_syntax::translate;

    #[test]
    fn test_aggregates_go_back_to_select_and_having() -> Result<(), Box<dyn std::error::Error>>
    {
        let s = Variable::new("s")?;
        let o = Variable::new("o")?;
        let count = Variable::new("count")?;
        let aggregate = Variable::new("var0")?;
        let p = NamedNode::new("http://example.com/p")?;
        let bgp = Operation::bgp(vec![Pattern::new(s.clone(), p.clone(), o.clone(), None)]);
        let grouped = Operation::group(
            bgp,
            vec![s.clone()],
            vec![BoundAggregate::new(
                aggregate.clone(),
                AggregateExpression::new(
                    Aggregator::Count,
                    false,
                    Expression::term(o.clone()),
                    None,
                ),
            )],
        );
        let filtered = Operation::filter(
            grouped,
            Expression::operator(
                ">",
                vec![
                    Expression::term(aggregate.clone()),
                    Expression::term(crate::term::Literal::from(1)),
                ],
            ),
        );
        let op = Operation::project(
            Operation::extend(filtered, count.clone(), Expression::term(aggregate)),
            vec![s.clone(), count.clone()],
        );

        let Sparql::Query(query) = translate(&op)? else {
            return Err("a query was expected".into());
        };
        let count_o: syntax::Expression =
            Aggregate::new(Aggregator::Count, false, Term::Variable(o.clone()).into()).into();
        assert_eq!(
            query.form,
            QueryForm::Select {
                distinct: false,
                reduced: false,
                projection: Projection::Items(vec![
                    SelectItem::Variable(s.clone()),
                    SelectItem::Bind {
                        expression: count_o.clone(),
                        variable: count
                    },
                ])
            }
        );
        assert_eq!(
            query.where_clause,
            Some(GroupPattern::new(vec![syntax::Pattern::Bgp(vec![
                Triple::new(s.clone(), Iri::from(p), o).into()
            ])]))
        );
        assert_eq!(query.modifiers.group_by, [GroupCondition::Variable(s)]);
        assert_eq!(query.modifiers.having.len(), 1);
        assert_eq!(
            query.modifiers.having[0],
            syntax::Expression::operation(
                ">",
                vec![
                    count_o,
                    Term::Literal(syntax::LiteralTerm::Typed {
                        value: "1".into(),
                        datatype: Iri::full("http://www.w3.org/2001/XMLSchema#integer")
                    })
                    .into()
                ]
            )
        );
        Ok(())
    }

    #[test]
    fn test_modifiers_of_a_query() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let o = Variable::new("o")?;
        let p = NamedNode::new("http://example.com/p")?;
        let g = NamedNode::new("http://example.com/g")?;
        let op = Operation::from_dataset(
            Operation::slice(
                Operation::distinct(Operation::project(
                    Operation::order_by(
                        Operation::bgp(vec![Pattern::new(s.clone(), p, o.clone(), None)]),
                        vec![Expression::operator("desc", vec![Expression::term(o.clone())])],
                    ),
                    vec![s],
                )),
                5,
                Some(10),
            ),
            vec![g.clone()],
            Vec::new(),
        );
        let Sparql::Query(query) = translate(&op)? else {
            return Err("a query was expected".into());
        };
        assert!(matches!(query.form, QueryForm::Select { distinct: true, .. }));
        assert_eq!(query.modifiers.offset, Some(5));
        assert_eq!(query.modifiers.limit, Some(10));
        assert_eq!(
            query.modifiers.order_by,
            [Ordering {
                expression: Term::Variable(o).into(),
                descending: true
            }]
        );
        assert_eq!(query.datasets, [DatasetClause::Default(Iri::from(g))]);
        Ok(())
    }

    #[test]
    fn test_distinct_on_construct_fails() -> Result<(), Box<dyn std::error::Error>> {
        let op = Operation::distinct(Operation::construct(
            Operation::bgp(Vec::new()),
            Vec::new(),
        ));
        let error = translate(&op).unwrap_err();
        assert!(error.is_unsupported());
        Ok(())
    }
}
