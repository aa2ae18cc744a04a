use crate::algebra::{AggregateExpression, Expression, Operation, Pattern};
use crate::error::AlgebraError;
use crate::syntax::{
    self, Aggregate, GroupPattern, Node, Predicate, Term, TripleLike, ValuesPattern,
};
use crate::term::GraphNamePattern;
use crate::to_algebra::AlgebraContext;
use std::collections::BTreeMap;
use std::mem::take;

/// A triple once the collections it uses have been expanded.
pub(super) struct FlatTriple<'a> {
    pub subject: &'a Term,
    pub predicate: &'a Predicate,
    pub object: &'a Term,
}

/// Expands collections: their triples come before the triple using their identifier.
pub(super) fn flatten_triples<'a>(triples: &'a [TripleLike], output: &mut Vec<FlatTriple<'a>>) {
    for triple in triples {
        match triple {
            TripleLike::Collection(collection) => flatten_triples(&collection.triples, output),
            TripleLike::Triple(triple) => {
                let subject = flatten_node(&triple.subject, output);
                let object = flatten_node(&triple.object, output);
                output.push(FlatTriple {
                    subject,
                    predicate: &triple.predicate,
                    object,
                });
            }
        }
    }
}

fn flatten_node<'a>(node: &'a Node, output: &mut Vec<FlatTriple<'a>>) -> &'a Term {
    match node {
        Node::Term(term) => term,
        Node::Collection(collection) => {
            flatten_triples(&collection.triples, output);
            &collection.identifier
        }
    }
}

/// Merges two consecutive members of a group, avoiding a join when possible.
pub(super) fn simplified_join(left: Operation, right: Operation) -> Result<Operation, AlgebraError> {
    match (left, right) {
        (Operation::Bgp(mut left), Operation::Bgp(right)) => {
            left.patterns.extend(right.patterns);
            Ok(Operation::Bgp(left))
        }
        (left, right) if left.is_empty_bgp() => Ok(right),
        (left, right) if right.is_empty_bgp() => Ok(left),
        (left, right) => Operation::join(vec![left, right], true),
    }
}

impl AlgebraContext {
    pub(super) fn translate_group(&mut self, group: &GroupPattern) -> Result<Operation, AlgebraError> {
        let mut op = Operation::bgp(Vec::new());
        let mut filters = Vec::new();
        for pattern in &group.patterns {
            if let syntax::Pattern::Filter(expression) = pattern {
                filters.push(expression);
            } else {
                op = self.accumulate(op, pattern)?;
            }
        }

        // All the filters of a group apply to the whole group
        let mut conjunction = None;
        for filter in filters {
            let expression = self.translate_expression(filter)?;
            conjunction = Some(match conjunction {
                Some(left) => Expression::operator("&&", vec![left, expression]),
                None => expression,
            });
        }
        Ok(match conjunction {
            Some(expression) => Operation::filter(op, expression),
            None => op,
        })
    }

    fn accumulate(
        &mut self,
        op: Operation,
        pattern: &syntax::Pattern,
    ) -> Result<Operation, AlgebraError> {
        Ok(match pattern {
            syntax::Pattern::Optional(group) => match self.translate_group(group)? {
                Operation::Filter(filter) => {
                    Operation::left_join(op, *filter.input, Some(filter.expression))
                }
                right => Operation::left_join(op, right, None),
            },
            syntax::Pattern::Minus(group) => Operation::minus(op, self.translate_group(group)?),
            syntax::Pattern::Bind {
                expression,
                variable,
            } => Operation::extend(op, variable.clone(), self.translate_expression(expression)?),
            pattern => {
                let right = self.translate_graph_pattern(pattern)?;
                simplified_join(op, right)?
            }
        })
    }

    fn translate_graph_pattern(
        &mut self,
        pattern: &syntax::Pattern,
    ) -> Result<Operation, AlgebraError> {
        match pattern {
            syntax::Pattern::Bgp(triples) => self.translate_bgp(triples),
            syntax::Pattern::Group(group) => self.translate_group(group),
            syntax::Pattern::Union(groups) => Operation::union(
                groups
                    .iter()
                    .map(|group| self.translate_group(group))
                    .collect::<Result<_, _>>()?,
                true,
            ),
            syntax::Pattern::Graph { name, group } => {
                let input = self.translate_group(group)?;
                let name = self.named_node_pattern(name)?;
                if self.quads {
                    self.recurse_graph(input, &name)
                } else {
                    Ok(Operation::graph(input, name))
                }
            }
            syntax::Pattern::Service {
                name,
                silent,
                group,
            } => {
                let input = self.translate_group(group)?;
                Ok(Operation::service(
                    input,
                    self.named_node_pattern(name)?,
                    *silent,
                ))
            }
            syntax::Pattern::Values(values) => self.translate_values(values),
            syntax::Pattern::SubSelect(query) => self.translate_query(query),
            syntax::Pattern::Optional(_) => {
                Err(AlgebraError::unexpected_node("graph pattern", "OPTIONAL"))
            }
            syntax::Pattern::Minus(_) => {
                Err(AlgebraError::unexpected_node("graph pattern", "MINUS"))
            }
            syntax::Pattern::Filter(_) => {
                Err(AlgebraError::unexpected_node("graph pattern", "FILTER"))
            }
            syntax::Pattern::Bind { .. } => {
                Err(AlgebraError::unexpected_node("graph pattern", "BIND"))
            }
        }
    }

    /// Plain triples are gathered into BGPs, property paths cut them into a join.
    fn translate_bgp(&mut self, triples: &[TripleLike]) -> Result<Operation, AlgebraError> {
        let mut flattened = Vec::new();
        flatten_triples(triples, &mut flattened);
        let mut joins = Vec::new();
        let mut patterns = Vec::new();
        for triple in flattened {
            let subject = self.term(triple.subject)?;
            let object = self.term(triple.object)?;
            match triple.predicate {
                Predicate::Term(predicate) => patterns.push(Pattern::new(
                    subject,
                    self.named_node_pattern(predicate)?,
                    object,
                    None,
                )),
                Predicate::Path(path) => {
                    let path = self.translate_path_predicate(path)?;
                    let mut simplified = Vec::new();
                    self.simplify_path(subject, path, object, &mut simplified);
                    for op in simplified {
                        if let Operation::Pattern(pattern) = op {
                            patterns.push(pattern);
                        } else {
                            if !patterns.is_empty() {
                                joins.push(Operation::bgp(take(&mut patterns)));
                            }
                            joins.push(op);
                        }
                    }
                }
            }
        }
        if !patterns.is_empty() {
            joins.push(Operation::bgp(patterns));
        }
        if joins.len() > 1 {
            Operation::join(joins, true)
        } else {
            Ok(joins.pop().unwrap_or_else(|| Operation::bgp(Vec::new())))
        }
    }

    /// The quad patterns of a template, in `graph` or in the default graph.
    pub(super) fn translate_template(
        &self,
        triples: &[TripleLike],
        graph: Option<&GraphNamePattern>,
    ) -> Result<Vec<Pattern>, AlgebraError> {
        let mut flattened = Vec::new();
        flatten_triples(triples, &mut flattened);
        flattened
            .into_iter()
            .map(|triple| {
                let Predicate::Term(predicate) = triple.predicate else {
                    return Err(AlgebraError::unsupported(
                        "Trying to translate property path to quad.",
                    ));
                };
                Ok(Pattern::new(
                    self.term(triple.subject)?,
                    self.named_node_pattern(predicate)?,
                    self.term(triple.object)?,
                    graph.cloned(),
                ))
            })
            .collect()
    }

    pub(super) fn translate_expression(
        &mut self,
        expression: &syntax::Expression,
    ) -> Result<Expression, AlgebraError> {
        Ok(match expression {
            syntax::Expression::Term(term) => Expression::term(self.term(term)?),
            syntax::Expression::Wildcard => Expression::wildcard(),
            syntax::Expression::Aggregate(aggregate) => {
                Expression::Aggregate(self.translate_aggregate(aggregate)?)
            }
            syntax::Expression::FunctionCall { function, args, .. } => Expression::named(
                self.named_node(function)?,
                self.translate_expressions(args)?,
            ),
            syntax::Expression::Operation { operator, args, .. } => {
                Expression::operator(operator.clone(), self.translate_expressions(args)?)
            }
            syntax::Expression::Exists { negated, group } => {
                Expression::existence(*negated, self.translate_group(group)?)
            }
        })
    }

    fn translate_expressions(
        &mut self,
        expressions: &[syntax::Expression],
    ) -> Result<Vec<Expression>, AlgebraError> {
        expressions
            .iter()
            .map(|expression| self.translate_expression(expression))
            .collect()
    }

    pub(super) fn translate_aggregate(
        &mut self,
        aggregate: &Aggregate,
    ) -> Result<AggregateExpression, AlgebraError> {
        Ok(AggregateExpression::new(
            aggregate.aggregator,
            aggregate.distinct,
            self.translate_expression(&aggregate.expression)?,
            aggregate.separator.clone(),
        ))
    }

    /// Inline data, `UNDEF` cells are left out of the rows.
    pub(super) fn translate_values(&self, values: &ValuesPattern) -> Result<Operation, AlgebraError> {
        let bindings = values
            .rows
            .iter()
            .map(|row| {
                values
                    .variables
                    .iter()
                    .zip(row)
                    .filter_map(|(variable, value)| Some((variable, value.as_ref()?)))
                    .map(|(variable, value)| Ok((variable.clone(), self.ground_term(value)?)))
                    .collect::<Result<BTreeMap<_, _>, AlgebraError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Operation::values(values.variables.clone(), bindings))
    }
}
