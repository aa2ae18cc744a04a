use crate::algebra::{Operation, Pattern, Values};
use crate::error::AlgebraError;
use crate::syntax::{self, Triple, ValuesPattern};
use crate::to_syntax::query::QueryShape;
use crate::to_syntax::{
    SyntaxContext, Translated, ground_term, named_node_pattern, path::translate_path, term,
};

impl SyntaxContext {
    pub(super) fn translate_operation(&mut self, op: &Operation) -> Result<Translated, AlgebraError> {
        // Extensions and orderings right below a projection belong to its query
        if !matches!(
            op,
            Operation::Extend(_) | Operation::OrderBy(_) | Operation::Graph(_)
        ) {
            self.project = false;
        }
        Ok(match op {
            Operation::Ask(op) => {
                Translated::Query(self.translate_query_form(&op.input, QueryShape::Ask)?)
            }
            Operation::Construct(op) => Translated::Query(
                self.translate_query_form(&op.input, QueryShape::Construct(&op.template))?,
            ),
            Operation::Describe(op) => Translated::Query(
                self.translate_query_form(&op.input, QueryShape::Describe(&op.terms))?,
            ),
            Operation::Project(op) => Translated::Query(
                self.translate_query_form(&op.input, QueryShape::Select(&op.variables))?,
            ),
            Operation::Distinct(_)
            | Operation::Reduced(_)
            | Operation::Slice(_)
            | Operation::From(_) => Translated::Query(self.translate_query(op)?),
            Operation::Bgp(op) => Translated::Patterns(if op.patterns.is_empty() {
                Vec::new()
            } else {
                vec![syntax::Pattern::Bgp(
                    op.patterns.iter().map(|p| triple(p).into()).collect(),
                )]
            }),
            Operation::Pattern(pattern) => {
                Translated::Patterns(vec![syntax::Pattern::Bgp(vec![triple(pattern).into()])])
            }
            Operation::Path(op) => Translated::Patterns(vec![syntax::Pattern::Bgp(vec![
                Triple::new(
                    term(&op.subject),
                    translate_path(&op.predicate),
                    term(&op.object),
                )
                .into(),
            ])]),
            Operation::Extend(op) => {
                if self.project {
                    self.modifiers
                        .extend
                        .push((op.variable.clone(), op.expression.clone()));
                    return self.translate_operation(&op.input);
                }
                let mut patterns = self.translate_patterns(&op.input)?;
                patterns.push(syntax::Pattern::Bind {
                    expression: self.translate_expression(&op.expression)?,
                    variable: op.variable.clone(),
                });
                Translated::Patterns(patterns)
            }
            Operation::Filter(op) => {
                let mut patterns = self.translate_patterns(&op.input)?;
                patterns.push(syntax::Pattern::Filter(
                    self.translate_expression(&op.expression)?,
                ));
                // A filter applies to the whole group it is in
                Translated::Patterns(vec![syntax::Pattern::Group(syntax::GroupPattern::new(
                    patterns,
                ))])
            }
            Operation::Graph(op) => Translated::Patterns(vec![syntax::Pattern::Graph {
                name: named_node_pattern(&op.name),
                group: self.translate_group(&op.input)?,
            }]),
            Operation::Group(op) => {
                self.modifiers
                    .aggregates
                    .extend(op.aggregates.iter().cloned());
                self.modifiers.group.extend(op.variables.iter().cloned());
                return self.translate_operation(&op.input);
            }
            Operation::OrderBy(op) => {
                self.modifiers.order.extend(op.expressions.iter().cloned());
                return self.translate_operation(&op.input);
            }
            Operation::Join(op) => {
                let mut patterns = Vec::new();
                for input in &op.input {
                    for pattern in self.translate_patterns(input)? {
                        push_merging_bgps(&mut patterns, pattern);
                    }
                }
                Translated::Patterns(patterns)
            }
            Operation::LeftJoin(op) => {
                let [left, right] = op.input.as_ref();
                let mut patterns = self.translate_patterns(left)?;
                let mut optional = self.translate_group(right)?;
                if let Some(expression) = &op.expression {
                    optional
                        .patterns
                        .push(syntax::Pattern::Filter(self.translate_expression(expression)?));
                }
                patterns.push(syntax::Pattern::Optional(optional));
                Translated::Patterns(patterns)
            }
            Operation::Minus(op) => {
                let [left, right] = op.input.as_ref();
                let mut patterns = self.translate_patterns(left)?;
                patterns.push(syntax::Pattern::Minus(self.translate_group(right)?));
                Translated::Patterns(patterns)
            }
            Operation::Service(op) => Translated::Patterns(vec![syntax::Pattern::Service {
                name: named_node_pattern(&op.name),
                silent: op.silent,
                group: self.translate_group(&op.input)?,
            }]),
            Operation::Union(op) => Translated::Patterns(vec![syntax::Pattern::Union(
                op.input
                    .iter()
                    .map(|input| self.translate_group(input))
                    .collect::<Result<_, _>>()?,
            )]),
            Operation::Values(op) => {
                Translated::Patterns(vec![syntax::Pattern::Values(values_pattern(op))])
            }
            Operation::Nop(_) => Translated::Update(Vec::new()),
            Operation::Update(update) => {
                Translated::Update(vec![self.translate_update_operation(update)?])
            }
            Operation::CompositeUpdate(op) => Translated::Update(
                op.updates
                    .iter()
                    .map(|update| self.translate_update_operation(update))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// The triple of a quad pattern, its graph name being handled by the caller.
pub(super) fn triple(pattern: &Pattern) -> Triple {
    Triple::new(
        term(&pattern.subject),
        named_node_pattern(&pattern.predicate),
        term(&pattern.object),
    )
}

/// Consecutive triple blocks are merged, a path next to a BGP ending up in the same block.
fn push_merging_bgps(patterns: &mut Vec<syntax::Pattern>, pattern: syntax::Pattern) {
    let syntax::Pattern::Bgp(triples) = pattern else {
        patterns.push(pattern);
        return;
    };
    if let Some(syntax::Pattern::Bgp(last)) = patterns.last_mut() {
        last.extend(triples);
    } else {
        patterns.push(syntax::Pattern::Bgp(triples));
    }
}

/// Variables missing from a row are written `UNDEF`.
fn values_pattern(values: &Values) -> ValuesPattern {
    ValuesPattern {
        variables: values.variables.clone(),
        rows: values
            .bindings
            .iter()
            .map(|row| {
                values
                    .variables
                    .iter()
                    .map(|variable| row.get(variable).map(ground_term))
                    .collect()
            })
            .collect(),
    }
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::algebra::{Expression, PropertyPathSymbol};
    use crate::syntax::{GroupPattern, Iri, PropertyPath};
    use crate::term::{GroundTerm, Literal, NamedNode, Variable};
    use std::collections::BTreeMap;

    fn patterns(op: &Operation) -> Result<Vec<syntax::Pattern>, AlgebraError> {
        SyntaxContext::default().translate_patterns(op)
    }

    #[test]
    fn test_join_merges_triple_blocks() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let o = Variable::new("o")?;
        let p = NamedNode::new("http://example.com/p")?;
        let q = NamedNode::new("http://example.com/q")?;
        let op = Operation::join(
            vec![
                Operation::bgp(vec![Pattern::new(s.clone(), p.clone(), o.clone(), None)]),
                Operation::path(
                    o.clone(),
                    PropertyPathSymbol::zero_or_more(PropertyPathSymbol::link(q.clone())),
                    s.clone(),
                    None,
                ),
            ],
            true,
        )?;
        assert_eq!(
            patterns(&op)?,
            [syntax::Pattern::Bgp(vec![
                Triple::new(s.clone(), Iri::from(p), o.clone()).into(),
                Triple::new(
                    o,
                    PropertyPath::ZeroOrMore(Box::new(PropertyPath::Iri(Iri::from(q)))),
                    s
                )
                .into(),
            ])]
        );
        Ok(())
    }

    #[test]
    fn test_optional_keeps_its_filter() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let o = Variable::new("o")?;
        let p = NamedNode::new("http://example.com/p")?;
        let left = Operation::bgp(vec![Pattern::new(s.clone(), p.clone(), o.clone(), None)]);
        let right = Operation::bgp(vec![Pattern::new(o.clone(), p.clone(), s.clone(), None)]);
        let condition = Expression::operator("bound", vec![Expression::term(o.clone())]);
        let op = Operation::left_join(left, right, Some(condition));
        let translated = patterns(&op)?;
        assert_eq!(translated.len(), 2);
        assert_eq!(
            translated[1],
            syntax::Pattern::Optional(GroupPattern::new(vec![
                syntax::Pattern::Bgp(vec![Triple::new(o.clone(), Iri::from(p), s).into()]),
                syntax::Pattern::Filter(syntax::Expression::operation(
                    "bound",
                    vec![syntax::Term::Variable(o).into()]
                )),
            ]))
        );
        Ok(())
    }

    #[test]
    fn test_values_rows_are_padded() -> Result<(), Box<dyn std::error::Error>> {
        let x = Variable::new("x")?;
        let y = Variable::new("y")?;
        let one = GroundTerm::from(Literal::new_simple_literal("1"));
        let op = Operation::values(
            vec![x.clone(), y.clone()],
            vec![BTreeMap::from([(y.clone(), one)])],
        );
        assert_eq!(
            patterns(&op)?,
            [syntax::Pattern::Values(ValuesPattern {
                variables: vec![x, y],
                rows: vec![vec![
                    None,
                    Some(syntax::Term::Literal(syntax::LiteralTerm::Simple("1".into())))
                ]],
            })]
        );
        Ok(())
    }
}
