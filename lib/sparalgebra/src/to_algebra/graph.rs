//! Rewrites applied on an already translated subtree: graph name threading for the quads mode
//! and blank node promotion.

use crate::algebra::{
    AnyNode, BoundAggregate, Expression, NodeRef, NodeSubType, NodeType, Operation, Pattern,
    Update,
};
use crate::error::AlgebraError;
use crate::term::*;
use crate::to_algebra::AlgebraContext;
use crate::tree::{Transformed, Transformer, VisitControl, Visitor};
use std::collections::HashMap;
use tracing::trace;

impl AlgebraContext {
    /// Moves the quad patterns and paths of the default graph of `op` into `graph`.
    pub(super) fn recurse_graph(
        &mut self,
        op: Operation,
        graph: &NamedNodePattern,
    ) -> Result<Operation, AlgebraError> {
        trace!(graph = %graph, "threading graph name");
        thread_graph(self, op, graph, None)
    }
}

struct GraphThreading<'a> {
    context: &'a mut AlgebraContext,
    graph: NamedNodePattern,
    /// The variable the occurrences of the graph variable are renamed to.
    ///
    /// Only set inside sub-queries that do not project the graph variable.
    replacement: Option<Variable>,
}

impl GraphThreading<'_> {
    fn is_graph_variable(&self, variable: &Variable) -> bool {
        matches!(&self.graph, NamedNodePattern::Variable(graph) if graph == variable)
    }

    fn variable(&self, variable: Variable) -> Variable {
        match &self.replacement {
            Some(replacement) if self.is_graph_variable(&variable) => replacement.clone(),
            _ => variable,
        }
    }

    fn term(&self, term: TermPattern) -> TermPattern {
        match term {
            TermPattern::Variable(variable) => self.variable(variable).into(),
            term => term,
        }
    }

    fn named_node(&self, term: NamedNodePattern) -> NamedNodePattern {
        match term {
            NamedNodePattern::Variable(variable) => self.variable(variable).into(),
            term => term,
        }
    }

    fn graph_name(&self, graph: GraphNamePattern) -> GraphNamePattern {
        match graph {
            GraphNamePattern::DefaultGraph => self.graph.clone().into(),
            GraphNamePattern::Variable(variable) => self.variable(variable).into(),
            graph @ GraphNamePattern::NamedNode(_) => graph,
        }
    }

    /// A fresh replacement for the graph variable if it is one and `input` mentions it.
    fn new_replacement(&mut self, input: &Operation) -> Option<Variable> {
        match &self.graph {
            NamedNodePattern::Variable(graph) if mentions_variable(input, graph) => {
                Some(self.context.fresh_variable())
            }
            _ => None,
        }
    }
}

fn thread_graph(
    context: &mut AlgebraContext,
    op: Operation,
    graph: &NamedNodePattern,
    replacement: Option<Variable>,
) -> Result<Operation, AlgebraError> {
    let mut state = GraphThreading {
        context,
        graph: graph.clone(),
        replacement,
    };
    Transformer::<AnyNode, GraphThreading<'_>>::new()
        .on(NodeType::Graph, |state, node| {
            let Operation::Graph(op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("graph", "operation"));
            };
            if state.replacement.is_some() {
                return Err(AlgebraError::unsupported(
                    "Recursing through nested GRAPH statements with a replacement is impossible.",
                ));
            }
            // The inner graph name wins, the outer one has nothing left to apply to
            let inner = thread_graph(state.context, *op.input, &op.name, None)?;
            Ok(Transformed::stop(inner.into()))
        })
        .on(NodeType::Service, |_, node| Ok(Transformed::stop(node)))
        .on(NodeType::Pattern, |state, node| {
            let mut pattern = Pattern::try_from(node)?;
            pattern.subject = state.term(pattern.subject);
            pattern.predicate = state.named_node(pattern.predicate);
            pattern.object = state.term(pattern.object);
            pattern.graph = state.graph_name(pattern.graph);
            Ok(Transformed::stop(pattern.into()))
        })
        .on(NodeType::Path, |state, node| {
            let Operation::Path(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("path", "operation"));
            };
            op.subject = state.term(op.subject);
            op.object = state.term(op.object);
            op.graph = state.graph_name(op.graph);
            Ok(Transformed::stop(Operation::Path(op).into()))
        })
        .on(NodeType::Project, |state, node| {
            let Operation::Project(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("project", "operation"));
            };
            if state.replacement.is_some() {
                op.variables = op
                    .variables
                    .into_iter()
                    .map(|v| state.variable(v))
                    .collect();
                return Ok(Transformed::new(Operation::Project(op).into()));
            }
            // A sub-query hides its variables that are not projected
            let replacement = if op.variables.iter().any(|v| state.is_graph_variable(v)) {
                None
            } else {
                state.new_replacement(&op.input)
            };
            let graph = state.graph.clone();
            op.input = Box::new(thread_graph(state.context, *op.input, &graph, replacement)?);
            Ok(Transformed::stop(Operation::Project(op).into()))
        })
        .on(NodeType::Extend, |state, node| {
            let Operation::Extend(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("extend", "operation"));
            };
            if state.replacement.is_some() {
                op.variable = state.variable(op.variable);
                return Ok(Transformed::new(Operation::Extend(op).into()));
            }
            // Below a BIND to the graph variable, its occurrences are other variables
            let replacement = if state.is_graph_variable(&op.variable) {
                state.new_replacement(&op.input)
            } else {
                None
            };
            let graph = state.graph.clone();
            op.input = Box::new(thread_graph(state.context, *op.input, &graph, replacement)?);
            op.expression = thread_expression(state, op.expression)?;
            Ok(Transformed::stop(Operation::Extend(op).into()))
        })
        .on(NodeType::Group, |state, node| {
            let Operation::Group(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("group", "operation"));
            };
            op.variables = op
                .variables
                .into_iter()
                .map(|v| state.variable(v))
                .collect();
            Ok(Transformed::new(Operation::Group(op).into()))
        })
        .on(NodeType::Values, |state, node| {
            let Operation::Values(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("values", "operation"));
            };
            op.variables = op
                .variables
                .into_iter()
                .map(|v| state.variable(v))
                .collect();
            op.bindings = op
                .bindings
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|(variable, value)| (state.variable(variable), value))
                        .collect()
                })
                .collect();
            Ok(Transformed::stop(Operation::Values(op).into()))
        })
        .on(NodeType::Describe, |state, node| {
            let Operation::Describe(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("describe", "operation"));
            };
            op.terms = op
                .terms
                .into_iter()
                .map(|term| state.named_node(term))
                .collect();
            Ok(Transformed::new(Operation::Describe(op).into()))
        })
        .on_sub_type(NodeType::Expression, NodeSubType::Term, |state, node| {
            let Expression::Term { term, metadata } = Expression::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("expression", "term"));
            };
            Ok(Transformed::stop(
                Expression::Term {
                    term: state.term(term),
                    metadata,
                }
                .into(),
            ))
        })
        .on_sub_type(
            NodeType::Expression,
            NodeSubType::BoundAggregate,
            |state, node| {
                let mut aggregate = BoundAggregate::try_from(node)?;
                aggregate.variable = state.variable(aggregate.variable);
                Ok(Transformed::new(aggregate.into()))
            },
        )
        .transform(op.into(), &mut state)?
        .try_into()
}

/// Checks if `variable` occurs in `op` where graph threading would rename it.
fn mentions_variable(op: &Operation, variable: &Variable) -> bool {
    let in_term = |term: &TermPattern| term_mentions(term, variable);
    let found = |found: bool| {
        if found {
            VisitControl::SHORTCUT
        } else {
            VisitControl::CONTINUE
        }
    };
    !Visitor::<NodeRef<'_>, ()>::new()
        .pre_visit(NodeType::Service, |_, _| VisitControl::SKIP_CHILDREN)
        .pre_visit(NodeType::Pattern, |_, node| {
            found(matches!(node, NodeRef::Pattern(pattern)
                if in_term(&pattern.subject)
                    || matches!(&pattern.predicate, NamedNodePattern::Variable(v) if v == variable)
                    || in_term(&pattern.object)
                    || matches!(&pattern.graph, GraphNamePattern::Variable(v) if v == variable)))
        })
        .pre_visit(NodeType::Path, |_, node| {
            found(matches!(node, NodeRef::Operation(Operation::Path(path))
                if in_term(&path.subject)
                    || in_term(&path.object)
                    || matches!(&path.graph, GraphNamePattern::Variable(v) if v == variable)))
        })
        .pre_visit(NodeType::Graph, |_, node| {
            found(matches!(node, NodeRef::Operation(Operation::Graph(graph))
                if matches!(&graph.name, NamedNodePattern::Variable(v) if v == variable)))
        })
        .pre_visit(NodeType::Project, |_, node| {
            found(matches!(node, NodeRef::Operation(Operation::Project(project))
                if project.variables.contains(variable)))
        })
        .pre_visit(NodeType::Extend, |_, node| {
            found(matches!(node, NodeRef::Operation(Operation::Extend(extend))
                if extend.variable == *variable))
        })
        .pre_visit(NodeType::Group, |_, node| {
            found(matches!(node, NodeRef::Operation(Operation::Group(group))
                if group.variables.contains(variable)))
        })
        .pre_visit(NodeType::Values, |_, node| {
            found(matches!(node, NodeRef::Operation(Operation::Values(values))
                if values.variables.contains(variable)))
        })
        .pre_visit_sub_type(NodeType::Expression, NodeSubType::Term, |_, node| {
            found(matches!(node, NodeRef::Expression(Expression::Term { term, .. })
                if in_term(term)))
        })
        .pre_visit_sub_type(
            NodeType::Expression,
            NodeSubType::BoundAggregate,
            |_, node| {
                found(matches!(node, NodeRef::BoundAggregate(aggregate)
                    if aggregate.variable == *variable))
            },
        )
        .visit(NodeRef::from(op), &mut ())
}

fn term_mentions(term: &TermPattern, variable: &Variable) -> bool {
    match term {
        TermPattern::Variable(v) => v == variable,
        TermPattern::Triple(triple) => {
            term_mentions(&triple.subject, variable)
                || matches!(&triple.predicate, NamedNodePattern::Variable(v) if v == variable)
                || term_mentions(&triple.object, variable)
        }
        TermPattern::NamedNode(_) | TermPattern::BlankNode(_) | TermPattern::Literal(_) => false,
    }
}

/// The expression of an Extend lives above the scope its replacement variable applies to.
fn thread_expression(
    state: &mut GraphThreading<'_>,
    expression: Expression,
) -> Result<Expression, AlgebraError> {
    let graph = state.graph.clone();
    let replacement = state.replacement.clone();
    // Expressions may contain EXISTS patterns: thread through a filter over an empty pattern
    let op = thread_graph(
        state.context,
        Operation::filter(Operation::bgp(Vec::new()), expression),
        &graph,
        replacement,
    )?;
    match op {
        Operation::Filter(filter) => Ok(filter.expression),
        op => Err(AlgebraError::unexpected_node("filter", op.node_type())),
    }
}

struct BlankNodePromotion<'a> {
    context: &'a mut AlgebraContext,
    mapping: HashMap<BlankNode, Variable>,
}

impl BlankNodePromotion<'_> {
    fn variable(&mut self, node: BlankNode) -> Variable {
        if let Some(variable) = self.mapping.get(&node) {
            return variable.clone();
        }
        let variable = self.context.unique_variable(node.as_str());
        trace!(blank_node = %node, variable = %variable, "blank node promoted");
        self.mapping.insert(node, variable.clone());
        variable
    }

    fn term(&mut self, term: TermPattern) -> TermPattern {
        match term {
            TermPattern::BlankNode(node) => self.variable(node).into(),
            TermPattern::Triple(triple) => {
                let TriplePattern {
                    subject,
                    predicate,
                    object,
                } = *triple;
                TriplePattern {
                    subject: self.term(subject),
                    predicate,
                    object: self.term(object),
                }
                .into()
            }
            term => term,
        }
    }
}

/// Replaces the blank nodes of the graph patterns by variables, the same label giving the same
/// variable.
///
/// The templates of `CONSTRUCT` and of `INSERT`/`DELETE` keep their blank nodes.
pub(super) fn promote_blank_nodes(
    context: &mut AlgebraContext,
    op: Operation,
) -> Result<Operation, AlgebraError> {
    let mut state = BlankNodePromotion {
        context,
        mapping: HashMap::new(),
    };
    Transformer::<AnyNode, BlankNodePromotion<'_>>::new()
        .on(NodeType::Construct, |state, node| {
            let Operation::Construct(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("construct", "operation"));
            };
            op.input = Box::new(promote_blank_nodes(state.context, *op.input)?);
            Ok(Transformed::stop(Operation::Construct(op).into()))
        })
        .on_sub_type(NodeType::Update, NodeSubType::DeleteInsert, |state, node| {
            let Update::DeleteInsert(mut op) = Update::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("update", "operation"));
            };
            op.pattern = op
                .pattern
                .map(|pattern| promote_blank_nodes(state.context, *pattern).map(Box::new))
                .transpose()?;
            Ok(Transformed::stop(Update::DeleteInsert(op).into()))
        })
        .on(NodeType::Pattern, |state, node| {
            let mut pattern = Pattern::try_from(node)?;
            pattern.subject = state.term(pattern.subject);
            pattern.object = state.term(pattern.object);
            Ok(Transformed::stop(pattern.into()))
        })
        .on(NodeType::Path, |state, node| {
            let Operation::Path(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("path", "operation"));
            };
            op.subject = state.term(op.subject);
            op.object = state.term(op.object);
            Ok(Transformed::stop(Operation::Path(op).into()))
        })
        .transform(op.into(), &mut state)?
        .try_into()
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::TranslationOptions;
    use crate::syntax::{self, Sparql};

    fn context() -> AlgebraContext {
        AlgebraContext::new(
            &Sparql::Update(syntax::Update {
                operations: Vec::new(),
            }),
            &TranslationOptions::new().with_quads(),
        )
    }

    #[test]
    fn test_unprojected_graph_variable_is_renamed() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let g = Variable::new("g")?;
        let q = NamedNode::new("http://example.com/q")?;
        let mut context = context();
        let op = Operation::project(
            Operation::bgp(vec![Pattern::new(s.clone(), q.clone(), g.clone(), None)]),
            vec![s.clone()],
        );
        let expected = Operation::project(
            Operation::bgp(vec![Pattern::new(
                s.clone(),
                q,
                Variable::new("var0")?,
                Some(g.clone().into()),
            )]),
            vec![s],
        );
        assert_eq!(context.recurse_graph(op, &g.into())?, expected);
        Ok(())
    }

    #[test]
    fn test_unmentioned_graph_variable_is_not_renamed() -> Result<(), Box<dyn std::error::Error>>
    {
        let s = Variable::new("s")?;
        let o = Variable::new("o")?;
        let g = Variable::new("g")?;
        let p = NamedNode::new("http://example.com/p")?;
        let h = NamedNode::new("http://example.com/h")?;
        let mut context = context();
        // The nested GRAPH is fine: nothing below the projection has to be renamed
        let op = Operation::project(
            Operation::graph(
                Operation::bgp(vec![Pattern::new(s.clone(), p.clone(), o.clone(), None)]),
                h.clone(),
            ),
            vec![s.clone()],
        );
        let expected = Operation::project(
            Operation::bgp(vec![Pattern::new(s.clone(), p, o, Some(h.into()))]),
            vec![s],
        );
        assert_eq!(context.recurse_graph(op, &g.into())?, expected);
        assert_eq!(context.fresh_variable(), Variable::new("var0")?);
        Ok(())
    }

    #[test]
    fn test_extend_to_graph_variable_renames_its_input() -> Result<(), Box<dyn std::error::Error>>
    {
        let s = Variable::new("s")?;
        let g = Variable::new("g")?;
        let p = NamedNode::new("http://example.com/p")?;
        let mut context = context();
        let op = Operation::extend(
            Operation::bgp(vec![Pattern::new(s.clone(), p.clone(), g.clone(), None)]),
            g.clone(),
            Expression::term(s.clone()),
        );
        let expected = Operation::extend(
            Operation::bgp(vec![Pattern::new(
                s.clone(),
                p,
                Variable::new("var0")?,
                Some(g.clone().into()),
            )]),
            g.clone(),
            Expression::term(s),
        );
        assert_eq!(context.recurse_graph(op, &g.into())?, expected);
        Ok(())
    }

    #[test]
    fn test_service_is_left_alone() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let o = Variable::new("o")?;
        let p = NamedNode::new("http://example.com/p")?;
        let r = NamedNode::new("http://example.com/r")?;
        let g = NamedNode::new("http://example.com/g")?;
        let service = Operation::service(
            Operation::bgp(vec![Pattern::new(s.clone(), r, o.clone(), None)]),
            NamedNode::new("http://example.com/sparql")?,
            false,
        );
        let mut context = context();
        let op = Operation::join(
            vec![
                Operation::bgp(vec![Pattern::new(s.clone(), p.clone(), o.clone(), None)]),
                service.clone(),
            ],
            false,
        )?;
        let expected = Operation::join(
            vec![
                Operation::bgp(vec![Pattern::new(s, p, o, Some(g.clone().into()))]),
                service,
            ],
            false,
        )?;
        assert_eq!(context.recurse_graph(op, &g.into())?, expected);
        Ok(())
    }

    #[test]
    fn test_nested_graph_with_pending_renaming() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let g = Variable::new("g")?;
        let p = NamedNode::new("http://example.com/p")?;
        let h = NamedNode::new("http://example.com/h")?;
        let mut context = context();
        let op = Operation::project(
            Operation::graph(
                Operation::bgp(vec![Pattern::new(s.clone(), p, g.clone(), None)]),
                h,
            ),
            vec![s],
        );
        let error = context.recurse_graph(op, &g.into()).unwrap_err();
        assert!(error.is_unsupported());
        Ok(())
    }

    #[test]
    fn test_blank_nodes_are_promoted_by_label() -> Result<(), Box<dyn std::error::Error>> {
        let b = BlankNode::new("b")?;
        let c = BlankNode::new("c")?;
        let o = Variable::new("o")?;
        let p = NamedNode::new("http://example.com/p")?;
        let q = NamedNode::new("http://example.com/q")?;
        let r = NamedNode::new("http://example.com/r")?;
        let template = vec![Pattern::new(b.clone(), p, o, None)];
        let mut context = context();
        let op = Operation::construct(
            Operation::bgp(vec![
                Pattern::new(b.clone(), q.clone(), c.clone(), None),
                Pattern::new(c, r.clone(), b, None),
            ]),
            template.clone(),
        );
        let b = Variable::new("b")?;
        let c = Variable::new("c")?;
        let expected = Operation::construct(
            Operation::bgp(vec![
                Pattern::new(b.clone(), q, c.clone(), None),
                Pattern::new(c, r, b, None),
            ]),
            template,
        );
        assert_eq!(promote_blank_nodes(&mut context, op)?, expected);
        Ok(())
    }

    #[test]
    fn test_insert_template_keeps_blank_nodes() -> Result<(), Box<dyn std::error::Error>> {
        let x = BlankNode::new("x")?;
        let o = Variable::new("o")?;
        let p = NamedNode::new("http://example.com/p")?;
        let q = NamedNode::new("http://example.com/q")?;
        let insert = vec![Pattern::new(x.clone(), p, o.clone(), None)];
        let mut context = context();
        let op = Operation::from(Update::delete_insert(
            Vec::new(),
            insert.clone(),
            Some(Operation::bgp(vec![Pattern::new(o.clone(), q.clone(), x, None)])),
        ));
        let expected = Operation::from(Update::delete_insert(
            Vec::new(),
            insert,
            Some(Operation::bgp(vec![Pattern::new(
                o,
                q,
                Variable::new("x")?,
                None,
            )])),
        ));
        assert_eq!(promote_blank_nodes(&mut context, op)?, expected);
        Ok(())
    }
}
