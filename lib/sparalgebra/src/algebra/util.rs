use crate::algebra::*;
use crate::error::AlgebraError;
use crate::tree::{Transformed, Transformer, VisitControl, Visitor};
use std::collections::{BTreeSet, HashMap};

/// Returns the variables an operation may bind, in their natural order.
///
/// Sub-queries only contribute their projected variables and expressions are not entered.
pub fn in_scope_variables(op: &Operation) -> BTreeSet<Variable> {
    let mut variables = BTreeSet::new();
    Visitor::<NodeRef<'_>, BTreeSet<Variable>>::new()
        .pre_visit(NodeType::Project, |variables, node| {
            if let NodeRef::Operation(Operation::Project(project)) = node {
                variables.extend(project.variables.iter().cloned());
            }
            VisitControl::SKIP_CHILDREN
        })
        .pre_visit(NodeType::Expression, |variables, node| {
            if let NodeRef::BoundAggregate(aggregate) = node {
                variables.insert(aggregate.variable.clone());
            }
            VisitControl::SKIP_CHILDREN
        })
        .on(NodeType::Pattern, |variables, node| {
            if let NodeRef::Pattern(pattern) = node {
                add_term_variables(&pattern.subject, variables);
                if let NamedNodePattern::Variable(v) = &pattern.predicate {
                    variables.insert(v.clone());
                }
                add_term_variables(&pattern.object, variables);
                add_graph_variable(&pattern.graph, variables);
            }
        })
        .on(NodeType::Path, |variables, node| {
            if let NodeRef::Operation(Operation::Path(path)) = node {
                add_term_variables(&path.subject, variables);
                add_term_variables(&path.object, variables);
                add_graph_variable(&path.graph, variables);
            }
        })
        .on(NodeType::Extend, |variables, node| {
            if let NodeRef::Operation(Operation::Extend(extend)) = node {
                variables.insert(extend.variable.clone());
            }
        })
        .on(NodeType::Group, |variables, node| {
            if let NodeRef::Operation(Operation::Group(group)) = node {
                variables.extend(group.variables.iter().cloned());
            }
        })
        .on(NodeType::Values, |variables, node| {
            if let NodeRef::Operation(Operation::Values(values)) = node {
                variables.extend(values.variables.iter().cloned());
            }
        })
        .visit(NodeRef::from(op), &mut variables);
    variables
}

fn add_term_variables(term: &TermPattern, variables: &mut BTreeSet<Variable>) {
    match term {
        TermPattern::Variable(v) => {
            variables.insert(v.clone());
        }
        TermPattern::Triple(triple) => {
            add_term_variables(&triple.subject, variables);
            if let NamedNodePattern::Variable(v) = &triple.predicate {
                variables.insert(v.clone());
            }
            add_term_variables(&triple.object, variables);
        }
        TermPattern::NamedNode(_) | TermPattern::BlankNode(_) | TermPattern::Literal(_) => (),
    }
}

fn add_graph_variable(graph: &GraphNamePattern, variables: &mut BTreeSet<Variable>) {
    if let GraphNamePattern::Variable(v) = graph {
        variables.insert(v.clone());
    }
}

#[derive(Default)]
struct Canonicalizer {
    variables: HashMap<Variable, Variable>,
    blank_nodes: HashMap<BlankNode, BlankNode>,
    counter: usize,
    rename_blank_nodes: bool,
}

impl Canonicalizer {
    fn next_name(&mut self) -> String {
        let name = format!("value_{}", self.counter);
        self.counter += 1;
        name
    }

    fn variable(&mut self, variable: &Variable) -> Variable {
        if let Some(renamed) = self.variables.get(variable) {
            return renamed.clone();
        }
        let renamed = Variable::new_unchecked(self.next_name());
        self.variables.insert(variable.clone(), renamed.clone());
        renamed
    }

    fn blank_node(&mut self, node: &BlankNode) -> BlankNode {
        if let Some(renamed) = self.blank_nodes.get(node) {
            return renamed.clone();
        }
        let renamed = BlankNode::new_unchecked(self.next_name());
        self.blank_nodes.insert(node.clone(), renamed.clone());
        renamed
    }

    fn term(&mut self, term: TermPattern, rename_blank_nodes: bool) -> TermPattern {
        match term {
            TermPattern::Variable(v) => self.variable(&v).into(),
            TermPattern::BlankNode(b) if rename_blank_nodes => self.blank_node(&b).into(),
            TermPattern::Triple(triple) => TriplePattern {
                subject: self.term(triple.subject, rename_blank_nodes),
                predicate: self.named_node(triple.predicate),
                object: self.term(triple.object, rename_blank_nodes),
            }
            .into(),
            term => term,
        }
    }

    fn named_node(&mut self, term: NamedNodePattern) -> NamedNodePattern {
        match term {
            NamedNodePattern::Variable(v) => self.variable(&v).into(),
            term @ NamedNodePattern::NamedNode(_) => term,
        }
    }

    fn graph(&mut self, graph: GraphNamePattern) -> GraphNamePattern {
        match graph {
            GraphNamePattern::Variable(v) => self.variable(&v).into(),
            graph => graph,
        }
    }

    fn pattern(&mut self, mut pattern: Pattern, rename_blank_nodes: bool) -> Pattern {
        pattern.subject = self.term(pattern.subject, rename_blank_nodes);
        pattern.predicate = self.named_node(pattern.predicate);
        pattern.object = self.term(pattern.object, rename_blank_nodes);
        pattern.graph = self.graph(pattern.graph);
        pattern
    }
}

/// Renames the variables of an operation, and its blank nodes if asked to, to `value_0`,
/// `value_1`... in the order they are first met.
///
/// Two operations equal up to such a renaming have equal canonical forms. Blank nodes of
/// `CONSTRUCT` templates are kept.
pub fn canonicalize(op: Operation, rename_blank_nodes: bool) -> Result<Operation, AlgebraError> {
    let mut canonicalizer = Canonicalizer {
        rename_blank_nodes,
        ..Canonicalizer::default()
    };
    canonicalize_operation(&mut canonicalizer, op)
}

fn canonicalize_operation(
    canonicalizer: &mut Canonicalizer,
    op: Operation,
) -> Result<Operation, AlgebraError> {
    Transformer::<AnyNode, Canonicalizer>::new()
        .on(NodeType::Pattern, |c, node| {
            let rename_blank_nodes = c.rename_blank_nodes;
            Ok(Transformed::stop(
                c.pattern(Pattern::try_from(node)?, rename_blank_nodes).into(),
            ))
        })
        .on(NodeType::Construct, |c, node| {
            let Operation::Construct(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("construct", "operation"));
            };
            op.input = Box::new(canonicalize_operation(c, *op.input)?);
            op.template = op
                .template
                .into_iter()
                .map(|pattern| c.pattern(pattern, false))
                .collect();
            Ok(Transformed::stop(Operation::Construct(op).into()))
        })
        .on(NodeType::Path, |c, node| {
            let Operation::Path(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("path", "operation"));
            };
            let rename_blank_nodes = c.rename_blank_nodes;
            op.subject = c.term(op.subject, rename_blank_nodes);
            op.object = c.term(op.object, rename_blank_nodes);
            op.graph = c.graph(op.graph);
            Ok(Transformed::stop(Operation::Path(op).into()))
        })
        .on(NodeType::Extend, |c, node| {
            let Operation::Extend(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("extend", "operation"));
            };
            op.variable = c.variable(&op.variable);
            Ok(Transformed::new(Operation::Extend(op).into()))
        })
        .on(NodeType::Group, |c, node| {
            let Operation::Group(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("group", "operation"));
            };
            op.variables = op.variables.iter().map(|v| c.variable(v)).collect();
            Ok(Transformed::new(Operation::Group(op).into()))
        })
        .on(NodeType::Project, |c, node| {
            let Operation::Project(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("project", "operation"));
            };
            op.variables = op.variables.iter().map(|v| c.variable(v)).collect();
            Ok(Transformed::new(Operation::Project(op).into()))
        })
        .on(NodeType::Values, |c, node| {
            let Operation::Values(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("values", "operation"));
            };
            op.variables = op.variables.iter().map(|v| c.variable(v)).collect();
            op.bindings = op
                .bindings
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|(variable, value)| (c.variable(&variable), value))
                        .collect()
                })
                .collect();
            Ok(Transformed::stop(Operation::Values(op).into()))
        })
        .on(NodeType::Describe, |c, node| {
            let Operation::Describe(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("describe", "operation"));
            };
            op.terms = op.terms.into_iter().map(|t| c.named_node(t)).collect();
            Ok(Transformed::new(Operation::Describe(op).into()))
        })
        .on(NodeType::Graph, |c, node| {
            let Operation::Graph(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("graph", "operation"));
            };
            op.name = c.named_node(op.name);
            Ok(Transformed::new(Operation::Graph(op).into()))
        })
        .on(NodeType::Service, |c, node| {
            let Operation::Service(mut op) = Operation::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("service", "operation"));
            };
            op.name = c.named_node(op.name);
            Ok(Transformed::new(Operation::Service(op).into()))
        })
        .on_sub_type(NodeType::Expression, NodeSubType::Term, |c, node| {
            let Expression::Term { term, metadata } = Expression::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("expression", "term"));
            };
            let rename_blank_nodes = c.rename_blank_nodes;
            Ok(Transformed::stop(
                Expression::Term {
                    term: c.term(term, rename_blank_nodes),
                    metadata,
                }
                .into(),
            ))
        })
        .on_sub_type(
            NodeType::Expression,
            NodeSubType::BoundAggregate,
            |c, node| {
                let mut aggregate = BoundAggregate::try_from(node)?;
                aggregate.variable = c.variable(&aggregate.variable);
                Ok(Transformed::new(aggregate.into()))
            },
        )
        .transform(op.into(), canonicalizer)?
        .try_into()
}

/// Checks if two lists of quad patterns are equal up to a bijection between their blank nodes.
///
/// Variables, IRIs, literals and graph names must match exactly.
pub fn is_isomorphic(left: &[Pattern], right: &[Pattern]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; right.len()];
    match_patterns(left, right, &mut used, &mut BlankNodeBijection::default())
}

#[derive(Default, Clone)]
struct BlankNodeBijection {
    forward: HashMap<BlankNode, BlankNode>,
    backward: HashMap<BlankNode, BlankNode>,
}

impl BlankNodeBijection {
    fn bind(&mut self, left: &BlankNode, right: &BlankNode) -> bool {
        match (self.forward.get(left), self.backward.get(right)) {
            (Some(mapped), _) => mapped == right,
            (None, Some(_)) => false,
            (None, None) => {
                self.forward.insert(left.clone(), right.clone());
                self.backward.insert(right.clone(), left.clone());
                true
            }
        }
    }

    fn term(&mut self, left: &TermPattern, right: &TermPattern) -> bool {
        match (left, right) {
            (TermPattern::BlankNode(l), TermPattern::BlankNode(r)) => self.bind(l, r),
            (TermPattern::Triple(l), TermPattern::Triple(r)) => {
                l.predicate == r.predicate
                    && self.term(&l.subject, &r.subject)
                    && self.term(&l.object, &r.object)
            }
            (l, r) => l == r,
        }
    }

    fn pattern(&mut self, left: &Pattern, right: &Pattern) -> bool {
        left.predicate == right.predicate
            && left.graph == right.graph
            && self.term(&left.subject, &right.subject)
            && self.term(&left.object, &right.object)
    }
}

fn match_patterns(
    left: &[Pattern],
    right: &[Pattern],
    used: &mut [bool],
    bijection: &mut BlankNodeBijection,
) -> bool {
    let Some((first, rest)) = left.split_first() else {
        return true;
    };
    for (i, candidate) in right.iter().enumerate() {
        if used[i] {
            continue;
        }
        let saved = bijection.clone();
        if bijection.pattern(first, candidate) {
            used[i] = true;
            if match_patterns(rest, right, used, bijection) {
                return true;
            }
            used[i] = false;
        }
        *bijection = saved;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn p() -> NamedNode {
        NamedNode::new_unchecked("http://example.com/p")
    }

    #[test]
    fn test_in_scope_variables_stop_at_projection() {
        let inner = Operation::project(
            Operation::bgp(vec![Pattern::new(var("a"), p(), var("hidden"), None)]),
            vec![var("a")],
        );
        let op = Operation::extend(
            Operation::left_join(
                Operation::bgp(vec![Pattern::new(var("s"), p(), var("o"), None)]),
                inner,
                Some(Expression::operator(
                    "bound",
                    vec![Expression::term(var("filtered"))],
                )),
            ),
            var("e"),
            Expression::term(var("o")),
        );
        let variables = in_scope_variables(&op);
        assert_eq!(
            variables.into_iter().collect::<Vec<_>>(),
            [var("a"), var("e"), var("o"), var("s")]
        );
    }

    #[test]
    fn test_canonicalize_ignores_names() -> Result<(), AlgebraError> {
        let build = |s: &str, o: &str, b: &str| {
            Operation::project(
                Operation::bgp(vec![
                    Pattern::new(var(s), p(), var(o), None),
                    Pattern::new(var(o), p(), BlankNode::new_unchecked(b), None),
                ]),
                vec![var(s)],
            )
        };
        assert_ne!(build("x", "y", "b1"), build("a", "b", "b2"));
        assert_eq!(
            canonicalize(build("x", "y", "b1"), true)?,
            canonicalize(build("a", "b", "b2"), true)?
        );
        assert_ne!(
            canonicalize(build("x", "y", "b1"), false)?,
            canonicalize(build("a", "b", "b2"), false)?
        );
        Ok(())
    }

    #[test]
    fn test_canonicalize_keeps_construct_template_blank_nodes() -> Result<(), AlgebraError> {
        let op = Operation::construct(
            Operation::bgp(vec![Pattern::new(var("s"), p(), var("o"), None)]),
            vec![Pattern::new(BlankNode::new_unchecked("t"), p(), var("o"), None)],
        );
        let Operation::Construct(op) = canonicalize(op, true)? else {
            panic!("construct expected")
        };
        assert_eq!(
            op.template,
            [Pattern::new(
                BlankNode::new_unchecked("t"),
                p(),
                var("value_1"),
                None
            )]
        );
        Ok(())
    }

    #[test]
    fn test_isomorphism() {
        let b = |id: &str| BlankNode::new_unchecked(id);
        let left = [
            Pattern::new(b("a"), p(), b("b"), None),
            Pattern::new(b("b"), p(), var("x"), None),
        ];
        let right = [
            Pattern::new(b("y"), p(), var("x"), None),
            Pattern::new(b("z"), p(), b("y"), None),
        ];
        assert!(is_isomorphic(&left, &right));
        let wrong = [
            Pattern::new(b("y"), p(), var("x"), None),
            Pattern::new(b("y"), p(), b("y"), None),
        ];
        assert!(!is_isomorphic(&left, &wrong));
        let other_variable = [
            Pattern::new(b("y"), p(), var("other"), None),
            Pattern::new(b("z"), p(), b("y"), None),
        ];
        assert!(!is_isomorphic(&left, &other_variable));
    }
}
