//! Recovery of `GRAPH` blocks from the graph names of quad patterns and paths.
//!
//! A subtree is lifted to the single graph all its quads share, then wrapped in a
//! [`Graph`](Operation::Graph) by the first ancestor that mixes several graphs. Query forms,
//! projections and services are boundaries: their content is always wrapped below them.

use crate::algebra::{AnyNode, Expression, NodeSubType, NodeType, Operation, Pattern};
use crate::error::AlgebraError;
use crate::term::GraphNamePattern;
use crate::tree::{Rebuild, Transformed, Transformer};
use std::mem::take;
use std::vec;
use tracing::trace;

/// A lifted child and the graph its quads share, `None` if it has no quad.
type Slot = (Operation, Option<GraphNamePattern>);

pub(super) fn remove_quads(op: Operation) -> Result<Operation, AlgebraError> {
    let (op, graph) = lift_graphs(op)?;
    Ok(wrap_in_graph(op, graph.as_ref()))
}

fn lift_graphs(op: Operation) -> Result<Slot, AlgebraError> {
    Ok(match op {
        Operation::Pattern(mut pattern) => {
            let graph = take(&mut pattern.graph);
            (Operation::Pattern(pattern), Some(graph))
        }
        Operation::Path(mut path) => {
            let graph = take(&mut path.graph);
            (Operation::Path(path), Some(graph))
        }
        Operation::Bgp(mut bgp) => {
            let mut graphs = Vec::<GraphNamePattern>::new();
            for pattern in &bgp.patterns {
                if !graphs.contains(&pattern.graph) {
                    graphs.push(pattern.graph.clone());
                }
            }
            if graphs.len() > 1 {
                return split_bgp(bgp.patterns);
            }
            for pattern in &mut bgp.patterns {
                pattern.graph = GraphNamePattern::DefaultGraph;
            }
            (Operation::Bgp(bgp), graphs.pop())
        }
        Operation::Graph(mut op) => {
            op.input = Box::new(remove_quads(*op.input)?);
            (Operation::Graph(op), None)
        }
        Operation::Construct(mut op) => {
            op.input = Box::new(remove_quads(*op.input)?);
            (Operation::Construct(op), None)
        }
        op @ (Operation::CompositeUpdate(_)
        | Operation::Nop(_)
        | Operation::Update(_)
        | Operation::Values(_)) => (op, None),
        op => lift_children(op)?,
    })
}

/// A BGP with patterns in several graphs becomes a join of one BGP per graph.
fn split_bgp(patterns: Vec<Pattern>) -> Result<Slot, AlgebraError> {
    let mut groups = Vec::<(GraphNamePattern, Vec<Pattern>)>::new();
    for mut pattern in patterns {
        let graph = take(&mut pattern.graph);
        match groups.iter_mut().find(|(g, _)| *g == graph) {
            Some((_, group)) => group.push(pattern),
            None => groups.push((graph, vec![pattern])),
        }
    }
    let has_default = groups.iter().any(|(g, _)| g.is_default_graph());
    let input = groups
        .into_iter()
        .map(|(graph, patterns)| wrap_in_graph(Operation::bgp(patterns), Some(&graph)))
        .collect();
    let op = Operation::join(input, true)?;
    Ok((op, has_default.then_some(GraphNamePattern::DefaultGraph)))
}

fn lift_children(op: Operation) -> Result<Slot, AlgebraError> {
    let boundary = matches!(
        op,
        Operation::Project(_) | Operation::Service(_) | Operation::Ask(_) | Operation::Describe(_)
    );

    // The lifted children are set aside, placeholders keeping their positions
    let mut slots = Vec::new();
    let node = AnyNode::from(op).map_children(&mut |child| match child {
        AnyNode::Operation(_) | AnyNode::Pattern(_) => {
            slots.push(lift_graphs(child.try_into()?)?);
            Ok(Operation::nop().into())
        }
        child => lift_existence_inputs(child, &mut slots),
    })?;

    let mut graphs = Vec::<&GraphNamePattern>::new();
    for graph in slots.iter().filter_map(|(_, graph)| graph.as_ref()) {
        if !graphs.contains(&graph) {
            graphs.push(graph);
        }
    }
    let graph = if !boundary && graphs.len() == 1 {
        graphs.pop().cloned()
    } else {
        let has_default = graphs.iter().any(|graph| graph.is_default_graph());
        slots = slots
            .into_iter()
            .map(|(op, graph)| match graph {
                Some(graph) if !graph.is_default_graph() => {
                    (wrap_in_graph(op, Some(&graph)), None)
                }
                graph => (op, graph),
            })
            .collect();
        has_default.then_some(GraphNamePattern::DefaultGraph)
    };

    let mut slots = slots.into_iter();
    let node = node.map_children(&mut |child| match child {
        AnyNode::Operation(Operation::Nop(_)) => next_slot(&mut slots),
        child => restore_existence_inputs(child, &mut slots),
    })?;
    Ok((node.try_into()?, graph))
}

fn next_slot(slots: &mut vec::IntoIter<Slot>) -> Result<AnyNode, AlgebraError> {
    let (op, _) = slots
        .next()
        .ok_or_else(|| AlgebraError::unexpected_node("lifted operation", "nothing"))?;
    Ok(op.into())
}

/// The patterns of `EXISTS` share the graph of the operator they are in.
fn lift_existence_inputs(node: AnyNode, slots: &mut Vec<Slot>) -> Result<AnyNode, AlgebraError> {
    Transformer::<AnyNode, Vec<Slot>>::new()
        .on_sub_type(NodeType::Expression, NodeSubType::Existence, |slots, node| {
            let Expression::Existence {
                not,
                input,
                metadata,
            } = Expression::try_from(node)?
            else {
                return Err(AlgebraError::unexpected_node("existence", "expression"));
            };
            slots.push(lift_graphs(*input)?);
            Ok(Transformed::stop(
                Expression::Existence {
                    not,
                    input: Box::new(Operation::nop()),
                    metadata,
                }
                .into(),
            ))
        })
        .transform(node, slots)
}

fn restore_existence_inputs(
    node: AnyNode,
    slots: &mut vec::IntoIter<Slot>,
) -> Result<AnyNode, AlgebraError> {
    Transformer::<AnyNode, vec::IntoIter<Slot>>::new()
        .on_sub_type(NodeType::Expression, NodeSubType::Existence, |slots, node| {
            let Expression::Existence { not, metadata, .. } = Expression::try_from(node)? else {
                return Err(AlgebraError::unexpected_node("existence", "expression"));
            };
            let input = Operation::try_from(next_slot(slots)?)?;
            Ok(Transformed::stop(
                Expression::Existence {
                    not,
                    input: Box::new(input),
                    metadata,
                }
                .into(),
            ))
        })
        .transform(node, slots)
}

/// Wraps `op` in a `GRAPH` block, unless `graph` is the default graph or unknown.
fn wrap_in_graph(op: Operation, graph: Option<&GraphNamePattern>) -> Operation {
    match graph {
        Some(GraphNamePattern::NamedNode(name)) => {
            trace!(graph = %name, "graph block recovered");
            Operation::graph(op, name.clone())
        }
        Some(GraphNamePattern::Variable(name)) => {
            trace!(graph = %name, "graph block recovered");
            Operation::graph(op, name.clone())
        }
        Some(GraphNamePattern::DefaultGraph) | None => op,
    }
}
