use crate::algebra::{DeleteInsert, Operation, Pattern, Update, is_isomorphic};
use crate::error::AlgebraError;
use crate::syntax::{
    GraphOrDefault, GraphRef, GroupPattern, Iri, Quads, TripleLike, UpdateOperation,
};
use crate::term::{GraphName, GraphNamePattern, GraphTarget, NamedNodePattern};
use crate::to_syntax::pattern::triple;
use crate::to_syntax::quads::remove_quads;
use crate::to_syntax::query::dataset_clauses;
use crate::to_syntax::SyntaxContext;
use tracing::trace;

impl SyntaxContext {
    pub(super) fn translate_update_operation(
        &mut self,
        update: &Update,
    ) -> Result<UpdateOperation, AlgebraError> {
        Ok(match update {
            Update::DeleteInsert(op) => self.translate_delete_insert(op)?,
            Update::Load(op) => UpdateOperation::Load {
                silent: op.silent,
                source: Iri::from(op.source.clone()),
                destination: op.destination.clone().map(Iri::from),
            },
            Update::Clear(op) => UpdateOperation::Clear {
                silent: op.silent,
                target: graph_ref(&op.target),
            },
            Update::Create(op) => UpdateOperation::Create {
                silent: op.silent,
                graph: Iri::from(op.graph.clone()),
            },
            Update::Drop(op) => UpdateOperation::Drop {
                silent: op.silent,
                target: graph_ref(&op.target),
            },
            Update::Add(op) => UpdateOperation::Add {
                silent: op.silent,
                source: graph_or_default(&op.source),
                destination: graph_or_default(&op.destination),
            },
            Update::Move(op) => UpdateOperation::Move {
                silent: op.silent,
                source: graph_or_default(&op.source),
                destination: graph_or_default(&op.destination),
            },
            Update::Copy(op) => UpdateOperation::Copy {
                silent: op.silent,
                source: graph_or_default(&op.source),
                destination: graph_or_default(&op.destination),
            },
        })
    }

    /// Picks the most specific form: `INSERT DATA`, `DELETE DATA`, `DELETE WHERE` or the
    /// general `DELETE/INSERT`.
    fn translate_delete_insert(
        &mut self,
        op: &DeleteInsert,
    ) -> Result<UpdateOperation, AlgebraError> {
        let Some(pattern) = &op.pattern else {
            // Data blocks can't contain variables: the templates then match an empty WHERE
            let ground = !op.delete.iter().chain(&op.insert).any(has_variable);
            if ground && op.delete.is_empty() {
                trace!("INSERT DATA form selected");
                return Ok(UpdateOperation::InsertData {
                    data: quads(&op.insert),
                });
            }
            if ground && op.insert.is_empty() {
                trace!("DELETE DATA form selected");
                return Ok(UpdateOperation::DeleteData {
                    data: quads(&op.delete),
                });
            }
            return Ok(UpdateOperation::Modify {
                with: None,
                delete: quads(&op.delete),
                insert: quads(&op.insert),
                using: Vec::new(),
                where_clause: GroupPattern::default(),
            });
        };
        if op.insert.is_empty() {
            if let Operation::Bgp(bgp) = &**pattern {
                if is_isomorphic(&bgp.patterns, &op.delete) {
                    trace!("DELETE WHERE form selected");
                    return Ok(UpdateOperation::DeleteWhere {
                        data: quads(&op.delete),
                    });
                }
            }
        }
        let (using, input) = match &**pattern {
            Operation::From(from) => (dataset_clauses(&from.default, &from.named), &*from.input),
            input => (Vec::new(), input),
        };
        let where_clause = if input.is_empty_bgp() {
            GroupPattern::default()
        } else {
            self.translate_group(&remove_quads(input.clone())?)?
        };
        Ok(UpdateOperation::Modify {
            with: None,
            delete: quads(&op.delete),
            insert: quads(&op.insert),
            using,
            where_clause,
        })
    }
}

/// Groups template patterns by graph, keeping the order in which the graphs appear.
fn quads(patterns: &[Pattern]) -> Vec<Quads> {
    let mut blocks = Vec::<(&GraphNamePattern, Vec<_>)>::new();
    for pattern in patterns {
        let triple = TripleLike::from(triple(pattern));
        match blocks.iter_mut().find(|(graph, _)| **graph == pattern.graph) {
            Some((_, triples)) => triples.push(triple),
            None => blocks.push((&pattern.graph, vec![triple])),
        }
    }
    blocks
        .into_iter()
        .map(|(graph, triples)| match graph {
            GraphNamePattern::DefaultGraph => Quads::Triples(triples),
            GraphNamePattern::NamedNode(node) => Quads::Graph {
                graph: Iri::from(node.clone()).into(),
                triples,
            },
            GraphNamePattern::Variable(variable) => Quads::Graph {
                graph: variable.clone().into(),
                triples,
            },
        })
        .collect()
}

fn has_variable(pattern: &Pattern) -> bool {
    pattern.subject.contains_variable()
        || matches!(pattern.predicate, NamedNodePattern::Variable(_))
        || pattern.object.contains_variable()
        || matches!(pattern.graph, GraphNamePattern::Variable(_))
}

fn graph_ref(target: &GraphTarget) -> GraphRef {
    match target {
        GraphTarget::NamedNode(node) => GraphRef::Graph(Iri::from(node.clone())),
        GraphTarget::DefaultGraph => GraphRef::Default,
        GraphTarget::NamedGraphs => GraphRef::Named,
        GraphTarget::AllGraphs => GraphRef::All,
    }
}

fn graph_or_default(graph: &GraphName) -> GraphOrDefault {
    match graph {
        GraphName::NamedNode(node) => GraphOrDefault::Graph(Iri::from(node.clone())),
        GraphName::DefaultGraph => GraphOrDefault::Default,
    }
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::syntax::{LiteralTerm, Triple};
    use crate::term::{Literal, NamedNode, Variable};

    fn translate(update: &Update) -> Result<UpdateOperation, AlgebraError> {
        SyntaxContext::default().translate_update_operation(update)
    }

    #[test]
    fn test_data_forms() -> Result<(), Box<dyn std::error::Error>> {
        let s = NamedNode::new("http://example.com/s")?;
        let p = NamedNode::new("http://example.com/p")?;
        let g = NamedNode::new("http://example.com/g")?;
        let o = Literal::new_simple_literal("o");
        let data = vec![
            Pattern::new(s.clone(), p.clone(), o.clone(), None),
            Pattern::new(s.clone(), p.clone(), o.clone(), Some(g.clone().into())),
        ];
        let expected: Vec<TripleLike> =
            vec![Triple::new(Iri::from(s), Iri::from(p), LiteralTerm::Simple("o".into())).into()];
        let expected = vec![
            Quads::Triples(expected.clone()),
            Quads::Graph {
                graph: Iri::from(g).into(),
                triples: expected,
            },
        ];
        assert_eq!(
            translate(&Update::delete_insert(Vec::new(), data.clone(), None))?,
            UpdateOperation::InsertData {
                data: expected.clone()
            }
        );
        assert_eq!(
            translate(&Update::delete_insert(data, Vec::new(), None))?,
            UpdateOperation::DeleteData { data: expected }
        );
        Ok(())
    }

    #[test]
    fn test_delete_where() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let o = Variable::new("o")?;
        let p = NamedNode::new("http://example.com/p")?;
        let delete = vec![Pattern::new(s.clone(), p.clone(), o.clone(), None)];
        let update = Update::delete_insert(
            delete.clone(),
            Vec::new(),
            Some(Operation::bgp(delete)),
        );
        assert_eq!(
            translate(&update)?,
            UpdateOperation::DeleteWhere {
                data: vec![Quads::Triples(vec![
                    Triple::new(s, Iri::from(p), o).into()
                ])]
            }
        );
        Ok(())
    }

    #[test]
    fn test_modify_with_using() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let o = Variable::new("o")?;
        let p = NamedNode::new("http://example.com/p")?;
        let q = NamedNode::new("http://example.com/q")?;
        let g = NamedNode::new("http://example.com/g")?;
        let update = Update::delete_insert(
            Vec::new(),
            vec![Pattern::new(s.clone(), q.clone(), o.clone(), None)],
            Some(Operation::from_dataset(
                Operation::bgp(vec![Pattern::new(s.clone(), p.clone(), o.clone(), None)]),
                vec![g.clone()],
                Vec::new(),
            )),
        );
        let UpdateOperation::Modify {
            insert,
            using,
            where_clause,
            ..
        } = translate(&update)?
        else {
            return Err("a DELETE/INSERT operation was expected".into());
        };
        assert_eq!(
            insert,
            [Quads::Triples(vec![
                Triple::new(s.clone(), Iri::from(q), o.clone()).into()
            ])]
        );
        assert_eq!(using, [crate::syntax::DatasetClause::Default(Iri::from(g))]);
        assert_eq!(
            where_clause,
            GroupPattern::new(vec![crate::syntax::Pattern::Bgp(vec![
                Triple::new(s, Iri::from(p), o).into()
            ])])
        );
        Ok(())
    }

    #[test]
    fn test_graph_management() -> Result<(), Box<dyn std::error::Error>> {
        let g = NamedNode::new("http://example.com/g")?;
        assert_eq!(
            translate(&Update::clear_graph(GraphTarget::AllGraphs, true))?,
            UpdateOperation::Clear {
                silent: true,
                target: GraphRef::All
            }
        );
        assert_eq!(
            translate(&Update::copy_graph(
                GraphName::DefaultGraph,
                g.clone().into(),
                false
            ))?,
            UpdateOperation::Copy {
                silent: false,
                source: GraphOrDefault::Default,
                destination: GraphOrDefault::Graph(Iri::from(g))
            }
        );
        Ok(())
    }
}
