use crate::algebra::{Operation, Pattern, Update};
use crate::error::AlgebraError;
use crate::syntax::{self, GraphOrDefault, GraphRef, Quads, UpdateOperation};
use crate::term::{GraphName, GraphNamePattern, GraphTarget, NamedNodePattern};
use crate::to_algebra::AlgebraContext;

impl AlgebraContext {
    /// Translates each operation after registering the declarations before it.
    pub(super) fn translate_update(
        &mut self,
        update: &syntax::Update,
    ) -> Result<Operation, AlgebraError> {
        let mut updates = Vec::new();
        for unit in &update.operations {
            self.register_prologue(&unit.prologue)?;
            if let Some(operation) = &unit.operation {
                updates.push(self.translate_update_operation(operation)?);
            }
        }
        Ok(if updates.len() > 1 {
            Operation::composite_update(updates)
        } else if let Some(update) = updates.pop() {
            update.into()
        } else {
            Operation::nop()
        })
    }

    fn translate_update_operation(
        &mut self,
        operation: &UpdateOperation,
    ) -> Result<Update, AlgebraError> {
        Ok(match operation {
            UpdateOperation::Load {
                silent,
                source,
                destination,
            } => Update::load(
                self.named_node(source)?,
                destination
                    .as_ref()
                    .map(|destination| self.named_node(destination))
                    .transpose()?,
                *silent,
            ),
            UpdateOperation::Clear { silent, target } => {
                Update::clear_graph(self.graph_target(target)?, *silent)
            }
            UpdateOperation::Create { silent, graph } => {
                Update::create_graph(self.named_node(graph)?, *silent)
            }
            UpdateOperation::Drop { silent, target } => {
                Update::drop_graph(self.graph_target(target)?, *silent)
            }
            UpdateOperation::Add {
                silent,
                source,
                destination,
            } => Update::add_graph(
                self.graph_name(source)?,
                self.graph_name(destination)?,
                *silent,
            ),
            UpdateOperation::Move {
                silent,
                source,
                destination,
            } => Update::move_graph(
                self.graph_name(source)?,
                self.graph_name(destination)?,
                *silent,
            ),
            UpdateOperation::Copy {
                silent,
                source,
                destination,
            } => Update::copy_graph(
                self.graph_name(source)?,
                self.graph_name(destination)?,
                *silent,
            ),
            UpdateOperation::InsertData { data } => {
                self.require_quads()?;
                Update::delete_insert(Vec::new(), self.translate_quads(data, None)?, None)
            }
            UpdateOperation::DeleteData { data } => {
                self.require_quads()?;
                Update::delete_insert(self.translate_quads(data, None)?, Vec::new(), None)
            }
            UpdateOperation::DeleteWhere { data } => {
                self.require_quads()?;
                let delete = self.translate_quads(data, None)?;
                let pattern = Operation::bgp(delete.clone());
                Update::delete_insert(delete, Vec::new(), Some(pattern))
            }
            UpdateOperation::Modify {
                with,
                delete,
                insert,
                using,
                where_clause,
            } => {
                self.require_quads()?;
                let with = with.as_ref().map(|with| self.named_node(with)).transpose()?;
                let default_graph = with.clone().map(GraphNamePattern::from);
                let delete = self.translate_quads(delete, default_graph.as_ref())?;
                let insert = self.translate_quads(insert, default_graph.as_ref())?;
                // An empty WHERE is kept: without pattern the templates would be data
                let pattern = self.translate_group(where_clause)?;
                let pattern = if !using.is_empty() {
                    let (default, named) = self.dataset(using)?;
                    Operation::from_dataset(pattern, default, named)
                } else if let Some(with) = with {
                    self.recurse_graph(pattern, &NamedNodePattern::from(with))?
                } else {
                    pattern
                };
                Update::delete_insert(delete, insert, Some(pattern))
            }
        })
    }

    fn require_quads(&self) -> Result<(), AlgebraError> {
        if self.quads {
            Ok(())
        } else {
            Err(AlgebraError::unsupported(
                "INSERT/DELETE operations are only supported with quads option enabled",
            ))
        }
    }

    /// The quad patterns of update templates, `default_graph` applying to the triples outside `GRAPH`.
    fn translate_quads(
        &self,
        blocks: &[Quads],
        default_graph: Option<&GraphNamePattern>,
    ) -> Result<Vec<Pattern>, AlgebraError> {
        let mut patterns = Vec::new();
        for block in blocks {
            match block {
                Quads::Triples(triples) => {
                    patterns.extend(self.translate_template(triples, default_graph)?)
                }
                Quads::Graph { graph, triples } => {
                    let graph = GraphNamePattern::from(self.named_node_pattern(graph)?);
                    patterns.extend(self.translate_template(triples, Some(&graph))?);
                }
            }
        }
        Ok(patterns)
    }

    fn graph_target(&self, target: &GraphRef) -> Result<GraphTarget, AlgebraError> {
        Ok(match target {
            GraphRef::Default => GraphTarget::DefaultGraph,
            GraphRef::Named => GraphTarget::NamedGraphs,
            GraphRef::All => GraphTarget::AllGraphs,
            GraphRef::Graph(iri) => self.named_node(iri)?.into(),
        })
    }

    fn graph_name(&self, graph: &GraphOrDefault) -> Result<GraphName, AlgebraError> {
        Ok(match graph {
            GraphOrDefault::Default => GraphName::DefaultGraph,
            GraphOrDefault::Graph(iri) => self.named_node(iri)?.into(),
        })
    }
}
