//! [SPARQL 1.1 Query Algebra](https://www.w3.org/TR/sparql11-query/#sparqlAlgebra) representation.
//!
//! Nodes should be built with the constructors of [`Operation`], [`Expression`],
//! [`PropertyPathSymbol`] and [`Update`]: they enforce the invariants of the algebra
//! (flattened associative operators, explicit default graph for paths...).
//!
//! The default string formatter of each node returns the
//! [SPARQL S-Expression syntax](https://jena.apache.org/documentation/notes/sse.html).

mod expression;
mod factory;
mod node;
mod update;
mod util;

use crate::term::*;
pub use expression::{
    AggregateExpression, Aggregator, BoundAggregate, Expression, PropertyPathSymbol,
};
pub use node::{AnyNode, NodeRef, NodeSubType, NodeType};
use std::collections::BTreeMap;
use std::fmt;
pub use update::{CreateGraph, DeleteInsert, GraphManagement, GraphTransfer, Load, Update};
pub use util::{canonicalize, in_scope_variables, is_isomorphic};

/// Free-form annotations attached to a node, kept across rewrites.
pub type Metadata = BTreeMap<String, String>;

/// An operator of the SPARQL algebra, including the update operations.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Operation {
    /// [Ask](https://www.w3.org/TR/sparql11-query/#ask) query form.
    Ask(Ask),
    /// A [basic graph pattern](https://www.w3.org/TR/sparql11-query/#defn_BasicGraphPattern).
    Bgp(Bgp),
    /// A sequence of update operations.
    CompositeUpdate(CompositeUpdate),
    /// [Construct](https://www.w3.org/TR/sparql11-query/#construct) query form.
    Construct(Construct),
    /// [Describe](https://www.w3.org/TR/sparql11-query/#describe) query form.
    Describe(Describe),
    /// [Distinct](https://www.w3.org/TR/sparql11-query/#defn_algDistinct).
    Distinct(Distinct),
    /// [Extend](https://www.w3.org/TR/sparql11-query/#defn_extend).
    Extend(Extend),
    /// [Filter](https://www.w3.org/TR/sparql11-query/#defn_algFilter).
    Filter(Filter),
    /// The [RDF dataset](https://www.w3.org/TR/sparql11-query/#specifyingDataset) of a query or of an update `WHERE` clause.
    From(FromDataset),
    /// [Graph](https://www.w3.org/TR/sparql11-query/#defn_evalGraph).
    Graph(Graph),
    /// [Group](https://www.w3.org/TR/sparql11-query/#aggregateAlgebra).
    Group(Group),
    /// [Join](https://www.w3.org/TR/sparql11-query/#defn_algJoin), n-ary.
    Join(Join),
    /// [LeftJoin](https://www.w3.org/TR/sparql11-query/#defn_algLeftJoin).
    LeftJoin(LeftJoin),
    /// [Minus](https://www.w3.org/TR/sparql11-query/#defn_algMinus).
    Minus(Minus),
    /// The empty update.
    Nop(Nop),
    /// [OrderBy](https://www.w3.org/TR/sparql11-query/#defn_algOrdered).
    OrderBy(OrderBy),
    /// A [property path pattern](https://www.w3.org/TR/sparql11-query/#defn_evalPP_predicate).
    Path(Path),
    /// A single quad pattern.
    Pattern(Pattern),
    /// [Project](https://www.w3.org/TR/sparql11-query/#defn_algProjection).
    Project(Project),
    /// [Reduced](https://www.w3.org/TR/sparql11-query/#defn_algReduced).
    Reduced(Reduced),
    /// [Service](https://www.w3.org/TR/sparql11-federated-query/#defn_evalService).
    Service(Service),
    /// [Slice](https://www.w3.org/TR/sparql11-query/#defn_algSlice).
    Slice(Slice),
    /// [Union](https://www.w3.org/TR/sparql11-query/#defn_algUnion), n-ary.
    Union(Union),
    /// A single update operation.
    Update(Update),
    /// A table used to provide inline values.
    Values(Values),
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ask {
    pub input: Box<Operation>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Bgp {
    pub patterns: Vec<Pattern>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct CompositeUpdate {
    pub updates: Vec<Update>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Construct {
    pub input: Box<Operation>,
    /// The template. Its blank nodes are kept as is.
    pub template: Vec<Pattern>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Describe {
    pub input: Box<Operation>,
    pub terms: Vec<NamedNodePattern>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Distinct {
    pub input: Box<Operation>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Extend {
    pub input: Box<Operation>,
    pub variable: Variable,
    pub expression: Expression,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Filter {
    pub input: Box<Operation>,
    pub expression: Expression,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct FromDataset {
    pub input: Box<Operation>,
    pub default: Vec<NamedNode>,
    pub named: Vec<NamedNode>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Graph {
    pub input: Box<Operation>,
    pub name: NamedNodePattern,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Group {
    pub input: Box<Operation>,
    pub variables: Vec<Variable>,
    pub aggregates: Vec<BoundAggregate>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Join {
    pub input: Vec<Operation>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct LeftJoin {
    pub input: Box<[Operation; 2]>,
    pub expression: Option<Expression>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Minus {
    pub input: Box<[Operation; 2]>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct Nop {
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct OrderBy {
    pub input: Box<Operation>,
    /// The sort keys, a descending key is wrapped in a `desc` operator.
    pub expressions: Vec<Expression>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Path {
    pub subject: TermPattern,
    pub predicate: PropertyPathSymbol,
    pub object: TermPattern,
    pub graph: GraphNamePattern,
    pub metadata: Metadata,
}

/// A [triple pattern](https://www.w3.org/TR/sparql11-query/#defn_TriplePattern) with a graph name.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Pattern {
    pub subject: TermPattern,
    pub predicate: NamedNodePattern,
    pub object: TermPattern,
    pub graph: GraphNamePattern,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Project {
    pub input: Box<Operation>,
    pub variables: Vec<Variable>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Reduced {
    pub input: Box<Operation>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Service {
    pub input: Box<Operation>,
    pub name: NamedNodePattern,
    pub silent: bool,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Slice {
    pub input: Box<Operation>,
    pub start: usize,
    pub length: Option<usize>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Union {
    pub input: Vec<Operation>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Values {
    pub variables: Vec<Variable>,
    /// One map per row. A variable missing from a row is unbound in it.
    pub bindings: Vec<BTreeMap<Variable, GroundTerm>>,
    pub metadata: Metadata,
}

impl Operation {
    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Ask(op) => &op.metadata,
            Self::Bgp(op) => &op.metadata,
            Self::CompositeUpdate(op) => &op.metadata,
            Self::Construct(op) => &op.metadata,
            Self::Describe(op) => &op.metadata,
            Self::Distinct(op) => &op.metadata,
            Self::Extend(op) => &op.metadata,
            Self::Filter(op) => &op.metadata,
            Self::From(op) => &op.metadata,
            Self::Graph(op) => &op.metadata,
            Self::Group(op) => &op.metadata,
            Self::Join(op) => &op.metadata,
            Self::LeftJoin(op) => &op.metadata,
            Self::Minus(op) => &op.metadata,
            Self::Nop(op) => &op.metadata,
            Self::OrderBy(op) => &op.metadata,
            Self::Path(op) => &op.metadata,
            Self::Pattern(op) => &op.metadata,
            Self::Project(op) => &op.metadata,
            Self::Reduced(op) => &op.metadata,
            Self::Service(op) => &op.metadata,
            Self::Slice(op) => &op.metadata,
            Self::Union(op) => &op.metadata,
            Self::Update(op) => op.metadata(),
            Self::Values(op) => &op.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Self::Ask(op) => &mut op.metadata,
            Self::Bgp(op) => &mut op.metadata,
            Self::CompositeUpdate(op) => &mut op.metadata,
            Self::Construct(op) => &mut op.metadata,
            Self::Describe(op) => &mut op.metadata,
            Self::Distinct(op) => &mut op.metadata,
            Self::Extend(op) => &mut op.metadata,
            Self::Filter(op) => &mut op.metadata,
            Self::From(op) => &mut op.metadata,
            Self::Graph(op) => &mut op.metadata,
            Self::Group(op) => &mut op.metadata,
            Self::Join(op) => &mut op.metadata,
            Self::LeftJoin(op) => &mut op.metadata,
            Self::Minus(op) => &mut op.metadata,
            Self::Nop(op) => &mut op.metadata,
            Self::OrderBy(op) => &mut op.metadata,
            Self::Path(op) => &mut op.metadata,
            Self::Pattern(op) => &mut op.metadata,
            Self::Project(op) => &mut op.metadata,
            Self::Reduced(op) => &mut op.metadata,
            Self::Service(op) => &mut op.metadata,
            Self::Slice(op) => &mut op.metadata,
            Self::Union(op) => &mut op.metadata,
            Self::Update(op) => op.metadata_mut(),
            Self::Values(op) => &mut op.metadata,
        }
    }

    /// Checks if the operation is a basic graph pattern without any pattern.
    #[inline]
    pub fn is_empty_bgp(&self) -> bool {
        matches!(self, Self::Bgp(bgp) if bgp.patterns.is_empty())
    }

    /// Checks if the operation is an update.
    #[inline]
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update(_) | Self::CompositeUpdate(_) | Self::Nop(_))
    }
}

impl Pattern {
    /// Formats using the [SPARQL S-Expression syntax](https://jena.apache.org/documentation/notes/sse.html).
    pub(crate) fn fmt_sse(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.graph.is_default_graph() {
            write!(
                f,
                "(triple {} {} {})",
                self.subject, self.predicate, self.object
            )
        } else {
            write!(
                f,
                "(quad {} {} {} {})",
                self.graph, self.subject, self.predicate, self.object
            )
        }
    }
}

impl fmt::Display for Pattern {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_sse(f)
    }
}

pub(crate) fn fmt_sse_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ask(op) => write!(f, "(ask {})", op.input),
            Self::Bgp(op) => {
                f.write_str("(bgp")?;
                for pattern in &op.patterns {
                    write!(f, " {pattern}")?;
                }
                f.write_str(")")
            }
            Self::CompositeUpdate(op) => {
                f.write_str("(update")?;
                for update in &op.updates {
                    write!(f, " {update}")?;
                }
                f.write_str(")")
            }
            Self::Construct(op) => {
                f.write_str("(construct (")?;
                fmt_sse_list(f, &op.template)?;
                write!(f, ") {})", op.input)
            }
            Self::Describe(op) => {
                f.write_str("(describe (")?;
                fmt_sse_list(f, &op.terms)?;
                write!(f, ") {})", op.input)
            }
            Self::Distinct(op) => write!(f, "(distinct {})", op.input),
            Self::Extend(op) => write!(
                f,
                "(extend (({} {})) {})",
                op.variable, op.expression, op.input
            ),
            Self::Filter(op) => write!(f, "(filter {} {})", op.expression, op.input),
            Self::From(op) => {
                f.write_str("(dataset (")?;
                fmt_sse_list(f, &op.default)?;
                f.write_str(") (")?;
                fmt_sse_list(f, &op.named)?;
                write!(f, ") {})", op.input)
            }
            Self::Graph(op) => write!(f, "(graph {} {})", op.name, op.input),
            Self::Group(op) => {
                f.write_str("(group (")?;
                fmt_sse_list(f, &op.variables)?;
                f.write_str(") (")?;
                fmt_sse_list(f, &op.aggregates)?;
                write!(f, ") {})", op.input)
            }
            Self::Join(op) => {
                f.write_str("(join ")?;
                fmt_sse_list(f, &op.input)?;
                f.write_str(")")
            }
            Self::LeftJoin(op) => {
                let [left, right] = op.input.as_ref();
                write!(f, "(leftjoin {left} {right}")?;
                if let Some(expression) = &op.expression {
                    write!(f, " {expression}")?;
                }
                f.write_str(")")
            }
            Self::Minus(op) => {
                let [left, right] = op.input.as_ref();
                write!(f, "(minus {left} {right})")
            }
            Self::Nop(_) => f.write_str("(null)"),
            Self::OrderBy(op) => {
                f.write_str("(order (")?;
                fmt_sse_list(f, &op.expressions)?;
                write!(f, ") {})", op.input)
            }
            Self::Path(op) => {
                if op.graph.is_default_graph() {
                    write!(f, "(path {} {} {})", op.subject, op.predicate, op.object)
                } else {
                    write!(
                        f,
                        "(graph {} (path {} {} {}))",
                        op.graph, op.subject, op.predicate, op.object
                    )
                }
            }
            Self::Pattern(op) => write!(f, "(bgp {op})"),
            Self::Project(op) => {
                f.write_str("(project (")?;
                fmt_sse_list(f, &op.variables)?;
                write!(f, ") {})", op.input)
            }
            Self::Reduced(op) => write!(f, "(reduced {})", op.input),
            Self::Service(op) => {
                f.write_str("(service ")?;
                if op.silent {
                    f.write_str("silent ")?;
                }
                write!(f, "{} {})", op.name, op.input)
            }
            Self::Slice(op) => {
                write!(f, "(slice {} ", op.start)?;
                if let Some(length) = op.length {
                    write!(f, "{length}")?;
                } else {
                    f.write_str("_")?;
                }
                write!(f, " {})", op.input)
            }
            Self::Union(op) => {
                f.write_str("(union ")?;
                fmt_sse_list(f, &op.input)?;
                f.write_str(")")
            }
            Self::Update(op) => op.fmt(f),
            Self::Values(op) => {
                f.write_str("(table (vars")?;
                for variable in &op.variables {
                    write!(f, " {variable}")?;
                }
                f.write_str(")")?;
                for row in &op.bindings {
                    f.write_str(" (row")?;
                    for (variable, value) in row {
                        write!(f, " [{variable} {value}]")?;
                    }
                    f.write_str(")")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<Pattern> for Operation {
    #[inline]
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<Update> for Operation {
    #[inline]
    fn from(update: Update) -> Self {
        Self::Update(update)
    }
}
