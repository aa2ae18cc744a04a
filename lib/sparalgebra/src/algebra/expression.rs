use crate::algebra::{Metadata, Operation, fmt_sse_list};
use crate::term::*;
use oxrdf::LiteralRef;
use std::fmt;

/// An [expression](https://www.w3.org/TR/sparql11-query/#expressions).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Expression {
    /// A [set function](https://www.w3.org/TR/sparql11-query/#aggregateAlgebra) call.
    Aggregate(AggregateExpression),
    /// [EXISTS](https://www.w3.org/TR/sparql11-query/#func-filter-exists) or `NOT EXISTS`.
    Existence {
        not: bool,
        input: Box<Operation>,
        metadata: Metadata,
    },
    /// A call to a function identified by an IRI.
    Named {
        name: NamedNode,
        args: Vec<Self>,
        metadata: Metadata,
    },
    /// A built-in operator or function, identified by its lower-case SPARQL name (`+`, `&&`, `bound`, `regex`...).
    Operator {
        operator: String,
        args: Vec<Self>,
        metadata: Metadata,
    },
    Term {
        term: TermPattern,
        metadata: Metadata,
    },
    /// `*`, only valid as the argument of `COUNT`.
    Wildcard { metadata: Metadata },
}

/// The [set functions](https://www.w3.org/TR/sparql11-query/#setFunctions).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Aggregator {
    Avg,
    Count,
    GroupConcat,
    Max,
    Min,
    Sample,
    Sum,
}

impl Aggregator {
    /// The lower-case name of the set function.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Count => "count",
            Self::GroupConcat => "group_concat",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sample => "sample",
            Self::Sum => "sum",
        }
    }
}

impl fmt::Display for Aggregator {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct AggregateExpression {
    pub aggregator: Aggregator,
    pub distinct: bool,
    pub expression: Box<Expression>,
    /// Only set for `GROUP_CONCAT`.
    pub separator: Option<String>,
    pub metadata: Metadata,
}

/// An aggregate bound to the variable of the [`Group`](super::Operation::Group) output it fills.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct BoundAggregate {
    pub variable: Variable,
    pub aggregate: AggregateExpression,
}

/// A [property path](https://www.w3.org/TR/sparql11-query/#defn_PropertyPathExpr).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum PropertyPathSymbol {
    Alt {
        input: Vec<Self>,
        metadata: Metadata,
    },
    Inv {
        path: Box<Self>,
        metadata: Metadata,
    },
    Link {
        iri: NamedNode,
        metadata: Metadata,
    },
    /// A negated property set `!(a|b)`.
    Nps {
        iris: Vec<NamedNode>,
        metadata: Metadata,
    },
    OneOrMore {
        path: Box<Self>,
        metadata: Metadata,
    },
    Seq {
        input: Vec<Self>,
        metadata: Metadata,
    },
    ZeroOrMore {
        path: Box<Self>,
        metadata: Metadata,
    },
    ZeroOrOne {
        path: Box<Self>,
        metadata: Metadata,
    },
}

impl Expression {
    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Aggregate(aggregate) => &aggregate.metadata,
            Self::Existence { metadata, .. }
            | Self::Named { metadata, .. }
            | Self::Operator { metadata, .. }
            | Self::Term { metadata, .. }
            | Self::Wildcard { metadata } => metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Self::Aggregate(aggregate) => &mut aggregate.metadata,
            Self::Existence { metadata, .. }
            | Self::Named { metadata, .. }
            | Self::Operator { metadata, .. }
            | Self::Term { metadata, .. }
            | Self::Wildcard { metadata } => metadata,
        }
    }

    /// Returns the variable if the expression is a bare variable.
    pub fn as_variable(&self) -> Option<&Variable> {
        if let Self::Term { term, .. } = self {
            term.as_variable()
        } else {
            None
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aggregate(aggregate) => aggregate.fmt(f),
            Self::Existence { not, input, .. } => {
                if *not {
                    write!(f, "(notexists {input})")
                } else {
                    write!(f, "(exists {input})")
                }
            }
            Self::Named { name, args, .. } => {
                write!(f, "({name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            Self::Operator { operator, args, .. } => {
                write!(f, "({operator}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            Self::Term { term, .. } => term.fmt(f),
            Self::Wildcard { .. } => f.write_str("*"),
        }
    }
}

impl fmt::Display for AggregateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.aggregator)?;
        if self.distinct {
            f.write_str(" distinct")?;
        }
        write!(f, " {}", self.expression)?;
        if let Some(separator) = &self.separator {
            write!(f, " {}", LiteralRef::new_simple_literal(separator))?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for BoundAggregate {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {})", self.variable, self.aggregate)
    }
}

impl PropertyPathSymbol {
    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Alt { metadata, .. }
            | Self::Inv { metadata, .. }
            | Self::Link { metadata, .. }
            | Self::Nps { metadata, .. }
            | Self::OneOrMore { metadata, .. }
            | Self::Seq { metadata, .. }
            | Self::ZeroOrMore { metadata, .. }
            | Self::ZeroOrOne { metadata, .. } => metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Self::Alt { metadata, .. }
            | Self::Inv { metadata, .. }
            | Self::Link { metadata, .. }
            | Self::Nps { metadata, .. }
            | Self::OneOrMore { metadata, .. }
            | Self::Seq { metadata, .. }
            | Self::ZeroOrMore { metadata, .. }
            | Self::ZeroOrOne { metadata, .. } => metadata,
        }
    }
}

impl fmt::Display for PropertyPathSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alt { input, .. } => {
                f.write_str("(alt ")?;
                fmt_sse_list(f, input)?;
                f.write_str(")")
            }
            Self::Inv { path, .. } => write!(f, "(reverse {path})"),
            Self::Link { iri, .. } => iri.fmt(f),
            Self::Nps { iris, .. } => {
                f.write_str("(notoneof")?;
                for iri in iris {
                    write!(f, " {iri}")?;
                }
                f.write_str(")")
            }
            Self::OneOrMore { path, .. } => write!(f, "(path+ {path})"),
            Self::Seq { input, .. } => {
                f.write_str("(seq ")?;
                fmt_sse_list(f, input)?;
                f.write_str(")")
            }
            Self::ZeroOrMore { path, .. } => write!(f, "(path* {path})"),
            Self::ZeroOrOne { path, .. } => write!(f, "(path? {path})"),
        }
    }
}
