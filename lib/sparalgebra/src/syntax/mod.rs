//! A typed [SPARQL 1.1](https://www.w3.org/TR/sparql11-query/) syntax tree.
//!
//! It is the shape a parser hands over to [`to_algebra`](crate::to_algebra) and the shape
//! [`to_syntax`](crate::to_syntax) produces. IRIs are kept as written: relative IRIs and
//! prefixed names are only resolved during the translation to the algebra.

mod expression;
mod pattern;
mod query;
mod update;
mod walk;

use crate::term::{BlankNode, NamedNode, Variable};
pub use expression::{Aggregate, Expression, SourceLocation};
pub use pattern::{
    Collection, GroupPattern, NegatedPath, Node, Pattern, Predicate, PropertyPath, Triple,
    TripleLike, ValuesPattern,
};
pub use query::{
    DatasetClause, GroupCondition, Ordering, Projection, Query, QueryForm, SelectItem,
    SolutionModifiers,
};
pub use update::{GraphOrDefault, GraphRef, Quads, Update, UpdateOperation, UpdateUnit};
pub(crate) use walk::{find_all_variables, in_scope_variables};
pub use walk::{SyntaxNodeType, SyntaxRef, SyntaxSubType};

/// A parsed query or update request.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Sparql {
    Query(Query),
    Update(Update),
}

/// An IRI reference as written in the request.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Iri {
    /// An absolute or relative IRI, without the enclosing `<>`.
    Full(String),
    /// A prefixed name like `ex:foo`.
    Prefixed { prefix: String, local: String },
}

impl Iri {
    #[inline]
    pub fn full(iri: impl Into<String>) -> Self {
        Self::Full(iri.into())
    }

    #[inline]
    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self::Prefixed {
            prefix: prefix.into(),
            local: local.into(),
        }
    }
}

impl From<NamedNode> for Iri {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::Full(node.into_string())
    }
}

/// A `BASE` or `PREFIX` declaration of a prologue.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Declaration {
    Base(Iri),
    Prefix { prefix: String, iri: Iri },
}

/// A literal as written: its lexical form plus an optional language tag or datatype.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum LiteralTerm {
    Simple(String),
    LanguageTagged { value: String, language: String },
    Typed { value: String, datatype: Iri },
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Term {
    Iri(Iri),
    BlankNode(BlankNode),
    Literal(LiteralTerm),
    Variable(Variable),
    /// A quoted triple `<< s p o >>`.
    Triple(Box<QuotedTriple>),
}

impl Term {
    #[inline]
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(Iri::full(iri))
    }

    #[inline]
    pub fn as_variable(&self) -> Option<&Variable> {
        if let Self::Variable(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

impl From<Variable> for Term {
    #[inline]
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<BlankNode> for Term {
    #[inline]
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl From<Iri> for Term {
    #[inline]
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<LiteralTerm> for Term {
    #[inline]
    fn from(literal: LiteralTerm) -> Self {
        Self::Literal(literal)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct QuotedTriple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}
