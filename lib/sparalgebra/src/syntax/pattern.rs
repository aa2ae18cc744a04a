use crate::syntax::{Expression, Iri, Query, Term};
use crate::term::Variable;

/// A [group graph pattern](https://www.w3.org/TR/sparql11-query/#GroupPatterns) `{ ... }`.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct GroupPattern {
    pub patterns: Vec<Pattern>,
}

impl GroupPattern {
    #[inline]
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }
}

/// A member of a group graph pattern.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Pattern {
    /// A block of triples.
    Bgp(Vec<TripleLike>),
    Group(GroupPattern),
    Optional(GroupPattern),
    Minus(GroupPattern),
    Union(Vec<GroupPattern>),
    /// `GRAPH name { ... }`, `name` being an IRI or a variable.
    Graph { name: Term, group: GroupPattern },
    Service {
        name: Term,
        silent: bool,
        group: GroupPattern,
    },
    Filter(Expression),
    Bind {
        expression: Expression,
        variable: Variable,
    },
    Values(ValuesPattern),
    /// A nested `SELECT` query.
    SubSelect(Box<Query>),
}

/// Inline data. `None` cells are `UNDEF`.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct ValuesPattern {
    pub variables: Vec<Variable>,
    pub rows: Vec<Vec<Option<Term>>>,
}

/// A triple of a triples block, or a subject-less collection like `[ :p :o ] .`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum TripleLike {
    Triple(Triple),
    Collection(Collection),
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Triple {
    pub subject: Node,
    pub predicate: Predicate,
    pub object: Node,
}

impl Triple {
    /// A triple between plain terms.
    #[inline]
    pub fn new(subject: impl Into<Term>, predicate: impl Into<Predicate>, object: impl Into<Term>) -> Self {
        Self {
            subject: Node::Term(subject.into()),
            predicate: predicate.into(),
            object: Node::Term(object.into()),
        }
    }
}

impl From<Triple> for TripleLike {
    #[inline]
    fn from(triple: Triple) -> Self {
        Self::Triple(triple)
    }
}

/// The subject or object of a triple.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Node {
    Term(Term),
    Collection(Collection),
}

/// A blank node property list `[ ... ]` or an RDF collection `( ... )`.
///
/// `triples` already contains the expansion (`rdf:first`/`rdf:rest` for lists) and
/// `identifier` is the term standing for the whole collection.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Collection {
    pub identifier: Term,
    pub triples: Vec<TripleLike>,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Predicate {
    /// An IRI, `a` or a variable.
    Term(Term),
    Path(PropertyPath),
}

impl From<Term> for Predicate {
    #[inline]
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

impl From<Iri> for Predicate {
    #[inline]
    fn from(iri: Iri) -> Self {
        Self::Term(Term::Iri(iri))
    }
}

impl From<Variable> for Predicate {
    #[inline]
    fn from(variable: Variable) -> Self {
        Self::Term(Term::Variable(variable))
    }
}

impl From<PropertyPath> for Predicate {
    #[inline]
    fn from(path: PropertyPath) -> Self {
        Self::Path(path)
    }
}

/// A [property path expression](https://www.w3.org/TR/sparql11-query/#pp-language).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum PropertyPath {
    Iri(Iri),
    /// `a | b`
    Alternative(Vec<Self>),
    /// `a / b`
    Sequence(Vec<Self>),
    /// `^a`
    Inverse(Box<Self>),
    ZeroOrMore(Box<Self>),
    OneOrMore(Box<Self>),
    ZeroOrOne(Box<Self>),
    /// `!a`, `!^a` or `!(a|^b|...)`
    Negated(Vec<NegatedPath>),
}

/// A member of a negated property set.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum NegatedPath {
    Iri(Iri),
    Inverse(Iri),
}
