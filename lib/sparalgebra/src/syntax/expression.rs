use crate::algebra::Aggregator;
use crate::syntax::{GroupPattern, Iri, Term};

/// Where a node was found in the request text, as byte offsets.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct SourceLocation {
    pub start: usize,
    pub end: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Expression {
    Term(Term),
    /// `*` in `COUNT(*)`.
    Wildcard,
    Aggregate(Aggregate),
    /// A call to a function identified by an IRI.
    FunctionCall {
        function: Iri,
        args: Vec<Self>,
        distinct: bool,
        location: Option<SourceLocation>,
    },
    /// An operator or a built-in call, by its lower-case name (`||`, `!`, `str`, `in`, `notin`...).
    Operation {
        operator: String,
        args: Vec<Self>,
        location: Option<SourceLocation>,
    },
    /// `EXISTS { ... }` or `NOT EXISTS { ... }`.
    Exists { negated: bool, group: GroupPattern },
}

impl Expression {
    #[inline]
    pub fn operation(operator: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Operation {
            operator: operator.into(),
            args,
            location: None,
        }
    }

    /// The same expression without any source location.
    ///
    /// Groups of `EXISTS` are kept as they are.
    pub fn without_locations(&self) -> Self {
        match self {
            Self::Aggregate(aggregate) => Self::Aggregate(aggregate.without_locations()),
            Self::FunctionCall {
                function,
                args,
                distinct,
                ..
            } => Self::FunctionCall {
                function: function.clone(),
                args: args.iter().map(Self::without_locations).collect(),
                distinct: *distinct,
                location: None,
            },
            Self::Operation { operator, args, .. } => Self::Operation {
                operator: operator.clone(),
                args: args.iter().map(Self::without_locations).collect(),
                location: None,
            },
            Self::Term(_) | Self::Wildcard | Self::Exists { .. } => self.clone(),
        }
    }
}

impl From<Term> for Expression {
    #[inline]
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

/// A set function call like `COUNT(DISTINCT ?x)`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Aggregate {
    pub aggregator: Aggregator,
    pub distinct: bool,
    pub expression: Box<Expression>,
    pub separator: Option<String>,
    pub location: Option<SourceLocation>,
}

impl Aggregate {
    #[inline]
    pub fn new(aggregator: Aggregator, distinct: bool, expression: Expression) -> Self {
        Self {
            aggregator,
            distinct,
            expression: Box::new(expression),
            separator: None,
            location: None,
        }
    }

    pub fn without_locations(&self) -> Self {
        Self {
            aggregator: self.aggregator,
            distinct: self.distinct,
            expression: Box::new(self.expression.without_locations()),
            separator: self.separator.clone(),
            location: None,
        }
    }
}

impl From<Aggregate> for Expression {
    #[inline]
    fn from(aggregate: Aggregate) -> Self {
        Self::Aggregate(aggregate)
    }
}
