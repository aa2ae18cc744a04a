use crate::syntax::{Declaration, Expression, GroupPattern, Iri, Term, TripleLike, ValuesPattern};
use crate::term::Variable;

/// A [SPARQL query](https://www.w3.org/TR/sparql11-query/#rQuery).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Query {
    pub prologue: Vec<Declaration>,
    pub form: QueryForm,
    pub datasets: Vec<DatasetClause>,
    /// `None` for `DESCRIBE <iri>` without `WHERE`.
    pub where_clause: Option<GroupPattern>,
    pub modifiers: SolutionModifiers,
    /// The trailing `VALUES` block.
    pub values: Option<ValuesPattern>,
}

impl Query {
    /// A query of the given form over `where_clause`, without prologue, dataset nor modifier.
    pub fn new(form: QueryForm, where_clause: GroupPattern) -> Self {
        Self {
            prologue: Vec::new(),
            form,
            datasets: Vec::new(),
            where_clause: Some(where_clause),
            modifiers: SolutionModifiers::default(),
            values: None,
        }
    }

    /// A `SELECT *` query.
    pub fn select_all(where_clause: GroupPattern) -> Self {
        Self::new(
            QueryForm::Select {
                distinct: false,
                reduced: false,
                projection: Projection::Wildcard,
            },
            where_clause,
        )
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum QueryForm {
    Select {
        distinct: bool,
        reduced: bool,
        projection: Projection,
    },
    /// `CONSTRUCT { template }`. For `CONSTRUCT WHERE` the template is the where clause triples.
    Construct { template: Vec<TripleLike> },
    /// `DESCRIBE`, an empty list of targets standing for `DESCRIBE *`.
    Describe { targets: Vec<Term> },
    Ask,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Projection {
    /// `SELECT *`
    Wildcard,
    Items(Vec<SelectItem>),
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum SelectItem {
    Variable(Variable),
    /// `(expression AS ?variable)`
    Bind {
        expression: Expression,
        variable: Variable,
    },
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum DatasetClause {
    /// `FROM` or `USING`.
    Default(Iri),
    /// `FROM NAMED` or `USING NAMED`.
    Named(Iri),
}

#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct SolutionModifiers {
    pub group_by: Vec<GroupCondition>,
    pub having: Vec<Expression>,
    pub order_by: Vec<Ordering>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum GroupCondition {
    Variable(Variable),
    Expression(Expression),
    /// `(expression AS ?variable)`
    Bind {
        expression: Expression,
        variable: Variable,
    },
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ordering {
    pub expression: Expression,
    pub descending: bool,
}
