//! Binding of the syntax tree to the [tree engine](crate::tree).

use crate::syntax::*;
use crate::tree::{Route, Router, Tagged, Visitor, Walk};
use std::collections::{BTreeSet, HashSet};

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SyntaxNodeType {
    Query,
    Update,
    UpdateOperation,
    Quads,
    Group,
    Pattern,
    Triple,
    Collection,
    Term,
    Expression,
    Values,
}

/// The kinds of [`Pattern`] and [`Term`].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SyntaxSubType {
    Bgp,
    Group,
    Optional,
    Minus,
    Union,
    Graph,
    Service,
    Filter,
    Bind,
    Values,
    SubSelect,
    Iri,
    BlankNode,
    Literal,
    Variable,
    Triple,
}

/// A borrowed node of the syntax tree.
#[derive(Debug, Clone, Copy)]
pub enum SyntaxRef<'a> {
    Query(&'a Query),
    Update(&'a Update),
    UpdateOperation(&'a UpdateOperation),
    Quads(&'a Quads),
    Group(&'a GroupPattern),
    Pattern(&'a Pattern),
    Triple(&'a TripleLike),
    Collection(&'a Collection),
    Term(&'a Term),
    Expression(&'a Expression),
    Values(&'a ValuesPattern),
}

impl<'a> From<&'a Sparql> for SyntaxRef<'a> {
    #[inline]
    fn from(sparql: &'a Sparql) -> Self {
        match sparql {
            Sparql::Query(query) => Self::Query(query),
            Sparql::Update(update) => Self::Update(update),
        }
    }
}

impl Tagged for SyntaxRef<'_> {
    type Type = SyntaxNodeType;
    type SubType = SyntaxSubType;

    fn node_type(&self) -> SyntaxNodeType {
        match self {
            Self::Query(_) => SyntaxNodeType::Query,
            Self::Update(_) => SyntaxNodeType::Update,
            Self::UpdateOperation(_) => SyntaxNodeType::UpdateOperation,
            Self::Quads(_) => SyntaxNodeType::Quads,
            Self::Group(_) => SyntaxNodeType::Group,
            Self::Pattern(_) => SyntaxNodeType::Pattern,
            Self::Triple(_) => SyntaxNodeType::Triple,
            Self::Collection(_) => SyntaxNodeType::Collection,
            Self::Term(_) => SyntaxNodeType::Term,
            Self::Expression(_) => SyntaxNodeType::Expression,
            Self::Values(_) => SyntaxNodeType::Values,
        }
    }

    fn sub_type(&self) -> Option<SyntaxSubType> {
        match self {
            Self::Pattern(pattern) => Some(match pattern {
                Pattern::Bgp(_) => SyntaxSubType::Bgp,
                Pattern::Group(_) => SyntaxSubType::Group,
                Pattern::Optional(_) => SyntaxSubType::Optional,
                Pattern::Minus(_) => SyntaxSubType::Minus,
                Pattern::Union(_) => SyntaxSubType::Union,
                Pattern::Graph { .. } => SyntaxSubType::Graph,
                Pattern::Service { .. } => SyntaxSubType::Service,
                Pattern::Filter(_) => SyntaxSubType::Filter,
                Pattern::Bind { .. } => SyntaxSubType::Bind,
                Pattern::Values(_) => SyntaxSubType::Values,
                Pattern::SubSelect(_) => SyntaxSubType::SubSelect,
            }),
            Self::Term(term) => Some(match term {
                Term::Iri(_) => SyntaxSubType::Iri,
                Term::BlankNode(_) => SyntaxSubType::BlankNode,
                Term::Literal(_) => SyntaxSubType::Literal,
                Term::Variable(_) => SyntaxSubType::Variable,
                Term::Triple(_) => SyntaxSubType::Triple,
            }),
            _ => None,
        }
    }
}

impl<'a> SyntaxRef<'a> {
    fn node(node: &'a Node) -> Self {
        match node {
            Node::Term(term) => Self::Term(term),
            Node::Collection(collection) => Self::Collection(collection),
        }
    }
}

impl Walk for SyntaxRef<'_> {
    fn children(self, children: &mut Vec<Self>) {
        match self {
            Self::Query(query) => {
                if let Some(where_clause) = &query.where_clause {
                    children.push(Self::Group(where_clause));
                }
                match &query.form {
                    QueryForm::Select {
                        projection: Projection::Items(items),
                        ..
                    } => {
                        for item in items {
                            if let SelectItem::Bind { expression, .. } = item {
                                children.push(Self::Expression(expression));
                            }
                        }
                    }
                    QueryForm::Select { .. } | QueryForm::Ask => (),
                    QueryForm::Construct { template } => {
                        children.extend(template.iter().map(Self::Triple))
                    }
                    QueryForm::Describe { targets } => {
                        children.extend(targets.iter().map(Self::Term))
                    }
                }
                for condition in &query.modifiers.group_by {
                    match condition {
                        GroupCondition::Expression(expression)
                        | GroupCondition::Bind { expression, .. } => {
                            children.push(Self::Expression(expression))
                        }
                        GroupCondition::Variable(_) => (),
                    }
                }
                children.extend(query.modifiers.having.iter().map(Self::Expression));
                children.extend(
                    query
                        .modifiers
                        .order_by
                        .iter()
                        .map(|o| Self::Expression(&o.expression)),
                );
                if let Some(values) = &query.values {
                    children.push(Self::Values(values));
                }
            }
            Self::Update(update) => children.extend(
                update
                    .operations
                    .iter()
                    .filter_map(|unit| unit.operation.as_ref())
                    .map(Self::UpdateOperation),
            ),
            Self::UpdateOperation(operation) => match operation {
                UpdateOperation::InsertData { data }
                | UpdateOperation::DeleteData { data }
                | UpdateOperation::DeleteWhere { data } => {
                    children.extend(data.iter().map(Self::Quads))
                }
                UpdateOperation::Modify {
                    delete,
                    insert,
                    where_clause,
                    ..
                } => {
                    children.extend(delete.iter().map(Self::Quads));
                    children.extend(insert.iter().map(Self::Quads));
                    children.push(Self::Group(where_clause));
                }
                UpdateOperation::Load { .. }
                | UpdateOperation::Clear { .. }
                | UpdateOperation::Create { .. }
                | UpdateOperation::Drop { .. }
                | UpdateOperation::Add { .. }
                | UpdateOperation::Move { .. }
                | UpdateOperation::Copy { .. } => (),
            },
            Self::Quads(quads) => match quads {
                Quads::Triples(triples) => children.extend(triples.iter().map(Self::Triple)),
                Quads::Graph { graph, triples } => {
                    children.push(Self::Term(graph));
                    children.extend(triples.iter().map(Self::Triple));
                }
            },
            Self::Group(group) => children.extend(group.patterns.iter().map(Self::Pattern)),
            Self::Pattern(pattern) => match pattern {
                Pattern::Bgp(triples) => children.extend(triples.iter().map(Self::Triple)),
                Pattern::Group(group) | Pattern::Optional(group) | Pattern::Minus(group) => {
                    children.push(Self::Group(group))
                }
                Pattern::Union(groups) => children.extend(groups.iter().map(Self::Group)),
                Pattern::Graph { name, group } | Pattern::Service { name, group, .. } => {
                    children.push(Self::Term(name));
                    children.push(Self::Group(group));
                }
                Pattern::Filter(expression) | Pattern::Bind { expression, .. } => {
                    children.push(Self::Expression(expression))
                }
                Pattern::Values(values) => children.push(Self::Values(values)),
                Pattern::SubSelect(query) => children.push(Self::Query(query)),
            },
            Self::Triple(triple) => match triple {
                TripleLike::Triple(triple) => {
                    children.push(Self::node(&triple.subject));
                    if let Predicate::Term(predicate) = &triple.predicate {
                        children.push(Self::Term(predicate));
                    }
                    children.push(Self::node(&triple.object));
                }
                TripleLike::Collection(collection) => children.push(Self::Collection(collection)),
            },
            Self::Collection(collection) => {
                children.push(Self::Term(&collection.identifier));
                children.extend(collection.triples.iter().map(Self::Triple));
            }
            Self::Term(term) => {
                if let Term::Triple(triple) = term {
                    children.push(Self::Term(&triple.subject));
                    children.push(Self::Term(&triple.predicate));
                    children.push(Self::Term(&triple.object));
                }
            }
            Self::Expression(expression) => match expression {
                Expression::Term(term) => children.push(Self::Term(term)),
                Expression::Aggregate(aggregate) => {
                    children.push(Self::Expression(&aggregate.expression))
                }
                Expression::FunctionCall { args, .. } | Expression::Operation { args, .. } => {
                    children.extend(args.iter().map(Self::Expression))
                }
                Expression::Exists { group, .. } => children.push(Self::Group(group)),
                Expression::Wildcard => (),
            },
            Self::Values(values) => {
                for row in &values.rows {
                    children.extend(row.iter().flatten().map(Self::Term));
                }
            }
        }
    }
}

/// Every variable mentioned anywhere in the request, including inside sub-queries and
/// expressions.
pub(crate) fn find_all_variables(sparql: &Sparql) -> HashSet<Variable> {
    let mut variables = HashSet::new();
    Visitor::<SyntaxRef<'_>, HashSet<Variable>>::new()
        .on_sub_type(
            SyntaxNodeType::Term,
            SyntaxSubType::Variable,
            |variables, node| {
                if let SyntaxRef::Term(Term::Variable(v)) = node {
                    variables.insert(v.clone());
                }
            },
        )
        .on_sub_type(
            SyntaxNodeType::Pattern,
            SyntaxSubType::Bind,
            |variables, node| {
                if let SyntaxRef::Pattern(Pattern::Bind { variable, .. }) = node {
                    variables.insert(variable.clone());
                }
            },
        )
        .on(SyntaxNodeType::Values, |variables, node| {
            if let SyntaxRef::Values(values) = node {
                variables.extend(values.variables.iter().cloned());
            }
        })
        .on(SyntaxNodeType::Query, |variables, node| {
            let SyntaxRef::Query(query) = node else {
                return;
            };
            if let QueryForm::Select {
                projection: Projection::Items(items),
                ..
            } = &query.form
            {
                variables.extend(items.iter().map(|item| match item {
                    SelectItem::Variable(variable) | SelectItem::Bind { variable, .. } => {
                        variable.clone()
                    }
                }));
            }
            for condition in &query.modifiers.group_by {
                match condition {
                    GroupCondition::Variable(variable) | GroupCondition::Bind { variable, .. } => {
                        variables.insert(variable.clone());
                    }
                    GroupCondition::Expression(_) => (),
                }
            }
        })
        .visit(SyntaxRef::from(sparql), &mut variables);
    variables
}

/// The variables `SELECT *` projects for a group: those bound by its patterns, without
/// looking into `FILTER`s, `MINUS`s or the non projected variables of sub-queries.
pub(crate) fn in_scope_variables(group: &GroupPattern) -> BTreeSet<Variable> {
    fn children(node: SyntaxRef<'_>) -> Route<SyntaxRef<'_>> {
        let mut children = Vec::new();
        node.children(&mut children);
        Route::into(children)
    }

    let mut variables = BTreeSet::new();
    Router::<SyntaxRef<'_>, BTreeSet<Variable>>::new()
        .on(SyntaxNodeType::Group, |_, node| children(node))
        .on(SyntaxNodeType::Pattern, |_, node| children(node))
        .on_sub_type(SyntaxNodeType::Pattern, SyntaxSubType::Filter, |_, _| {
            Route::stop()
        })
        .on_sub_type(SyntaxNodeType::Pattern, SyntaxSubType::Minus, |_, _| {
            Route::stop()
        })
        .on_sub_type(
            SyntaxNodeType::Pattern,
            SyntaxSubType::Bind,
            |variables, node| {
                if let SyntaxRef::Pattern(Pattern::Bind { variable, .. }) = node {
                    variables.insert(variable.clone());
                }
                Route::stop()
            },
        )
        .on_sub_type(
            SyntaxNodeType::Pattern,
            SyntaxSubType::Values,
            |variables, node| {
                if let SyntaxRef::Pattern(Pattern::Values(values)) = node {
                    variables.extend(values.variables.iter().cloned());
                }
                Route::stop()
            },
        )
        .on_sub_type(
            SyntaxNodeType::Pattern,
            SyntaxSubType::SubSelect,
            |variables, node| {
                let SyntaxRef::Pattern(Pattern::SubSelect(query)) = node else {
                    return Route::stop();
                };
                match &query.form {
                    QueryForm::Select {
                        projection: Projection::Items(items),
                        ..
                    } => {
                        variables.extend(items.iter().map(|item| match item {
                            SelectItem::Variable(variable)
                            | SelectItem::Bind { variable, .. } => variable.clone(),
                        }));
                        Route::stop()
                    }
                    _ => Route::into(
                        query
                            .where_clause
                            .as_ref()
                            .map(SyntaxRef::Group)
                            .into_iter()
                            .collect(),
                    ),
                }
            },
        )
        .on(SyntaxNodeType::Triple, |_, node| children(node))
        .on(SyntaxNodeType::Collection, |_, node| children(node))
        .on(SyntaxNodeType::Term, |variables, node| {
            if let SyntaxRef::Term(Term::Variable(v)) = node {
                variables.insert(v.clone());
            }
            children(node)
        })
        .traverse(SyntaxRef::Group(group), &mut variables);
    variables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::NamedNode;

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn triple(s: &str, o: &str) -> Pattern {
        Pattern::Bgp(vec![
            Triple::new(var(s), Iri::full("http://example.com/p"), var(o)).into(),
        ])
    }

    #[test]
    fn test_select_star_scope() {
        let sub_query = Query::new(
            QueryForm::Select {
                distinct: false,
                reduced: false,
                projection: Projection::Items(vec![SelectItem::Variable(var("inner"))]),
            },
            GroupPattern::new(vec![triple("inner", "hidden")]),
        );
        let group = GroupPattern::new(vec![
            triple("s", "o"),
            Pattern::Filter(Expression::Term(var("filtered").into())),
            Pattern::Minus(GroupPattern::new(vec![triple("s", "minus")])),
            Pattern::Bind {
                expression: Expression::Term(Term::Iri(NamedNode::new_unchecked("http://example.com/").into())),
                variable: var("bound"),
            },
            Pattern::Optional(GroupPattern::new(vec![triple("o", "optional")])),
            Pattern::SubSelect(Box::new(sub_query)),
        ]);
        assert_eq!(
            in_scope_variables(&group).into_iter().collect::<Vec<_>>(),
            [
                var("bound"),
                var("inner"),
                var("o"),
                var("optional"),
                var("s")
            ]
        );
    }

    #[test]
    fn test_find_all_variables() {
        let group = GroupPattern::new(vec![
            triple("s", "o"),
            Pattern::Filter(Expression::Term(var("filtered").into())),
            Pattern::Minus(GroupPattern::new(vec![triple("s", "minus")])),
        ]);
        let mut query = Query::select_all(group);
        query.modifiers.group_by = vec![GroupCondition::Bind {
            expression: Expression::Term(var("s").into()),
            variable: var("key"),
        }];
        let variables = find_all_variables(&Sparql::Query(query));
        for name in ["s", "o", "filtered", "minus", "key"] {
            assert!(variables.contains(&var(name)), "{name} not found");
        }
        assert_eq!(variables.len(), 5);
    }
}
