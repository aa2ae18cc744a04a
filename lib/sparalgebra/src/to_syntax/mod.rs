//! Translation of the algebra back into a [syntax tree](crate::syntax).

mod expression;
mod path;
mod pattern;
mod quads;
mod query;
mod update;

use crate::algebra::{BoundAggregate, Expression, Operation};
use crate::error::AlgebraError;
use crate::syntax::{
    self, GroupPattern, Iri, LiteralTerm, Query, QuotedTriple, Sparql, UpdateOperation, UpdateUnit,
};
use crate::term::*;
use oxrdf::vocab::xsd;

pub(crate) fn translate(op: &Operation) -> Result<Sparql, AlgebraError> {
    let op = quads::remove_quads(op.clone())?;
    let mut context = SyntaxContext::default();
    if op.is_update() {
        let Translated::Update(operations) = context.translate_operation(&op)? else {
            return Err(AlgebraError::unexpected_node("update", "query"));
        };
        Ok(Sparql::Update(syntax::Update {
            operations: operations.into_iter().map(UpdateUnit::from).collect(),
        }))
    } else {
        Ok(Sparql::Query(*context.translate_query(&op)?))
    }
}

/// What an operation turns into.
enum Translated {
    /// Members of a group graph pattern.
    Patterns(Vec<syntax::Pattern>),
    Query(Box<Query>),
    Update(Vec<UpdateOperation>),
}

/// The state of one translation call.
#[derive(Default)]
struct SyntaxContext {
    /// Set right below a projection: its extensions become `SELECT` expressions.
    project: bool,
    /// What the operators between a query form and its `WHERE` clause contribute.
    modifiers: QueryModifiers,
}

#[derive(Default)]
struct QueryModifiers {
    extend: Vec<(Variable, Expression)>,
    group: Vec<Variable>,
    aggregates: Vec<BoundAggregate>,
    order: Vec<Expression>,
}

impl SyntaxContext {
    fn translate_patterns(&mut self, op: &Operation) -> Result<Vec<syntax::Pattern>, AlgebraError> {
        match self.translate_operation(op)? {
            Translated::Patterns(patterns) => Ok(patterns),
            Translated::Query(query) => Ok(vec![syntax::Pattern::SubSelect(query)]),
            Translated::Update(_) => {
                Err(AlgebraError::unexpected_node("graph pattern", op.node_type()))
            }
        }
    }

    fn translate_group(&mut self, op: &Operation) -> Result<GroupPattern, AlgebraError> {
        Ok(group_pattern(self.translate_patterns(op)?))
    }
}

/// Groups `patterns`, without nesting when they are a single group already.
fn group_pattern(patterns: Vec<syntax::Pattern>) -> GroupPattern {
    match <[_; 1]>::try_from(patterns) {
        Ok([syntax::Pattern::Group(group)]) => group,
        Ok([pattern]) => GroupPattern::new(vec![pattern]),
        Err(patterns) => GroupPattern::new(patterns),
    }
}

fn term(term: &TermPattern) -> syntax::Term {
    match term {
        TermPattern::NamedNode(node) => Iri::from(node.clone()).into(),
        TermPattern::BlankNode(node) => node.clone().into(),
        TermPattern::Literal(literal) => literal_term(literal).into(),
        TermPattern::Variable(variable) => variable.clone().into(),
        TermPattern::Triple(triple) => syntax::Term::Triple(Box::new(QuotedTriple {
            subject: self::term(&triple.subject),
            predicate: named_node_pattern(&triple.predicate),
            object: self::term(&triple.object),
        })),
    }
}

fn named_node_pattern(term: &NamedNodePattern) -> syntax::Term {
    match term {
        NamedNodePattern::NamedNode(node) => Iri::from(node.clone()).into(),
        NamedNodePattern::Variable(variable) => variable.clone().into(),
    }
}

fn ground_term(term: &GroundTerm) -> syntax::Term {
    match term {
        GroundTerm::NamedNode(node) => Iri::from(node.clone()).into(),
        GroundTerm::Literal(literal) => literal_term(literal).into(),
    }
}

/// `xsd:string` literals are written without datatype.
fn literal_term(literal: &Literal) -> LiteralTerm {
    if let Some(language) = literal.language() {
        LiteralTerm::LanguageTagged {
            value: literal.value().to_owned(),
            language: language.to_owned(),
        }
    } else if literal.datatype() == xsd::STRING {
        LiteralTerm::Simple(literal.value().to_owned())
    } else {
        LiteralTerm::Typed {
            value: literal.value().to_owned(),
            datatype: Iri::full(literal.datatype().as_str()),
        }
    }
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::algebra::Pattern;
    use crate::syntax::{Projection, QueryForm, Triple};

    #[test]
    fn test_literals() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            literal_term(&Literal::new_simple_literal("foo")),
            LiteralTerm::Simple("foo".into())
        );
        assert_eq!(
            literal_term(&Literal::new_language_tagged_literal_unchecked("chat", "fr")),
            LiteralTerm::LanguageTagged {
                value: "chat".into(),
                language: "fr".into()
            }
        );
        assert_eq!(
            literal_term(&Literal::new_typed_literal("1", xsd::INTEGER)),
            LiteralTerm::Typed {
                value: "1".into(),
                datatype: Iri::full("http://www.w3.org/2001/XMLSchema#integer")
            }
        );
        Ok(())
    }

    #[test]
    fn test_single_group_is_not_nested() {
        let inner = GroupPattern::new(vec![syntax::Pattern::Filter(
            syntax::Term::Variable(Variable::new_unchecked("x")).into(),
        )]);
        assert_eq!(
            group_pattern(vec![syntax::Pattern::Group(inner.clone())]),
            inner
        );
    }

    #[test]
    fn test_bare_pattern_becomes_select_all() -> Result<(), Box<dyn std::error::Error>> {
        let s = Variable::new("s")?;
        let p = NamedNode::new("http://example.com/p")?;
        let o = Variable::new("o")?;
        let Sparql::Query(query) = translate(&Operation::bgp(vec![Pattern::new(
            s.clone(),
            p.clone(),
            o.clone(),
            None,
        )]))?
        else {
            return Err("a query was expected".into());
        };
        assert_eq!(
            query.form,
            QueryForm::Select {
                distinct: false,
                reduced: false,
                projection: Projection::Wildcard
            }
        );
        assert_eq!(
            query.where_clause,
            Some(GroupPattern::new(vec![syntax::Pattern::Bgp(vec![
                Triple::new(s, Iri::from(p), o).into()
            ])]))
        );
        Ok(())
    }
}
