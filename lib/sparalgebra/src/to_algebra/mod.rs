//! Translation of a [syntax tree](crate::syntax) into the algebra.

mod aggregate;
mod graph;
mod path;
mod pattern;
mod update;

use crate::TranslationOptions;
use crate::algebra::Operation;
use crate::error::AlgebraError;
use crate::syntax::{self, DatasetClause, Declaration, LiteralTerm, Sparql, find_all_variables};
use crate::term::*;
use oxiri::Iri;
use std::collections::{HashMap, HashSet};
use tracing::trace;

pub(crate) fn translate(
    sparql: &Sparql,
    options: &TranslationOptions,
) -> Result<Operation, AlgebraError> {
    let mut context = AlgebraContext::new(sparql, options);
    let op = match sparql {
        Sparql::Query(query) => context.translate_query(query)?,
        Sparql::Update(update) => context.translate_update(update)?,
    };
    if options.blank_to_variable {
        graph::promote_blank_nodes(&mut context, op)
    } else {
        Ok(op)
    }
}

/// The state of one translation call.
pub(crate) struct AlgebraContext {
    /// Names that are taken, seeded with every variable of the request.
    variables: HashSet<String>,
    var_count: usize,
    quads: bool,
    sparql_star: bool,
    base_iri: Option<Iri<String>>,
    prefixes: HashMap<String, String>,
}

impl AlgebraContext {
    fn new(sparql: &Sparql, options: &TranslationOptions) -> Self {
        Self {
            variables: find_all_variables(sparql)
                .into_iter()
                .map(Variable::into_string)
                .collect(),
            var_count: 0,
            quads: options.quads,
            sparql_star: options.sparql_star,
            base_iri: options.base_iri.clone(),
            prefixes: options.prefixes.clone(),
        }
    }

    /// A variable named `var<n>` that occurs nowhere in the request nor has been generated before.
    pub(crate) fn fresh_variable(&mut self) -> Variable {
        loop {
            let name = format!("var{}", self.var_count);
            self.var_count += 1;
            if self.variables.insert(name.clone()) {
                trace!(variable = name, "fresh variable generated");
                return Variable::new_unchecked(name);
            }
        }
    }

    /// A new variable named after `label`, suffixed with a counter if the name is taken.
    fn unique_variable(&mut self, label: &str) -> Variable {
        if self.variables.insert(label.to_owned()) {
            return Variable::new_unchecked(label);
        }
        let mut counter = 0;
        loop {
            let name = format!("{label}{counter}");
            counter += 1;
            if self.variables.insert(name.clone()) {
                return Variable::new_unchecked(name);
            }
        }
    }

    fn register_prologue(&mut self, prologue: &[Declaration]) -> Result<(), AlgebraError> {
        for declaration in prologue {
            match declaration {
                Declaration::Base(iri) => self.base_iri = Some(self.resolve(iri)?),
                Declaration::Prefix { prefix, iri } => {
                    let iri = self.resolve(iri)?;
                    self.prefixes.insert(prefix.clone(), iri.into_inner());
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, iri: &syntax::Iri) -> Result<Iri<String>, AlgebraError> {
        let iri = match iri {
            syntax::Iri::Full(iri) => iri.clone(),
            syntax::Iri::Prefixed { prefix, local } => {
                let Some(start) = self.prefixes.get(prefix) else {
                    return Err(AlgebraError::unknown_prefix(prefix.clone()));
                };
                format!("{start}{local}")
            }
        };
        let resolved = if let Some(base_iri) = &self.base_iri {
            base_iri.resolve(&iri)
        } else {
            Iri::parse(iri.clone())
        };
        resolved.map_err(|error| AlgebraError::invalid_iri(iri, error))
    }

    fn named_node(&self, iri: &syntax::Iri) -> Result<NamedNode, AlgebraError> {
        Ok(NamedNode::new_unchecked(self.resolve(iri)?.into_inner()))
    }

    fn literal(&self, literal: &LiteralTerm) -> Result<Literal, AlgebraError> {
        Ok(match literal {
            LiteralTerm::Simple(value) => Literal::new_simple_literal(value),
            LiteralTerm::LanguageTagged { value, language } => {
                Literal::new_language_tagged_literal_unchecked(value, language.to_ascii_lowercase())
            }
            LiteralTerm::Typed { value, datatype } => {
                Literal::new_typed_literal(value, self.named_node(datatype)?)
            }
        })
    }

    fn term(&self, term: &syntax::Term) -> Result<TermPattern, AlgebraError> {
        Ok(match term {
            syntax::Term::Iri(iri) => self.named_node(iri)?.into(),
            syntax::Term::BlankNode(node) => node.clone().into(),
            syntax::Term::Literal(literal) => self.literal(literal)?.into(),
            syntax::Term::Variable(variable) => variable.clone().into(),
            syntax::Term::Triple(triple) => {
                if !self.sparql_star {
                    return Err(AlgebraError::unsupported(
                        "Quoted triples are only supported with the SPARQL-star option enabled",
                    ));
                }
                TriplePattern {
                    subject: self.term(&triple.subject)?,
                    predicate: self.named_node_pattern(&triple.predicate)?,
                    object: self.term(&triple.object)?,
                }
                .into()
            }
        })
    }

    fn named_node_pattern(&self, term: &syntax::Term) -> Result<NamedNodePattern, AlgebraError> {
        match term {
            syntax::Term::Iri(iri) => Ok(self.named_node(iri)?.into()),
            syntax::Term::Variable(variable) => Ok(variable.clone().into()),
            _ => Err(AlgebraError::unsupported(
                "Only IRIs and variables are allowed as predicates and graph names",
            )),
        }
    }

    fn ground_term(&self, term: &syntax::Term) -> Result<GroundTerm, AlgebraError> {
        match term {
            syntax::Term::Iri(iri) => Ok(self.named_node(iri)?.into()),
            syntax::Term::Literal(literal) => Ok(self.literal(literal)?.into()),
            _ => Err(AlgebraError::unsupported(
                "Only IRIs and literals are allowed in VALUES",
            )),
        }
    }

    /// The default and named graphs of `FROM` or `USING` clauses.
    fn dataset(
        &self,
        clauses: &[DatasetClause],
    ) -> Result<(Vec<NamedNode>, Vec<NamedNode>), AlgebraError> {
        let mut default = Vec::new();
        let mut named = Vec::new();
        for clause in clauses {
            match clause {
                DatasetClause::Default(iri) => default.push(self.named_node(iri)?),
                DatasetClause::Named(iri) => named.push(self.named_node(iri)?),
            }
        }
        Ok((default, named))
    }
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::syntax::{GroupPattern, Pattern, Query, Triple};

    fn context(sparql: &Sparql) -> AlgebraContext {
        AlgebraContext::new(sparql, &TranslationOptions::new())
    }

    #[test]
    fn test_fresh_variables_avoid_request_variables() -> Result<(), Box<dyn std::error::Error>> {
        let query = Query::select_all(GroupPattern::new(vec![Pattern::Bgp(vec![
            Triple::new(
                Variable::new("var0")?,
                syntax::Iri::full("http://example.com/p"),
                Variable::new("var2")?,
            )
            .into(),
        ])]));
        let mut context = context(&Sparql::Query(query));
        let generated = (0..5)
            .map(|_| context.fresh_variable())
            .collect::<HashSet<_>>();
        assert_eq!(generated.len(), 5);
        assert!(!generated.contains(&Variable::new("var0")?));
        assert!(!generated.contains(&Variable::new("var2")?));
        assert!(generated.contains(&Variable::new("var1")?));
        Ok(())
    }

    #[test]
    fn test_unique_variable_suffixes_taken_names() -> Result<(), Box<dyn std::error::Error>> {
        let query = Query::select_all(GroupPattern::new(vec![Pattern::Bgp(vec![
            Triple::new(
                Variable::new("b")?,
                syntax::Iri::full("http://example.com/p"),
                Variable::new("b0")?,
            )
            .into(),
        ])]));
        let mut context = context(&Sparql::Query(query));
        assert_eq!(context.unique_variable("b"), Variable::new("b1")?);
        assert_eq!(context.unique_variable("c"), Variable::new("c")?);
        assert_eq!(context.unique_variable("c"), Variable::new("c0")?);
        Ok(())
    }

    #[test]
    fn test_prologue_resolution() -> Result<(), Box<dyn std::error::Error>> {
        let mut context = context(&Sparql::Query(Query::select_all(GroupPattern::default())));
        context.register_prologue(&[
            Declaration::Base(syntax::Iri::full("http://example.com/base/")),
            Declaration::Prefix {
                prefix: "ex".into(),
                iri: syntax::Iri::full("ns#"),
            },
        ])?;
        assert_eq!(
            context.named_node(&syntax::Iri::prefixed("ex", "foo"))?,
            NamedNode::new("http://example.com/base/ns#foo")?
        );
        assert_eq!(
            context.named_node(&syntax::Iri::full("../bar"))?,
            NamedNode::new("http://example.com/bar")?
        );
        let error = context
            .named_node(&syntax::Iri::prefixed("foaf", "name"))
            .unwrap_err();
        assert!(error.is_unsupported());
        assert_eq!(error.to_string(), "The prefix foaf: has not been declared");
        Ok(())
    }
}
