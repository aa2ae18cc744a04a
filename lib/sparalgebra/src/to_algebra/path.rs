use crate::algebra::{Operation, Pattern, PropertyPathSymbol};
use crate::error::AlgebraError;
use crate::syntax::{NegatedPath, PropertyPath};
use crate::term::TermPattern;
use crate::to_algebra::AlgebraContext;

impl AlgebraContext {
    pub(super) fn translate_path_predicate(
        &self,
        path: &PropertyPath,
    ) -> Result<PropertyPathSymbol, AlgebraError> {
        Ok(match path {
            PropertyPath::Iri(iri) => PropertyPathSymbol::link(self.named_node(iri)?),
            PropertyPath::Inverse(path) => {
                PropertyPathSymbol::inv(self.translate_path_predicate(path)?)
            }
            PropertyPath::Sequence(paths) => {
                PropertyPathSymbol::seq(self.translate_path_predicates(paths)?, true)?
            }
            PropertyPath::Alternative(paths) => {
                PropertyPathSymbol::alt(self.translate_path_predicates(paths)?, true)?
            }
            PropertyPath::ZeroOrMore(path) => {
                PropertyPathSymbol::zero_or_more(self.translate_path_predicate(path)?)
            }
            PropertyPath::OneOrMore(path) => {
                PropertyPathSymbol::one_or_more(self.translate_path_predicate(path)?)
            }
            PropertyPath::ZeroOrOne(path) => {
                PropertyPathSymbol::zero_or_one(self.translate_path_predicate(path)?)
            }
            PropertyPath::Negated(items) => {
                let mut normals = Vec::new();
                let mut inverted = Vec::new();
                for item in items {
                    match item {
                        NegatedPath::Iri(iri) => normals.push(self.named_node(iri)?),
                        NegatedPath::Inverse(iri) => inverted.push(self.named_node(iri)?),
                    }
                }
                if inverted.is_empty() {
                    PropertyPathSymbol::nps(normals)
                } else if normals.is_empty() {
                    PropertyPathSymbol::inv(PropertyPathSymbol::nps(inverted))
                } else {
                    PropertyPathSymbol::alt(
                        vec![
                            PropertyPathSymbol::nps(normals),
                            PropertyPathSymbol::inv(PropertyPathSymbol::nps(inverted)),
                        ],
                        false,
                    )?
                }
            }
        })
    }

    fn translate_path_predicates(
        &self,
        paths: &[PropertyPath],
    ) -> Result<Vec<PropertyPathSymbol>, AlgebraError> {
        paths
            .iter()
            .map(|path| self.translate_path_predicate(path))
            .collect()
    }

    /// Rewrites a path pattern into plain quad patterns where possible.
    ///
    /// A link becomes a quad pattern, an inverse path swaps its ends and a sequence is chained
    /// through fresh variables. Other paths are kept as [`Path`](Operation::Path) operators.
    pub(super) fn simplify_path(
        &mut self,
        subject: TermPattern,
        predicate: PropertyPathSymbol,
        object: TermPattern,
        output: &mut Vec<Operation>,
    ) {
        match predicate {
            PropertyPathSymbol::Link { iri, .. } => {
                output.push(Pattern::new(subject, iri, object, None).into())
            }
            PropertyPathSymbol::Inv { path, .. } => self.simplify_path(object, *path, subject, output),
            PropertyPathSymbol::Seq { mut input, metadata } => {
                let Some(last) = input.pop() else {
                    output.push(Operation::path(
                        subject,
                        PropertyPathSymbol::Seq { input, metadata },
                        object,
                        None,
                    ));
                    return;
                };
                let mut subject = subject;
                for step in input {
                    let joint = TermPattern::from(self.fresh_variable());
                    self.simplify_path(subject, step, joint.clone(), output);
                    subject = joint;
                }
                self.simplify_path(subject, last, object, output);
            }
            predicate => output.push(Operation::path(subject, predicate, object, None)),
        }
    }
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::TranslationOptions;
    use crate::syntax::{GroupPattern, Iri, Query, Sparql};
    use crate::term::{NamedNode, Variable};

    fn context() -> AlgebraContext {
        AlgebraContext::new(
            &Sparql::Query(Query::select_all(GroupPattern::default())),
            &TranslationOptions::new(),
        )
    }

    #[test]
    fn test_negated_property_sets() -> Result<(), Box<dyn std::error::Error>> {
        let context = context();
        let a = Iri::full("http://example.com/a");
        let b = Iri::full("http://example.com/b");
        assert_eq!(
            context
                .translate_path_predicate(&PropertyPath::Negated(vec![NegatedPath::Iri(a.clone())]))?
                .to_string(),
            "(notoneof <http://example.com/a>)"
        );
        assert_eq!(
            context
                .translate_path_predicate(&PropertyPath::Negated(vec![NegatedPath::Inverse(
                    b.clone()
                )]))?
                .to_string(),
            "(reverse (notoneof <http://example.com/b>))"
        );
        assert_eq!(
            context
                .translate_path_predicate(&PropertyPath::Negated(vec![
                    NegatedPath::Iri(a),
                    NegatedPath::Inverse(b),
                ]))?
                .to_string(),
            "(alt (notoneof <http://example.com/a>) (reverse (notoneof <http://example.com/b>)))"
        );
        Ok(())
    }

    #[test]
    fn test_inverse_sequence_is_reversed() -> Result<(), Box<dyn std::error::Error>> {
        let mut context = context();
        let p1 = NamedNode::new("http://example.com/p1")?;
        let p2 = NamedNode::new("http://example.com/p2")?;
        let path = PropertyPathSymbol::inv(PropertyPathSymbol::seq(
            vec![
                PropertyPathSymbol::link(p1.clone()),
                PropertyPathSymbol::link(p2.clone()),
            ],
            true,
        )?);
        let mut output = Vec::new();
        context.simplify_path(
            Variable::new("s")?.into(),
            path,
            Variable::new("o")?.into(),
            &mut output,
        );
        let joint = Variable::new("var0")?;
        assert_eq!(
            output,
            [
                Operation::from(Pattern::new(Variable::new("o")?, p1, joint.clone(), None)),
                Operation::from(Pattern::new(joint, p2, Variable::new("s")?, None)),
            ]
        );
        Ok(())
    }
}
