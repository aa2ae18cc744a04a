use crate::algebra::PropertyPathSymbol;
use crate::syntax::{Iri, NegatedPath, PropertyPath};

/// Writes a property path back, folding the negated property sets the algebra splits by
/// direction into a single `!(...)`.
pub(super) fn translate_path(path: &PropertyPathSymbol) -> PropertyPath {
    match path {
        PropertyPathSymbol::Alt { input, .. } => {
            let paths = input.iter().map(translate_path).collect::<Vec<_>>();
            if !paths.is_empty()
                && paths
                    .iter()
                    .all(|path| matches!(path, PropertyPath::Negated(_)))
            {
                PropertyPath::Negated(
                    paths
                        .into_iter()
                        .flat_map(|path| match path {
                            PropertyPath::Negated(items) => items,
                            _ => Vec::new(),
                        })
                        .collect(),
                )
            } else {
                PropertyPath::Alternative(paths)
            }
        }
        PropertyPathSymbol::Inv { path, .. } => match path.as_ref() {
            PropertyPathSymbol::Nps { iris, .. } => PropertyPath::Negated(
                iris.iter()
                    .map(|iri| NegatedPath::Inverse(Iri::from(iri.clone())))
                    .collect(),
            ),
            path => PropertyPath::Inverse(Box::new(translate_path(path))),
        },
        PropertyPathSymbol::Link { iri, .. } => PropertyPath::Iri(Iri::from(iri.clone())),
        PropertyPathSymbol::Nps { iris, .. } => PropertyPath::Negated(
            iris.iter()
                .map(|iri| NegatedPath::Iri(Iri::from(iri.clone())))
                .collect(),
        ),
        PropertyPathSymbol::OneOrMore { path, .. } => {
            PropertyPath::OneOrMore(Box::new(translate_path(path)))
        }
        PropertyPathSymbol::Seq { input, .. } => {
            PropertyPath::Sequence(input.iter().map(translate_path).collect())
        }
        PropertyPathSymbol::ZeroOrMore { path, .. } => {
            PropertyPath::ZeroOrMore(Box::new(translate_path(path)))
        }
        PropertyPathSymbol::ZeroOrOne { path, .. } => {
            PropertyPath::ZeroOrOne(Box::new(translate_path(path)))
        }
    }
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::term::NamedNode;

    #[test]
    fn test_negated_sets_are_merged() -> Result<(), Box<dyn std::error::Error>> {
        let a = NamedNode::new("http://example.com/a")?;
        let b = NamedNode::new("http://example.com/b")?;
        let path = PropertyPathSymbol::alt(
            vec![
                PropertyPathSymbol::nps(vec![a.clone()]),
                PropertyPathSymbol::inv(PropertyPathSymbol::nps(vec![b.clone()])),
            ],
            false,
        )?;
        assert_eq!(
            translate_path(&path),
            PropertyPath::Negated(vec![
                NegatedPath::Iri(Iri::from(a)),
                NegatedPath::Inverse(Iri::from(b)),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_alternative_of_links() -> Result<(), Box<dyn std::error::Error>> {
        let a = NamedNode::new("http://example.com/a")?;
        let b = NamedNode::new("http://example.com/b")?;
        let path = PropertyPathSymbol::alt(
            vec![
                PropertyPathSymbol::link(a.clone()),
                PropertyPathSymbol::one_or_more(PropertyPathSymbol::inv(
                    PropertyPathSymbol::link(b.clone()),
                )),
            ],
            true,
        )?;
        assert_eq!(
            translate_path(&path),
            PropertyPath::Alternative(vec![
                PropertyPath::Iri(Iri::from(a)),
                PropertyPath::OneOrMore(Box::new(PropertyPath::Inverse(Box::new(
                    PropertyPath::Iri(Iri::from(b))
                )))),
            ])
        );
        Ok(())
    }
}
