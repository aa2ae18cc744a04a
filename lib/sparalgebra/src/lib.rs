#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![doc(test(attr(deny(warnings))))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

pub mod algebra;
mod error;
mod options;
pub mod syntax;
pub mod term;
mod to_algebra;
mod to_syntax;
pub mod tree;

pub use crate::error::AlgebraError;
pub use crate::options::TranslationOptions;
use crate::algebra::Operation;
use crate::syntax::Sparql;
use tracing::debug;

/// Translates a SPARQL syntax tree into the algebra.
///
/// ```
/// use sparalgebra::syntax::{GroupPattern, Iri, Pattern, Query, Sparql, Triple};
/// use sparalgebra::term::Variable;
/// use sparalgebra::{to_algebra, TranslationOptions};
///
/// let query = Query::select_all(GroupPattern::new(vec![Pattern::Bgp(vec![
///     Triple::new(Variable::new("s")?, Iri::full("http://example.com/p"), Variable::new("o")?).into(),
/// ])]));
/// let op = to_algebra(&Sparql::Query(query), &TranslationOptions::new())?;
/// assert_eq!(
///     op.to_string(),
///     "(project (?o ?s) (bgp (triple ?s <http://example.com/p> ?o)))"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn to_algebra(
    sparql: &Sparql,
    options: &TranslationOptions,
) -> Result<Operation, AlgebraError> {
    debug!(
        quads = options.quads,
        sparql_star = options.sparql_star,
        blank_to_variable = options.blank_to_variable,
        "translating syntax tree to algebra"
    );
    let op = to_algebra::translate(sparql, options)?;
    debug!(operation = ?op.node_type(), "syntax tree translated");
    Ok(op)
}

/// Translates an algebra operation back into a SPARQL syntax tree.
///
/// Graph names attached to quad patterns are turned back into `GRAPH` blocks, so both the
/// output of the quads mode and of the default mode of [`to_algebra`] are accepted.
pub fn to_syntax(op: &Operation) -> Result<Sparql, AlgebraError> {
    debug!(operation = ?op.node_type(), "translating algebra to syntax tree");
    let sparql = to_syntax::translate(op)?;
    debug!(
        update = matches!(sparql, Sparql::Update(_)),
        "algebra translated"
    );
    Ok(sparql)
}
