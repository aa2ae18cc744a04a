use oxiri::{Iri, IriParseError};
use std::collections::HashMap;

/// Options of the [`to_algebra`](crate::to_algebra) translation.
///
/// ```
/// use sparalgebra::TranslationOptions;
///
/// let _options = TranslationOptions::new()
///     .with_quads()
///     .with_base_iri("http://example.com/")?
///     .with_prefix("ex", "http://example.com/ns#")?;
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[must_use]
#[derive(Clone, Default, Debug)]
pub struct TranslationOptions {
    pub(crate) quads: bool,
    pub(crate) sparql_star: bool,
    pub(crate) blank_to_variable: bool,
    pub(crate) base_iri: Option<Iri<String>>,
    pub(crate) prefixes: HashMap<String, String>,
}

impl TranslationOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches graph names to the quad patterns themselves instead of wrapping them into
    /// [`Graph`](crate::algebra::Operation::Graph) operators.
    ///
    /// It is required to translate `INSERT`/`DELETE` operations.
    #[inline]
    pub fn with_quads(mut self) -> Self {
        self.quads = true;
        self
    }

    /// Accepts quoted triples `<< s p o >>` in patterns.
    #[inline]
    pub fn with_sparql_star(mut self) -> Self {
        self.sparql_star = true;
        self
    }

    /// Replaces the blank nodes of the graph patterns by fresh variables.
    ///
    /// Blank nodes of `CONSTRUCT` and `INSERT`/`DELETE` templates are kept.
    #[inline]
    pub fn with_blank_to_variable(mut self) -> Self {
        self.blank_to_variable = true;
        self
    }

    /// Provides an IRI that could be used to resolve the relative IRIs of the syntax tree.
    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base_iri = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Set a default IRI prefix, the prologue of the request may override it.
    #[inline]
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.prefixes.insert(
            prefix_name.into(),
            Iri::parse(prefix_iri.into())?.into_inner(),
        );
        Ok(self)
    }
}
