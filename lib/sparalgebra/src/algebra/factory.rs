//! Constructors of the algebra nodes.
//!
//! They are the only way the translators build nodes: n-ary associative operators are flattened
//! here and a [`Path`] always gets an explicit graph name.

use crate::algebra::*;
use crate::error::AlgebraError;

impl Operation {
    #[inline]
    pub fn ask(input: Self) -> Self {
        Self::Ask(Ask {
            input: Box::new(input),
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn bgp(patterns: Vec<Pattern>) -> Self {
        Self::Bgp(Bgp {
            patterns,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn composite_update(updates: Vec<Update>) -> Self {
        Self::CompositeUpdate(CompositeUpdate {
            updates,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn construct(input: Self, template: Vec<Pattern>) -> Self {
        Self::Construct(Construct {
            input: Box::new(input),
            template,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn describe(input: Self, terms: Vec<NamedNodePattern>) -> Self {
        Self::Describe(Describe {
            input: Box::new(input),
            terms,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn distinct(input: Self) -> Self {
        Self::Distinct(Distinct {
            input: Box::new(input),
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn extend(input: Self, variable: Variable, expression: Expression) -> Self {
        Self::Extend(Extend {
            input: Box::new(input),
            variable,
            expression,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn filter(input: Self, expression: Expression) -> Self {
        Self::Filter(Filter {
            input: Box::new(input),
            expression,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn from_dataset(input: Self, default: Vec<NamedNode>, named: Vec<NamedNode>) -> Self {
        Self::From(FromDataset {
            input: Box::new(input),
            default,
            named,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn graph(input: Self, name: impl Into<NamedNodePattern>) -> Self {
        Self::Graph(Graph {
            input: Box::new(input),
            name: name.into(),
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn group(input: Self, variables: Vec<Variable>, aggregates: Vec<BoundAggregate>) -> Self {
        Self::Group(Group {
            input: Box::new(input),
            variables,
            aggregates,
            metadata: Metadata::new(),
        })
    }

    /// Builds an n-ary join.
    ///
    /// With `flatten`, the inputs that are joins themselves are replaced by their own inputs.
    pub fn join(input: Vec<Self>, flatten: bool) -> Result<Self, AlgebraError> {
        if input.is_empty() {
            return Err(AlgebraError::arity("join", "at least one input", 0));
        }
        let input = if flatten {
            flatten_operations(input, |op| match op {
                Self::Join(join) => Ok(join.input),
                op => Err(op),
            })
        } else {
            input
        };
        Ok(Self::Join(Join {
            input,
            metadata: Metadata::new(),
        }))
    }

    #[inline]
    pub fn left_join(left: Self, right: Self, expression: Option<Expression>) -> Self {
        Self::LeftJoin(LeftJoin {
            input: Box::new([left, right]),
            expression,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn minus(left: Self, right: Self) -> Self {
        Self::Minus(Minus {
            input: Box::new([left, right]),
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn nop() -> Self {
        Self::Nop(Nop::default())
    }

    #[inline]
    pub fn order_by(input: Self, expressions: Vec<Expression>) -> Self {
        Self::OrderBy(OrderBy {
            input: Box::new(input),
            expressions,
            metadata: Metadata::new(),
        })
    }

    /// Builds a property path pattern, in the default graph if `graph` is `None`.
    #[inline]
    pub fn path(
        subject: impl Into<TermPattern>,
        predicate: PropertyPathSymbol,
        object: impl Into<TermPattern>,
        graph: Option<GraphNamePattern>,
    ) -> Self {
        Self::Path(Path {
            subject: subject.into(),
            predicate,
            object: object.into(),
            graph: graph.unwrap_or_default(),
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn project(input: Self, variables: Vec<Variable>) -> Self {
        Self::Project(Project {
            input: Box::new(input),
            variables,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn reduced(input: Self) -> Self {
        Self::Reduced(Reduced {
            input: Box::new(input),
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn service(input: Self, name: impl Into<NamedNodePattern>, silent: bool) -> Self {
        Self::Service(Service {
            input: Box::new(input),
            name: name.into(),
            silent,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn slice(input: Self, start: usize, length: Option<usize>) -> Self {
        Self::Slice(Slice {
            input: Box::new(input),
            start,
            length,
            metadata: Metadata::new(),
        })
    }

    /// Builds an n-ary union, flattening nested unions if asked to.
    pub fn union(input: Vec<Self>, flatten: bool) -> Result<Self, AlgebraError> {
        if input.is_empty() {
            return Err(AlgebraError::arity("union", "at least one input", 0));
        }
        let input = if flatten {
            flatten_operations(input, |op| match op {
                Self::Union(union) => Ok(union.input),
                op => Err(op),
            })
        } else {
            input
        };
        Ok(Self::Union(Union {
            input,
            metadata: Metadata::new(),
        }))
    }

    #[inline]
    pub fn values(
        variables: Vec<Variable>,
        bindings: Vec<BTreeMap<Variable, GroundTerm>>,
    ) -> Self {
        Self::Values(Values {
            variables,
            bindings,
            metadata: Metadata::new(),
        })
    }
}

/// Splices the children `split` extracts from an element in place of that element.
fn flatten_operations<T>(input: Vec<T>, split: impl Fn(T) -> Result<Vec<T>, T>) -> Vec<T> {
    let mut output = Vec::with_capacity(input.len());
    for element in input {
        match split(element) {
            Ok(children) => output.extend(children),
            Err(element) => output.push(element),
        }
    }
    output
}

impl Pattern {
    /// Builds a quad pattern, in the default graph if `graph` is `None`.
    #[inline]
    pub fn new(
        subject: impl Into<TermPattern>,
        predicate: impl Into<NamedNodePattern>,
        object: impl Into<TermPattern>,
        graph: Option<GraphNamePattern>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: graph.unwrap_or_default(),
            metadata: Metadata::new(),
        }
    }
}

impl Expression {
    #[inline]
    pub fn aggregate(
        aggregator: Aggregator,
        distinct: bool,
        expression: Self,
        separator: Option<String>,
    ) -> Self {
        Self::Aggregate(AggregateExpression::new(
            aggregator, distinct, expression, separator,
        ))
    }

    #[inline]
    pub fn existence(not: bool, input: Operation) -> Self {
        Self::Existence {
            not,
            input: Box::new(input),
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn named(name: NamedNode, args: Vec<Self>) -> Self {
        Self::Named {
            name,
            args,
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn operator(operator: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Operator {
            operator: operator.into(),
            args,
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn term(term: impl Into<TermPattern>) -> Self {
        Self::Term {
            term: term.into(),
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn wildcard() -> Self {
        Self::Wildcard {
            metadata: Metadata::new(),
        }
    }
}

impl AggregateExpression {
    #[inline]
    pub fn new(
        aggregator: Aggregator,
        distinct: bool,
        expression: Expression,
        separator: Option<String>,
    ) -> Self {
        Self {
            aggregator,
            distinct,
            expression: Box::new(expression),
            separator,
            metadata: Metadata::new(),
        }
    }
}

impl BoundAggregate {
    #[inline]
    pub fn new(variable: Variable, aggregate: AggregateExpression) -> Self {
        Self {
            variable,
            aggregate,
        }
    }
}

impl PropertyPathSymbol {
    /// Builds an alternative, flattening nested alternatives if asked to.
    pub fn alt(input: Vec<Self>, flatten: bool) -> Result<Self, AlgebraError> {
        if input.is_empty() {
            return Err(AlgebraError::arity("alt", "at least one input", 0));
        }
        let input = if flatten {
            flatten_operations(input, |path| match path {
                Self::Alt { input, .. } => Ok(input),
                path => Err(path),
            })
        } else {
            input
        };
        Ok(Self::Alt {
            input,
            metadata: Metadata::new(),
        })
    }

    /// Builds a sequence, flattening nested sequences if asked to.
    pub fn seq(input: Vec<Self>, flatten: bool) -> Result<Self, AlgebraError> {
        if input.is_empty() {
            return Err(AlgebraError::arity("seq", "at least one input", 0));
        }
        let input = if flatten {
            flatten_operations(input, |path| match path {
                Self::Seq { input, .. } => Ok(input),
                path => Err(path),
            })
        } else {
            input
        };
        Ok(Self::Seq {
            input,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn inv(path: Self) -> Self {
        Self::Inv {
            path: Box::new(path),
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn link(iri: NamedNode) -> Self {
        Self::Link {
            iri,
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn nps(iris: Vec<NamedNode>) -> Self {
        Self::Nps {
            iris,
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn one_or_more(path: Self) -> Self {
        Self::OneOrMore {
            path: Box::new(path),
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn zero_or_more(path: Self) -> Self {
        Self::ZeroOrMore {
            path: Box::new(path),
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn zero_or_one(path: Self) -> Self {
        Self::ZeroOrOne {
            path: Box::new(path),
            metadata: Metadata::new(),
        }
    }
}

impl Update {
    #[inline]
    pub fn delete_insert(
        delete: Vec<Pattern>,
        insert: Vec<Pattern>,
        pattern: Option<Operation>,
    ) -> Self {
        Self::DeleteInsert(DeleteInsert {
            delete,
            insert,
            pattern: pattern.map(Box::new),
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn load(source: NamedNode, destination: Option<NamedNode>, silent: bool) -> Self {
        Self::Load(Load {
            source,
            destination,
            silent,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn clear_graph(target: GraphTarget, silent: bool) -> Self {
        Self::Clear(GraphManagement {
            target,
            silent,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn create_graph(graph: NamedNode, silent: bool) -> Self {
        Self::Create(CreateGraph {
            graph,
            silent,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn drop_graph(target: GraphTarget, silent: bool) -> Self {
        Self::Drop(GraphManagement {
            target,
            silent,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn add_graph(source: GraphName, destination: GraphName, silent: bool) -> Self {
        Self::Add(GraphTransfer {
            source,
            destination,
            silent,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn move_graph(source: GraphName, destination: GraphName, silent: bool) -> Self {
        Self::Move(GraphTransfer {
            source,
            destination,
            silent,
            metadata: Metadata::new(),
        })
    }

    #[inline]
    pub fn copy_graph(source: GraphName, destination: GraphName, silent: bool) -> Self {
        Self::Copy(GraphTransfer {
            source,
            destination,
            silent,
            metadata: Metadata::new(),
        })
    }
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;

    fn triple(s: &str, o: &str) -> Result<Operation, Box<dyn std::error::Error>> {
        Ok(Operation::bgp(vec![Pattern::new(
            Variable::new(s)?,
            NamedNode::new("http://example.com/p")?,
            Variable::new(o)?,
            None,
        )]))
    }

    #[test]
    fn test_join_flattening() -> Result<(), Box<dyn std::error::Error>> {
        let (a, b, c) = (triple("a", "b")?, triple("b", "c")?, triple("c", "d")?);
        let nested = Operation::join(
            vec![Operation::join(vec![a.clone(), b.clone()], true)?, c.clone()],
            true,
        )?;
        assert_eq!(nested, Operation::join(vec![a.clone(), b.clone(), c.clone()], true)?);

        let kept = Operation::join(vec![Operation::join(vec![a, b], true)?, c], false)?;
        let Operation::Join(join) = kept else {
            panic!("join expected")
        };
        assert_eq!(join.input.len(), 2);
        Ok(())
    }

    #[test]
    fn test_union_only_flattens_unions() -> Result<(), Box<dyn std::error::Error>> {
        let (a, b, c) = (triple("a", "b")?, triple("b", "c")?, triple("c", "d")?);
        let union = Operation::union(
            vec![Operation::join(vec![a.clone(), b.clone()], true)?, Operation::union(vec![c], true)?],
            true,
        )?;
        let Operation::Union(union) = union else {
            panic!("union expected")
        };
        assert_eq!(union.input.len(), 2);
        assert!(matches!(union.input[0], Operation::Join(_)));
        Ok(())
    }

    #[test]
    fn test_empty_associative_inputs_are_rejected() {
        let error = Operation::join(Vec::new(), true).unwrap_err();
        assert!(error.is_arity_error());
        assert_eq!(
            error.to_string(),
            "The join operator expects at least one input but 0 were given"
        );
        assert!(Operation::union(Vec::new(), true).unwrap_err().is_arity_error());
        assert!(PropertyPathSymbol::alt(Vec::new(), true).unwrap_err().is_arity_error());
        assert!(PropertyPathSymbol::seq(Vec::new(), false).unwrap_err().is_arity_error());
    }

    #[test]
    fn test_path_flattening() -> Result<(), Box<dyn std::error::Error>> {
        let p = PropertyPathSymbol::link(NamedNode::new("http://example.com/p")?);
        let q = PropertyPathSymbol::link(NamedNode::new("http://example.com/q")?);
        let seq = PropertyPathSymbol::seq(
            vec![
                PropertyPathSymbol::seq(vec![p.clone(), q.clone()], true)?,
                PropertyPathSymbol::alt(vec![p.clone(), q.clone()], true)?,
            ],
            true,
        )?;
        let PropertyPathSymbol::Seq { input, .. } = &seq else {
            panic!("seq expected")
        };
        assert_eq!(input.len(), 3);
        assert_eq!(
            seq.to_string(),
            "(seq <http://example.com/p> <http://example.com/q> (alt <http://example.com/p> <http://example.com/q>))"
        );
        Ok(())
    }

    #[test]
    fn test_path_defaults_to_default_graph() -> Result<(), Box<dyn std::error::Error>> {
        let path = Operation::path(
            Variable::new("s")?,
            PropertyPathSymbol::zero_or_more(PropertyPathSymbol::link(NamedNode::new(
                "http://ex/p",
            )?)),
            Variable::new("o")?,
            None,
        );
        let Operation::Path(path) = path else {
            panic!("path expected")
        };
        assert_eq!(path.graph, GraphNamePattern::DefaultGraph);
        Ok(())
    }

    #[test]
    fn test_sse_formatting() -> Result<(), Box<dyn std::error::Error>> {
        let op = Operation::slice(
            Operation::project(
                Operation::left_join(
                    triple("s", "o")?,
                    triple("o", "x")?,
                    Some(Expression::operator(
                        "bound",
                        vec![Expression::term(Variable::new("x")?)],
                    )),
                ),
                vec![Variable::new("s")?],
            ),
            0,
            Some(10),
        );
        assert_eq!(
            op.to_string(),
            "(slice 0 10 (project (?s) (leftjoin (bgp (triple ?s <http://example.com/p> ?o)) (bgp (triple ?o <http://example.com/p> ?x)) (bound ?x))))"
        );
        let update = Operation::from(Update::clear_graph(GraphTarget::AllGraphs, true));
        assert_eq!(update.to_string(), "(clear silent ALL)");
        Ok(())
    }
}
