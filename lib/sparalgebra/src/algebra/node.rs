//! Binding of the algebra to the [tree engine](crate::tree).

use crate::algebra::*;
use crate::error::AlgebraError;
use crate::tree::{Rebuild, Tagged, Walk};
use std::fmt;

/// The discriminant of an algebra node.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum NodeType {
    Ask,
    Bgp,
    CompositeUpdate,
    Construct,
    Describe,
    Distinct,
    Expression,
    Extend,
    Filter,
    From,
    Graph,
    Group,
    Join,
    LeftJoin,
    Minus,
    Nop,
    OrderBy,
    Path,
    Pattern,
    Project,
    PropertyPathSymbol,
    Reduced,
    Service,
    Slice,
    Union,
    Update,
    Values,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ask => "ask",
            Self::Bgp => "bgp",
            Self::CompositeUpdate => "sequence",
            Self::Construct => "construct",
            Self::Describe => "describe",
            Self::Distinct => "distinct",
            Self::Expression => "expression",
            Self::Extend => "extend",
            Self::Filter => "filter",
            Self::From => "dataset",
            Self::Graph => "graph",
            Self::Group => "group",
            Self::Join => "join",
            Self::LeftJoin => "leftjoin",
            Self::Minus => "minus",
            Self::Nop => "null",
            Self::OrderBy => "order",
            Self::Path => "path",
            Self::Pattern => "quad",
            Self::Project => "project",
            Self::PropertyPathSymbol => "path expression",
            Self::Reduced => "reduced",
            Self::Service => "service",
            Self::Slice => "slice",
            Self::Union => "union",
            Self::Update => "update",
            Self::Values => "table",
        })
    }
}

/// The sub-discriminant of the [`Expression`](NodeType::Expression),
/// [`PropertyPathSymbol`](NodeType::PropertyPathSymbol) and [`Update`](NodeType::Update) nodes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum NodeSubType {
    Aggregate,
    BoundAggregate,
    Existence,
    Named,
    Operator,
    Term,
    Wildcard,
    Alt,
    Inv,
    Link,
    Nps,
    OneOrMore,
    Seq,
    ZeroOrMore,
    ZeroOrOne,
    DeleteInsert,
    Load,
    Clear,
    Create,
    Drop,
    Add,
    Move,
    Copy,
}

/// A borrowed algebra node of any family.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Operation(&'a Operation),
    Pattern(&'a Pattern),
    Expression(&'a Expression),
    BoundAggregate(&'a BoundAggregate),
    Path(&'a PropertyPathSymbol),
    Update(&'a Update),
}

impl<'a> From<&'a Operation> for NodeRef<'a> {
    #[inline]
    fn from(op: &'a Operation) -> Self {
        match op {
            Operation::Pattern(pattern) => Self::Pattern(pattern),
            Operation::Update(update) => Self::Update(update),
            op => Self::Operation(op),
        }
    }
}

impl<'a> From<&'a AnyNode> for NodeRef<'a> {
    #[inline]
    fn from(node: &'a AnyNode) -> Self {
        match node {
            AnyNode::Operation(op) => op.into(),
            AnyNode::Pattern(pattern) => Self::Pattern(pattern),
            AnyNode::Expression(expression) => Self::Expression(expression),
            AnyNode::BoundAggregate(aggregate) => Self::BoundAggregate(aggregate),
            AnyNode::Path(path) => Self::Path(path),
            AnyNode::Update(update) => Self::Update(update),
        }
    }
}

fn operation_type(op: &Operation) -> NodeType {
    match op {
        Operation::Ask(_) => NodeType::Ask,
        Operation::Bgp(_) => NodeType::Bgp,
        Operation::CompositeUpdate(_) => NodeType::CompositeUpdate,
        Operation::Construct(_) => NodeType::Construct,
        Operation::Describe(_) => NodeType::Describe,
        Operation::Distinct(_) => NodeType::Distinct,
        Operation::Extend(_) => NodeType::Extend,
        Operation::Filter(_) => NodeType::Filter,
        Operation::From(_) => NodeType::From,
        Operation::Graph(_) => NodeType::Graph,
        Operation::Group(_) => NodeType::Group,
        Operation::Join(_) => NodeType::Join,
        Operation::LeftJoin(_) => NodeType::LeftJoin,
        Operation::Minus(_) => NodeType::Minus,
        Operation::Nop(_) => NodeType::Nop,
        Operation::OrderBy(_) => NodeType::OrderBy,
        Operation::Path(_) => NodeType::Path,
        Operation::Pattern(_) => NodeType::Pattern,
        Operation::Project(_) => NodeType::Project,
        Operation::Reduced(_) => NodeType::Reduced,
        Operation::Service(_) => NodeType::Service,
        Operation::Slice(_) => NodeType::Slice,
        Operation::Union(_) => NodeType::Union,
        Operation::Update(_) => NodeType::Update,
        Operation::Values(_) => NodeType::Values,
    }
}

fn update_sub_type(update: &Update) -> NodeSubType {
    match update {
        Update::DeleteInsert(_) => NodeSubType::DeleteInsert,
        Update::Load(_) => NodeSubType::Load,
        Update::Clear(_) => NodeSubType::Clear,
        Update::Create(_) => NodeSubType::Create,
        Update::Drop(_) => NodeSubType::Drop,
        Update::Add(_) => NodeSubType::Add,
        Update::Move(_) => NodeSubType::Move,
        Update::Copy(_) => NodeSubType::Copy,
    }
}

impl Operation {
    /// The [`NodeType`] of this operation.
    #[inline]
    pub fn node_type(&self) -> NodeType {
        operation_type(self)
    }
}

impl Expression {
    pub fn sub_type(&self) -> NodeSubType {
        match self {
            Self::Aggregate(_) => NodeSubType::Aggregate,
            Self::Existence { .. } => NodeSubType::Existence,
            Self::Named { .. } => NodeSubType::Named,
            Self::Operator { .. } => NodeSubType::Operator,
            Self::Term { .. } => NodeSubType::Term,
            Self::Wildcard { .. } => NodeSubType::Wildcard,
        }
    }
}

impl PropertyPathSymbol {
    pub fn sub_type(&self) -> NodeSubType {
        match self {
            Self::Alt { .. } => NodeSubType::Alt,
            Self::Inv { .. } => NodeSubType::Inv,
            Self::Link { .. } => NodeSubType::Link,
            Self::Nps { .. } => NodeSubType::Nps,
            Self::OneOrMore { .. } => NodeSubType::OneOrMore,
            Self::Seq { .. } => NodeSubType::Seq,
            Self::ZeroOrMore { .. } => NodeSubType::ZeroOrMore,
            Self::ZeroOrOne { .. } => NodeSubType::ZeroOrOne,
        }
    }
}

impl Tagged for NodeRef<'_> {
    type Type = NodeType;
    type SubType = NodeSubType;

    fn node_type(&self) -> NodeType {
        match self {
            Self::Operation(op) => operation_type(op),
            Self::Pattern(_) => NodeType::Pattern,
            Self::Expression(_) | Self::BoundAggregate(_) => NodeType::Expression,
            Self::Path(_) => NodeType::PropertyPathSymbol,
            Self::Update(_) => NodeType::Update,
        }
    }

    fn sub_type(&self) -> Option<NodeSubType> {
        match *self {
            Self::Operation(Operation::Update(update)) | Self::Update(update) => {
                Some(update_sub_type(update))
            }
            Self::Operation(_) | Self::Pattern(_) => None,
            Self::Expression(expression) => Some(expression.sub_type()),
            Self::BoundAggregate(_) => Some(NodeSubType::BoundAggregate),
            Self::Path(path) => Some(path.sub_type()),
        }
    }
}

impl<'a> Walk for NodeRef<'a> {
    fn children(self, children: &mut Vec<Self>) {
        match self {
            Self::Operation(op) => match op {
                Operation::Ask(Ask { input, .. })
                | Operation::Describe(Describe { input, .. })
                | Operation::Distinct(Distinct { input, .. })
                | Operation::From(FromDataset { input, .. })
                | Operation::Graph(Graph { input, .. })
                | Operation::Project(Project { input, .. })
                | Operation::Reduced(Reduced { input, .. })
                | Operation::Service(Service { input, .. })
                | Operation::Slice(Slice { input, .. }) => children.push(Self::from(&**input)),
                Operation::Bgp(bgp) => children.extend(bgp.patterns.iter().map(Self::Pattern)),
                Operation::CompositeUpdate(op) => {
                    children.extend(op.updates.iter().map(Self::Update))
                }
                Operation::Construct(op) => {
                    children.push(Self::from(&*op.input));
                    children.extend(op.template.iter().map(Self::Pattern));
                }
                Operation::Extend(Extend {
                    input, expression, ..
                })
                | Operation::Filter(Filter {
                    input, expression, ..
                }) => {
                    children.push(Self::from(&**input));
                    children.push(Self::Expression(expression));
                }
                Operation::Group(op) => {
                    children.push(Self::from(&*op.input));
                    children.extend(op.aggregates.iter().map(Self::BoundAggregate));
                }
                Operation::Join(Join { input, .. }) | Operation::Union(Union { input, .. }) => {
                    children.extend(input.iter().map(Self::from))
                }
                Operation::LeftJoin(op) => {
                    children.extend(op.input.iter().map(Self::from));
                    if let Some(expression) = &op.expression {
                        children.push(Self::Expression(expression));
                    }
                }
                Operation::Minus(op) => children.extend(op.input.iter().map(Self::from)),
                Operation::OrderBy(op) => {
                    children.push(Self::from(&*op.input));
                    children.extend(op.expressions.iter().map(Self::Expression));
                }
                Operation::Path(op) => children.push(Self::Path(&op.predicate)),
                Operation::Pattern(_) | Operation::Nop(_) | Operation::Values(_) => (),
                Operation::Update(update) => Self::Update(update).children(children),
            },
            Self::Pattern(_) => (),
            Self::Expression(expression) => match expression {
                Expression::Aggregate(aggregate) => {
                    children.push(Self::Expression(&aggregate.expression))
                }
                Expression::Existence { input, .. } => children.push(Self::from(&**input)),
                Expression::Named { args, .. } | Expression::Operator { args, .. } => {
                    children.extend(args.iter().map(Self::Expression))
                }
                Expression::Term { .. } | Expression::Wildcard { .. } => (),
            },
            Self::BoundAggregate(aggregate) => {
                children.push(Self::Expression(&aggregate.aggregate.expression))
            }
            Self::Path(path) => match path {
                PropertyPathSymbol::Alt { input, .. } | PropertyPathSymbol::Seq { input, .. } => {
                    children.extend(input.iter().map(Self::Path))
                }
                PropertyPathSymbol::Inv { path, .. }
                | PropertyPathSymbol::OneOrMore { path, .. }
                | PropertyPathSymbol::ZeroOrMore { path, .. }
                | PropertyPathSymbol::ZeroOrOne { path, .. } => children.push(Self::Path(path)),
                PropertyPathSymbol::Link { .. } | PropertyPathSymbol::Nps { .. } => (),
            },
            Self::Update(update) => {
                if let Update::DeleteInsert(op) = update {
                    children.extend(op.delete.iter().map(Self::Pattern));
                    children.extend(op.insert.iter().map(Self::Pattern));
                    if let Some(pattern) = &op.pattern {
                        children.push(Self::from(&**pattern));
                    }
                }
            }
        }
    }
}

/// An owned algebra node of any family, the unit the [`Transformer`](crate::tree::Transformer) rewrites.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnyNode {
    Operation(Operation),
    Pattern(Pattern),
    Expression(Expression),
    BoundAggregate(BoundAggregate),
    Path(PropertyPathSymbol),
    Update(Update),
}

impl From<Operation> for AnyNode {
    #[inline]
    fn from(op: Operation) -> Self {
        match op {
            Operation::Pattern(pattern) => Self::Pattern(pattern),
            Operation::Update(update) => Self::Update(update),
            op => Self::Operation(op),
        }
    }
}

impl From<Pattern> for AnyNode {
    #[inline]
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<Expression> for AnyNode {
    #[inline]
    fn from(expression: Expression) -> Self {
        Self::Expression(expression)
    }
}

impl From<BoundAggregate> for AnyNode {
    #[inline]
    fn from(aggregate: BoundAggregate) -> Self {
        Self::BoundAggregate(aggregate)
    }
}

impl From<PropertyPathSymbol> for AnyNode {
    #[inline]
    fn from(path: PropertyPathSymbol) -> Self {
        Self::Path(path)
    }
}

impl From<Update> for AnyNode {
    #[inline]
    fn from(update: Update) -> Self {
        Self::Update(update)
    }
}

impl AnyNode {
    fn unexpected(self, family: &'static str) -> AlgebraError {
        AlgebraError::unexpected_node(family, self.node_type())
    }
}

impl TryFrom<AnyNode> for Operation {
    type Error = AlgebraError;

    fn try_from(node: AnyNode) -> Result<Self, Self::Error> {
        match node {
            AnyNode::Operation(op) => Ok(op),
            AnyNode::Pattern(pattern) => Ok(Self::Pattern(pattern)),
            AnyNode::Update(update) => Ok(Self::Update(update)),
            node => Err(node.unexpected("operation")),
        }
    }
}

impl TryFrom<AnyNode> for Pattern {
    type Error = AlgebraError;

    fn try_from(node: AnyNode) -> Result<Self, Self::Error> {
        match node {
            AnyNode::Pattern(pattern) | AnyNode::Operation(Operation::Pattern(pattern)) => {
                Ok(pattern)
            }
            node => Err(node.unexpected("pattern")),
        }
    }
}

impl TryFrom<AnyNode> for Expression {
    type Error = AlgebraError;

    fn try_from(node: AnyNode) -> Result<Self, Self::Error> {
        match node {
            AnyNode::Expression(expression) => Ok(expression),
            node => Err(node.unexpected("expression")),
        }
    }
}

impl TryFrom<AnyNode> for BoundAggregate {
    type Error = AlgebraError;

    fn try_from(node: AnyNode) -> Result<Self, Self::Error> {
        match node {
            AnyNode::BoundAggregate(aggregate) => Ok(aggregate),
            node => Err(node.unexpected("bound aggregate")),
        }
    }
}

impl TryFrom<AnyNode> for PropertyPathSymbol {
    type Error = AlgebraError;

    fn try_from(node: AnyNode) -> Result<Self, Self::Error> {
        match node {
            AnyNode::Path(path) => Ok(path),
            node => Err(node.unexpected("property path")),
        }
    }
}

impl TryFrom<AnyNode> for Update {
    type Error = AlgebraError;

    fn try_from(node: AnyNode) -> Result<Self, Self::Error> {
        match node {
            AnyNode::Update(update) | AnyNode::Operation(Operation::Update(update)) => Ok(update),
            node => Err(node.unexpected("update")),
        }
    }
}

impl Tagged for AnyNode {
    type Type = NodeType;
    type SubType = NodeSubType;

    #[inline]
    fn node_type(&self) -> NodeType {
        NodeRef::from(self).node_type()
    }

    #[inline]
    fn sub_type(&self) -> Option<NodeSubType> {
        NodeRef::from(self).sub_type()
    }
}

type MapFn<'f> = dyn FnMut(AnyNode) -> Result<AnyNode, AlgebraError> + 'f;

fn map_operation(op: Operation, f: &mut MapFn<'_>) -> Result<Operation, AlgebraError> {
    f(op.into())?.try_into()
}

fn map_input(input: Box<Operation>, f: &mut MapFn<'_>) -> Result<Box<Operation>, AlgebraError> {
    Ok(Box::new(map_operation(*input, f)?))
}

fn map_pair(
    input: Box<[Operation; 2]>,
    f: &mut MapFn<'_>,
) -> Result<Box<[Operation; 2]>, AlgebraError> {
    let [left, right] = *input;
    Ok(Box::new([map_operation(left, f)?, map_operation(right, f)?]))
}

fn map_operations(
    input: Vec<Operation>,
    f: &mut MapFn<'_>,
) -> Result<Vec<Operation>, AlgebraError> {
    input.into_iter().map(|op| map_operation(op, f)).collect()
}

fn map_expression(expression: Expression, f: &mut MapFn<'_>) -> Result<Expression, AlgebraError> {
    f(expression.into())?.try_into()
}

fn map_expressions(
    expressions: Vec<Expression>,
    f: &mut MapFn<'_>,
) -> Result<Vec<Expression>, AlgebraError> {
    expressions
        .into_iter()
        .map(|e| map_expression(e, f))
        .collect()
}

fn map_patterns(patterns: Vec<Pattern>, f: &mut MapFn<'_>) -> Result<Vec<Pattern>, AlgebraError> {
    patterns
        .into_iter()
        .map(|p| f(p.into())?.try_into())
        .collect()
}

fn map_path(
    path: Box<PropertyPathSymbol>,
    f: &mut MapFn<'_>,
) -> Result<Box<PropertyPathSymbol>, AlgebraError> {
    Ok(Box::new(f(AnyNode::Path(*path))?.try_into()?))
}

fn map_paths(
    paths: Vec<PropertyPathSymbol>,
    f: &mut MapFn<'_>,
) -> Result<Vec<PropertyPathSymbol>, AlgebraError> {
    paths
        .into_iter()
        .map(|p| f(AnyNode::Path(p))?.try_into())
        .collect()
}

fn rebuild_operation(op: Operation, f: &mut MapFn<'_>) -> Result<Operation, AlgebraError> {
    Ok(match op {
        Operation::Ask(mut op) => {
            op.input = map_input(op.input, f)?;
            Operation::Ask(op)
        }
        Operation::Bgp(mut op) => {
            op.patterns = map_patterns(op.patterns, f)?;
            Operation::Bgp(op)
        }
        Operation::CompositeUpdate(mut op) => {
            op.updates = op
                .updates
                .into_iter()
                .map(|u| f(u.into())?.try_into())
                .collect::<Result<_, _>>()?;
            Operation::CompositeUpdate(op)
        }
        Operation::Construct(mut op) => {
            op.input = map_input(op.input, f)?;
            op.template = map_patterns(op.template, f)?;
            Operation::Construct(op)
        }
        Operation::Describe(mut op) => {
            op.input = map_input(op.input, f)?;
            Operation::Describe(op)
        }
        Operation::Distinct(mut op) => {
            op.input = map_input(op.input, f)?;
            Operation::Distinct(op)
        }
        Operation::Extend(mut op) => {
            op.input = map_input(op.input, f)?;
            op.expression = map_expression(op.expression, f)?;
            Operation::Extend(op)
        }
        Operation::Filter(mut op) => {
            op.input = map_input(op.input, f)?;
            op.expression = map_expression(op.expression, f)?;
            Operation::Filter(op)
        }
        Operation::From(mut op) => {
            op.input = map_input(op.input, f)?;
            Operation::From(op)
        }
        Operation::Graph(mut op) => {
            op.input = map_input(op.input, f)?;
            Operation::Graph(op)
        }
        Operation::Group(mut op) => {
            op.input = map_input(op.input, f)?;
            op.aggregates = op
                .aggregates
                .into_iter()
                .map(|a| f(a.into())?.try_into())
                .collect::<Result<_, _>>()?;
            Operation::Group(op)
        }
        Operation::Join(op) => {
            let mut join = Operation::join(map_operations(op.input, f)?, true)?;
            *join.metadata_mut() = op.metadata;
            join
        }
        Operation::LeftJoin(mut op) => {
            op.input = map_pair(op.input, f)?;
            op.expression = op
                .expression
                .map(|e| map_expression(e, f))
                .transpose()?;
            Operation::LeftJoin(op)
        }
        Operation::Minus(mut op) => {
            op.input = map_pair(op.input, f)?;
            Operation::Minus(op)
        }
        Operation::OrderBy(mut op) => {
            op.input = map_input(op.input, f)?;
            op.expressions = map_expressions(op.expressions, f)?;
            Operation::OrderBy(op)
        }
        Operation::Path(mut op) => {
            op.predicate = f(AnyNode::Path(op.predicate))?.try_into()?;
            Operation::Path(op)
        }
        Operation::Project(mut op) => {
            op.input = map_input(op.input, f)?;
            Operation::Project(op)
        }
        Operation::Reduced(mut op) => {
            op.input = map_input(op.input, f)?;
            Operation::Reduced(op)
        }
        Operation::Service(mut op) => {
            op.input = map_input(op.input, f)?;
            Operation::Service(op)
        }
        Operation::Slice(mut op) => {
            op.input = map_input(op.input, f)?;
            Operation::Slice(op)
        }
        Operation::Union(op) => {
            let mut union = Operation::union(map_operations(op.input, f)?, true)?;
            *union.metadata_mut() = op.metadata;
            union
        }
        Operation::Update(update) => Operation::Update(rebuild_update(update, f)?),
        op @ (Operation::Nop(_) | Operation::Pattern(_) | Operation::Values(_)) => op,
    })
}

fn rebuild_update(update: Update, f: &mut MapFn<'_>) -> Result<Update, AlgebraError> {
    Ok(match update {
        Update::DeleteInsert(mut op) => {
            op.delete = map_patterns(op.delete, f)?;
            op.insert = map_patterns(op.insert, f)?;
            op.pattern = op.pattern.map(|p| map_input(p, f)).transpose()?;
            Update::DeleteInsert(op)
        }
        update => update,
    })
}

fn rebuild_expression(
    expression: Expression,
    f: &mut MapFn<'_>,
) -> Result<Expression, AlgebraError> {
    Ok(match expression {
        Expression::Aggregate(mut aggregate) => {
            aggregate.expression = Box::new(map_expression(*aggregate.expression, f)?);
            Expression::Aggregate(aggregate)
        }
        Expression::Existence {
            not,
            input,
            metadata,
        } => Expression::Existence {
            not,
            input: map_input(input, f)?,
            metadata,
        },
        Expression::Named {
            name,
            args,
            metadata,
        } => Expression::Named {
            name,
            args: map_expressions(args, f)?,
            metadata,
        },
        Expression::Operator {
            operator,
            args,
            metadata,
        } => Expression::Operator {
            operator,
            args: map_expressions(args, f)?,
            metadata,
        },
        expression @ (Expression::Term { .. } | Expression::Wildcard { .. }) => expression,
    })
}

fn rebuild_path(
    path: PropertyPathSymbol,
    f: &mut MapFn<'_>,
) -> Result<PropertyPathSymbol, AlgebraError> {
    Ok(match path {
        PropertyPathSymbol::Alt { input, metadata } => {
            let mut alt = PropertyPathSymbol::alt(map_paths(input, f)?, true)?;
            *alt.metadata_mut() = metadata;
            alt
        }
        PropertyPathSymbol::Seq { input, metadata } => {
            let mut seq = PropertyPathSymbol::seq(map_paths(input, f)?, true)?;
            *seq.metadata_mut() = metadata;
            seq
        }
        PropertyPathSymbol::Inv { path, metadata } => PropertyPathSymbol::Inv {
            path: map_path(path, f)?,
            metadata,
        },
        PropertyPathSymbol::OneOrMore { path, metadata } => PropertyPathSymbol::OneOrMore {
            path: map_path(path, f)?,
            metadata,
        },
        PropertyPathSymbol::ZeroOrMore { path, metadata } => PropertyPathSymbol::ZeroOrMore {
            path: map_path(path, f)?,
            metadata,
        },
        PropertyPathSymbol::ZeroOrOne { path, metadata } => PropertyPathSymbol::ZeroOrOne {
            path: map_path(path, f)?,
            metadata,
        },
        path @ (PropertyPathSymbol::Link { .. } | PropertyPathSymbol::Nps { .. }) => path,
    })
}

impl Rebuild for AnyNode {
    fn map_children(
        self,
        f: &mut dyn FnMut(Self) -> Result<Self, AlgebraError>,
    ) -> Result<Self, AlgebraError> {
        Ok(match self {
            Self::Operation(op) => Self::Operation(rebuild_operation(op, f)?),
            Self::Pattern(pattern) => Self::Pattern(pattern),
            Self::Expression(expression) => Self::Expression(rebuild_expression(expression, f)?),
            Self::BoundAggregate(mut aggregate) => {
                aggregate.aggregate.expression =
                    Box::new(map_expression(*aggregate.aggregate.expression, f)?);
                Self::BoundAggregate(aggregate)
            }
            Self::Path(path) => Self::Path(rebuild_path(path, f)?),
            Self::Update(update) => Self::Update(rebuild_update(update, f)?),
        })
    }

    fn metadata(&self) -> &Metadata {
        match self {
            Self::Operation(op) => op.metadata(),
            Self::Pattern(pattern) => &pattern.metadata,
            Self::Expression(expression) => expression.metadata(),
            Self::BoundAggregate(aggregate) => &aggregate.aggregate.metadata,
            Self::Path(path) => path.metadata(),
            Self::Update(update) => update.metadata(),
        }
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Self::Operation(op) => op.metadata_mut(),
            Self::Pattern(pattern) => &mut pattern.metadata,
            Self::Expression(expression) => expression.metadata_mut(),
            Self::BoundAggregate(aggregate) => &mut aggregate.aggregate.metadata,
            Self::Path(path) => path.metadata_mut(),
            Self::Update(update) => update.metadata_mut(),
        }
    }
}
