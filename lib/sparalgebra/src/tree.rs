//! Tag-dispatched traversal of closed node families.
//!
//! A node family is an enum implementing [`Tagged`]: every node reports a type and an optional
//! sub-type (for example `Expression` / `Aggregate`). Three walkers are built on top of it:
//! * [`Visitor`] is a read-only, depth-first, post-order walk over a [`Walk`] family.
//! * [`Transformer`] rebuilds an owned [`Rebuild`] family, letting callbacks replace nodes.
//! * [`Router`] is a traversal where each handler decides which children to enter next.
//!
//! Handlers registered for a `(type, sub-type)` pair take precedence over handlers registered
//! for the type only.

use crate::algebra::Metadata;
use crate::error::AlgebraError;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A node of a closed family that knows its own discriminant.
pub trait Tagged {
    type Type: Copy + Eq + Hash + Debug;
    type SubType: Copy + Eq + Hash + Debug;

    fn node_type(&self) -> Self::Type;

    fn sub_type(&self) -> Option<Self::SubType>;
}

/// A borrowed node family that can enumerate its children.
pub trait Walk: Tagged + Copy {
    /// Pushes the children of the node, in evaluation order.
    fn children(self, children: &mut Vec<Self>);
}

/// An owned node family that can be rebuilt from its transformed children.
pub trait Rebuild: Tagged + Sized {
    /// Rebuilds the node after applying `f` to each of its children.
    ///
    /// Associative operators are flattened again so that a rewrite never breaks that invariant.
    fn map_children(
        self,
        f: &mut dyn FnMut(Self) -> Result<Self, AlgebraError>,
    ) -> Result<Self, AlgebraError>;

    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;
}

struct Handlers<T, S, H> {
    by_type: HashMap<T, H>,
    by_sub_type: HashMap<(T, S), H>,
}

impl<T: Copy + Eq + Hash, S: Copy + Eq + Hash, H> Handlers<T, S, H> {
    fn new() -> Self {
        Self {
            by_type: HashMap::new(),
            by_sub_type: HashMap::new(),
        }
    }

    fn get_mut<N: Tagged<Type = T, SubType = S>>(&mut self, node: &N) -> Option<&mut H> {
        let node_type = node.node_type();
        if let Some(sub_type) = node.sub_type() {
            if let Some(handler) = self.by_sub_type.get_mut(&(node_type, sub_type)) {
                return Some(handler);
            }
        }
        self.by_type.get_mut(&node_type)
    }
}

/// What a pre-visit callback wants the [`Visitor`] to do with the current subtree.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct VisitControl {
    /// Visit the children of the node.
    pub descend: bool,
    /// Abort the whole walk.
    pub shortcut: bool,
}

impl VisitControl {
    pub const CONTINUE: Self = Self {
        descend: true,
        shortcut: false,
    };
    pub const SKIP_CHILDREN: Self = Self {
        descend: false,
        shortcut: false,
    };
    pub const SHORTCUT: Self = Self {
        descend: false,
        shortcut: true,
    };
}

type VisitCallback<'h, N, S> = Box<dyn FnMut(&mut S, N) + 'h>;
type PreVisitCallback<'h, N, S> = Box<dyn FnMut(&mut S, N) -> VisitControl + 'h>;

/// A depth-first, post-order, read-only walk.
///
/// ```
/// use sparalgebra::algebra::{NodeRef, NodeType, Operation, Pattern};
/// use sparalgebra::term::{NamedNode, Variable};
/// use sparalgebra::tree::Visitor;
///
/// let bgp = Operation::bgp(vec![Pattern::new(
///     Variable::new("s")?,
///     NamedNode::new("http://example.com/p")?,
///     Variable::new("o")?,
///     None,
/// )]);
/// let mut count = 0;
/// Visitor::<NodeRef<'_>, usize>::new()
///     .on(NodeType::Pattern, |count, _| *count += 1)
///     .visit(NodeRef::from(&bgp), &mut count);
/// assert_eq!(count, 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct Visitor<'h, N: Tagged, S> {
    callbacks: Handlers<N::Type, N::SubType, VisitCallback<'h, N, S>>,
    pre_visits: Handlers<N::Type, N::SubType, PreVisitCallback<'h, N, S>>,
}

impl<'h, N: Walk, S> Visitor<'h, N, S> {
    #[inline]
    pub fn new() -> Self {
        Self {
            callbacks: Handlers::new(),
            pre_visits: Handlers::new(),
        }
    }

    /// Registers the callback called after all the children of a node of the given type.
    #[must_use]
    pub fn on(mut self, node_type: N::Type, callback: impl FnMut(&mut S, N) + 'h) -> Self {
        self.callbacks.by_type.insert(node_type, Box::new(callback));
        self
    }

    /// Same as [`on`](Self::on) but only for a given sub-type.
    #[must_use]
    pub fn on_sub_type(
        mut self,
        node_type: N::Type,
        sub_type: N::SubType,
        callback: impl FnMut(&mut S, N) + 'h,
    ) -> Self {
        self.callbacks
            .by_sub_type
            .insert((node_type, sub_type), Box::new(callback));
        self
    }

    /// Registers a callback called before the children of a node of the given type are visited.
    #[must_use]
    pub fn pre_visit(
        mut self,
        node_type: N::Type,
        callback: impl FnMut(&mut S, N) -> VisitControl + 'h,
    ) -> Self {
        self.pre_visits.by_type.insert(node_type, Box::new(callback));
        self
    }

    #[must_use]
    pub fn pre_visit_sub_type(
        mut self,
        node_type: N::Type,
        sub_type: N::SubType,
        callback: impl FnMut(&mut S, N) -> VisitControl + 'h,
    ) -> Self {
        self.pre_visits
            .by_sub_type
            .insert((node_type, sub_type), Box::new(callback));
        self
    }

    /// Walks the tree rooted at `node`.
    ///
    /// Returns `false` if a pre-visit callback aborted the walk.
    pub fn visit(&mut self, node: N, state: &mut S) -> bool {
        !self.walk(node, state)
    }

    fn walk(&mut self, node: N, state: &mut S) -> bool {
        let control = self
            .pre_visits
            .get_mut(&node)
            .map_or(VisitControl::CONTINUE, |callback| callback(state, node));
        if control.shortcut {
            return true;
        }
        if control.descend {
            let mut children = Vec::new();
            node.children(&mut children);
            for child in children {
                if self.walk(child, state) {
                    return true;
                }
            }
        }
        if let Some(callback) = self.callbacks.get_mut(&node) {
            callback(state, node);
        }
        false
    }
}

impl<N: Walk, S> Default for Visitor<'_, N, S> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// The result of a [`Transformer`] callback.
pub struct Transformed<N> {
    /// The replacement node.
    pub node: N,
    /// Whether the children of the replacement should be transformed too.
    pub recurse: bool,
    /// Whether the metadata of the replaced node is merged into the replacement.
    pub copy_metadata: bool,
}

impl<N> Transformed<N> {
    /// Replaces the node and keeps transforming its children.
    #[inline]
    pub fn new(node: N) -> Self {
        Self {
            node,
            recurse: true,
            copy_metadata: true,
        }
    }

    /// Replaces the node without looking at its children.
    #[inline]
    pub fn stop(node: N) -> Self {
        Self {
            node,
            recurse: false,
            copy_metadata: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn without_metadata(mut self) -> Self {
        self.copy_metadata = false;
        self
    }
}

type TransformCallback<'h, N, S> =
    Box<dyn FnMut(&mut S, N) -> Result<Transformed<N>, AlgebraError> + 'h>;

/// A depth-first rebuild of an owned tree.
///
/// The callback registered for a node is applied first; then, if it asks for it, the children of
/// the returned node are transformed. Nodes without callback are kept and their children
/// transformed. The metadata of a replaced node is merged into its replacement, the replaced
/// node entries winning on conflicts.
pub struct Transformer<'h, N: Tagged, S> {
    callbacks: Handlers<N::Type, N::SubType, TransformCallback<'h, N, S>>,
}

impl<'h, N: Rebuild, S> Transformer<'h, N, S> {
    #[inline]
    pub fn new() -> Self {
        Self {
            callbacks: Handlers::new(),
        }
    }

    #[must_use]
    pub fn on(
        mut self,
        node_type: N::Type,
        callback: impl FnMut(&mut S, N) -> Result<Transformed<N>, AlgebraError> + 'h,
    ) -> Self {
        self.callbacks.by_type.insert(node_type, Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_sub_type(
        mut self,
        node_type: N::Type,
        sub_type: N::SubType,
        callback: impl FnMut(&mut S, N) -> Result<Transformed<N>, AlgebraError> + 'h,
    ) -> Self {
        self.callbacks
            .by_sub_type
            .insert((node_type, sub_type), Box::new(callback));
        self
    }

    pub fn transform(&mut self, node: N, state: &mut S) -> Result<N, AlgebraError> {
        let original_metadata = node.metadata().clone();
        let Transformed {
            node,
            recurse,
            copy_metadata,
        } = match self.callbacks.get_mut(&node) {
            Some(callback) => callback(state, node)?,
            None => Transformed::new(node),
        };
        let mut node = if recurse {
            node.map_children(&mut |child| self.transform(child, state))?
        } else {
            node
        };
        if copy_metadata && !original_metadata.is_empty() {
            node.metadata_mut().extend(original_metadata);
        }
        Ok(node)
    }
}

impl<N: Rebuild, S> Default for Transformer<'_, N, S> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// The decision of a [`Router`] handler.
pub struct Route<N> {
    /// The children to traverse next, in order.
    pub next: Vec<N>,
    /// Abort the whole traversal.
    pub shortcut: bool,
}

impl<N> Route<N> {
    #[inline]
    pub fn into(next: Vec<N>) -> Self {
        Self {
            next,
            shortcut: false,
        }
    }

    #[inline]
    pub fn stop() -> Self {
        Self::into(Vec::new())
    }

    #[inline]
    pub fn shortcut() -> Self {
        Self {
            next: Vec::new(),
            shortcut: true,
        }
    }
}

type RouteCallback<'h, N, S> = Box<dyn FnMut(&mut S, N) -> Route<N> + 'h>;

/// A pre-order traversal where every handler picks the children to continue into.
///
/// A node without handler ends its branch.
pub struct Router<'h, N: Tagged, S> {
    routes: Handlers<N::Type, N::SubType, RouteCallback<'h, N, S>>,
}

impl<'h, N: Tagged, S> Router<'h, N, S> {
    #[inline]
    pub fn new() -> Self {
        Self {
            routes: Handlers::new(),
        }
    }

    #[must_use]
    pub fn on(mut self, node_type: N::Type, route: impl FnMut(&mut S, N) -> Route<N> + 'h) -> Self {
        self.routes.by_type.insert(node_type, Box::new(route));
        self
    }

    #[must_use]
    pub fn on_sub_type(
        mut self,
        node_type: N::Type,
        sub_type: N::SubType,
        route: impl FnMut(&mut S, N) -> Route<N> + 'h,
    ) -> Self {
        self.routes
            .by_sub_type
            .insert((node_type, sub_type), Box::new(route));
        self
    }

    /// Traverses from `node`.
    ///
    /// Returns `false` if a handler aborted the traversal.
    pub fn traverse(&mut self, node: N, state: &mut S) -> bool {
        !self.walk(node, state)
    }

    fn walk(&mut self, node: N, state: &mut S) -> bool {
        let Some(route) = self.routes.get_mut(&node) else {
            return false;
        };
        let Route { next, shortcut } = route(state, node);
        if shortcut {
            return true;
        }
        for child in next {
            if self.walk(child, state) {
                return true;
            }
        }
        false
    }
}

impl<N: Tagged, S> Default for Router<'_, N, S> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[expect(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use crate::algebra::{
        AnyNode, Expression, NodeRef, NodeSubType, NodeType, Operation, Pattern,
    };
    use crate::term::{NamedNode, Variable};

    fn pattern(s: &str, o: &str) -> Result<Pattern, Box<dyn std::error::Error>> {
        Ok(Pattern::new(
            Variable::new(s)?,
            NamedNode::new("http://example.com/p")?,
            Variable::new(o)?,
            None,
        ))
    }

    fn tree() -> Result<Operation, Box<dyn std::error::Error>> {
        let left = Operation::bgp(vec![pattern("a", "b")?]);
        let right = Operation::bgp(vec![pattern("b", "c")?]);
        Ok(Operation::filter(
            Operation::join(vec![left, right], true)?,
            Expression::operator("bound", vec![Expression::term(Variable::new("a")?)]),
        ))
    }

    #[test]
    fn test_visit_is_post_order() -> Result<(), Box<dyn std::error::Error>> {
        let op = tree()?;
        let mut order = Vec::new();
        Visitor::<NodeRef<'_>, Vec<&str>>::new()
            .on(NodeType::Bgp, |order, _| order.push("bgp"))
            .on(NodeType::Join, |order, _| order.push("join"))
            .on(NodeType::Filter, |order, _| order.push("filter"))
            .on(NodeType::Expression, |order, _| order.push("expression"))
            .visit(NodeRef::from(&op), &mut order);
        assert_eq!(
            order,
            ["bgp", "bgp", "join", "expression", "expression", "filter"]
        );
        Ok(())
    }

    #[test]
    fn test_visit_skip_children_and_shortcut() -> Result<(), Box<dyn std::error::Error>> {
        let op = tree()?;
        let mut patterns = 0;
        let completed = Visitor::<NodeRef<'_>, usize>::new()
            .pre_visit(NodeType::Join, |_, _| VisitControl::SKIP_CHILDREN)
            .on(NodeType::Pattern, |count, _| *count += 1)
            .visit(NodeRef::from(&op), &mut patterns);
        assert!(completed);
        assert_eq!(patterns, 0);

        let mut patterns = 0;
        let completed = Visitor::<NodeRef<'_>, usize>::new()
            .pre_visit(NodeType::Pattern, |count, _| {
                *count += 1;
                VisitControl::SHORTCUT
            })
            .visit(NodeRef::from(&op), &mut patterns);
        assert!(!completed);
        assert_eq!(patterns, 1);
        Ok(())
    }

    #[test]
    fn test_sub_type_handler_wins() -> Result<(), Box<dyn std::error::Error>> {
        let op = tree()?;
        let mut seen = Vec::new();
        Visitor::<NodeRef<'_>, Vec<&str>>::new()
            .on(NodeType::Expression, |seen, _| seen.push("expression"))
            .on_sub_type(NodeType::Expression, NodeSubType::Term, |seen, _| {
                seen.push("term")
            })
            .visit(NodeRef::from(&op), &mut seen);
        assert_eq!(seen, ["term", "expression"]);
        Ok(())
    }

    #[test]
    fn test_transform_copies_metadata() -> Result<(), Box<dyn std::error::Error>> {
        let mut op = Operation::bgp(vec![pattern("a", "b")?]);
        op.metadata_mut().insert("source".into(), "line 1".into());
        let wrapped = Transformer::<AnyNode, ()>::new()
            .on(NodeType::Bgp, |_, node| {
                Ok(Transformed::stop(AnyNode::Operation(Operation::distinct(
                    Operation::try_from(node)?,
                ))))
            })
            .transform(AnyNode::Operation(op.clone()), &mut ())?;
        let wrapped = Operation::try_from(wrapped)?;
        assert_eq!(
            wrapped.metadata().get("source").map(String::as_str),
            Some("line 1")
        );

        let bare = Transformer::<AnyNode, ()>::new()
            .on(NodeType::Bgp, |_, node| {
                Ok(Transformed::stop(AnyNode::Operation(Operation::distinct(
                    Operation::try_from(node)?,
                )))
                .without_metadata())
            })
            .transform(AnyNode::Operation(op), &mut ())?;
        assert!(Operation::try_from(bare)?.metadata().is_empty());
        Ok(())
    }

    #[test]
    fn test_transform_reflattens_joins() -> Result<(), Box<dyn std::error::Error>> {
        let op = tree()?;
        let transformed = Transformer::<AnyNode, ()>::new()
            .on(NodeType::Bgp, |_, node| {
                let bgp = Operation::try_from(node)?;
                Ok(Transformed::stop(AnyNode::Operation(Operation::join(
                    vec![bgp.clone(), bgp],
                    false,
                )?)))
            })
            .transform(AnyNode::Operation(op), &mut ())?;
        let Operation::Filter(filter) = Operation::try_from(transformed)? else {
            panic!("filter expected")
        };
        let Operation::Join(join) = *filter.input else {
            panic!("join expected")
        };
        assert_eq!(join.input.len(), 4);
        Ok(())
    }

    #[test]
    fn test_router_only_follows_returned_children() -> Result<(), Box<dyn std::error::Error>> {
        let op = tree()?;
        let mut visited = Vec::new();
        Router::<NodeRef<'_>, Vec<NodeType>>::new()
            .on(NodeType::Filter, |visited, node| {
                visited.push(NodeType::Filter);
                let mut children = Vec::new();
                node.children(&mut children);
                // only the filtered operation, never the expression
                children.truncate(1);
                Route::into(children)
            })
            .on(NodeType::Join, |visited, _| {
                visited.push(NodeType::Join);
                Route::stop()
            })
            .traverse(NodeRef::from(&op), &mut visited);
        assert_eq!(visited, [NodeType::Filter, NodeType::Join]);
        Ok(())
    }
}
