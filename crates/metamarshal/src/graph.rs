//! The marshal object graph.
//!
//! [`Graph`] is an arena of reference nodes addressed by [`NodeId`]. A
//! handle is the node's identity: aliases are simply copies of the handle,
//! so cycles and sharing need no ownership tricks. Rewriting a node
//! replaces the payload stored in its slot, and every alias observes it.
//!
//! # Invariants
//!
//! - Handles are never reused or invalidated while the graph lives.
//! - Children may point anywhere in the same graph, including back at an
//!   ancestor; nothing here assumes a tree.
//! - Instance variables keep insertion order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MarshalError, MarshalResult};
use crate::symbol::Symbol;
use crate::value::{NodeId, Value};

/// The variant of a reference node, independent of its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Array,
    Object,
    String,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Array => "Array",
            Self::Object => "Object",
            Self::String => "String",
        };
        f.write_str(name)
    }
}

/// Payload of a plain object: a class name plus ordered instance variables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectData {
    /// `None` denotes an anonymous class, which cannot be generated.
    pub class_name: Option<Symbol>,
    pub ivars: Vec<(Symbol, Value)>,
}

impl ObjectData {
    pub fn new(class_name: impl Into<Symbol>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ivars: Vec::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &Symbol) -> Option<&Value> {
        self.ivars.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Set an instance variable. An existing key keeps its position.
    pub fn set(&mut self, name: Symbol, value: Value) {
        match self.ivars.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.ivars.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.ivars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ivars.is_empty()
    }
}

/// A node with identity.
#[derive(Clone, Debug, PartialEq)]
pub enum Reference {
    Array(Vec<Value>),
    Object(ObjectData),
    /// String placeholder. Carries identity but no payload, and is not part
    /// of the generated subset.
    String,
}

impl Reference {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Self::Array(_) => ReferenceKind::Array,
            Self::Object(_) => ReferenceKind::Object,
            Self::String => ReferenceKind::String,
        }
    }

    /// Children in wire order: array elements, or ivar values.
    pub fn children(&self) -> Vec<&Value> {
        match self {
            Self::Array(elements) => elements.iter().collect(),
            Self::Object(data) => data.ivars.iter().map(|(_, v)| v).collect(),
            Self::String => Vec::new(),
        }
    }
}

/// Arena of reference nodes.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Reference>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reference nodes allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All handles, in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    // ---------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------

    /// Allocate a node and return its identity.
    pub fn insert(&mut self, node: Reference) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn array(&mut self, elements: Vec<Value>) -> NodeId {
        self.insert(Reference::Array(elements))
    }

    pub fn object(&mut self, class_name: impl Into<Symbol>) -> NodeId {
        self.insert(Reference::Object(ObjectData::new(class_name)))
    }

    pub fn anonymous_object(&mut self) -> NodeId {
        self.insert(Reference::Object(ObjectData::anonymous()))
    }

    pub fn string(&mut self) -> NodeId {
        self.insert(Reference::String)
    }

    // ---------------------------------------------------------------
    // Access
    // ---------------------------------------------------------------

    pub fn get(&self, id: NodeId) -> MarshalResult<&Reference> {
        self.nodes
            .get(id.index())
            .ok_or(MarshalError::NodeNotFound(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> MarshalResult<&mut Reference> {
        self.nodes
            .get_mut(id.index())
            .ok_or(MarshalError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> MarshalResult<ReferenceKind> {
        Ok(self.get(id)?.kind())
    }

    pub fn elements(&self, id: NodeId) -> MarshalResult<&[Value]> {
        match self.get(id)? {
            Reference::Array(elements) => Ok(elements),
            other => Err(mismatch(id, ReferenceKind::Array, other)),
        }
    }

    pub fn elements_mut(&mut self, id: NodeId) -> MarshalResult<&mut Vec<Value>> {
        match self.get_mut(id)? {
            Reference::Array(elements) => Ok(elements),
            other => Err(mismatch(id, ReferenceKind::Array, other)),
        }
    }

    pub fn object_data(&self, id: NodeId) -> MarshalResult<&ObjectData> {
        match self.get(id)? {
            Reference::Object(data) => Ok(data),
            other => Err(mismatch(id, ReferenceKind::Object, other)),
        }
    }

    pub fn object_data_mut(&mut self, id: NodeId) -> MarshalResult<&mut ObjectData> {
        match self.get_mut(id)? {
            Reference::Object(data) => Ok(data),
            other => Err(mismatch(id, ReferenceKind::Object, other)),
        }
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    pub fn push_element(&mut self, id: NodeId, value: impl Into<Value>) -> MarshalResult<()> {
        self.elements_mut(id)?.push(value.into());
        Ok(())
    }

    pub fn set_ivar(
        &mut self,
        id: NodeId,
        name: impl Into<Symbol>,
        value: impl Into<Value>,
    ) -> MarshalResult<()> {
        self.object_data_mut(id)?.set(name.into(), value.into());
        Ok(())
    }

    /// Rewrite a node in place, returning its previous payload.
    ///
    /// The handle keeps its identity, so every alias sees the new variant.
    pub fn replace(&mut self, id: NodeId, node: Reference) -> MarshalResult<Reference> {
        let slot = self.get_mut(id)?;
        Ok(std::mem::replace(slot, node))
    }

    /// Make `target` a copy of `source`, in place.
    ///
    /// The payload container is copied, so later changes to either node's
    /// children do not leak into the other.
    pub fn assign(&mut self, target: NodeId, source: NodeId) -> MarshalResult<()> {
        let copy = self.get(source)?.clone();
        self.replace(target, copy)?;
        Ok(())
    }

    /// Clone a node into a fresh identity.
    pub fn duplicate(&mut self, id: NodeId) -> MarshalResult<NodeId> {
        let copy = self.get(id)?.clone();
        Ok(self.insert(copy))
    }
}

fn mismatch(node: NodeId, expected: ReferenceKind, actual: &Reference) -> MarshalError {
    MarshalError::VariantMismatch {
        node,
        expected,
        actual: actual.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_and_query() {
        let mut g = Graph::new();
        let a = g.array(vec![Value::from(1), Value::from(2)]);
        let o = g.object("Point");
        let s = g.string();

        assert_eq!(g.len(), 3);
        assert_eq!(g.kind(a).unwrap(), ReferenceKind::Array);
        assert_eq!(g.kind(o).unwrap(), ReferenceKind::Object);
        assert_eq!(g.kind(s).unwrap(), ReferenceKind::String);
        assert_eq!(g.elements(a).unwrap(), &[Value::from(1), Value::from(2)]);
        assert_eq!(
            g.object_data(o).unwrap().class_name,
            Some(Symbol::from("Point"))
        );
        assert_eq!(g.ids().collect::<Vec<_>>(), vec![a, o, s]);
    }

    #[test]
    fn cycles_are_legal_at_construction() {
        let mut g = Graph::new();
        let a = g.array(Vec::new());
        g.push_element(a, a).unwrap();
        assert_eq!(g.elements(a).unwrap(), &[Value::Ref(a)]);
    }

    #[test]
    fn set_ivar_keeps_first_position() {
        let mut g = Graph::new();
        let o = g.object("Point");
        g.set_ivar(o, "@x", 1).unwrap();
        g.set_ivar(o, "@y", 2).unwrap();
        g.set_ivar(o, "@x", 3).unwrap();

        let data = g.object_data(o).unwrap();
        assert_eq!(
            data.ivars,
            vec![
                (Symbol::from("@x"), Value::from(3)),
                (Symbol::from("@y"), Value::from(2)),
            ]
        );
        assert_eq!(data.get(&Symbol::from("@y")), Some(&Value::from(2)));
        assert_eq!(data.get(&Symbol::from("@z")), None);
    }

    #[test]
    fn replace_is_seen_through_aliases() {
        let mut g = Graph::new();
        let target = g.anonymous_object();
        let holder = g.array(vec![target.into(), target.into()]);

        let old = g
            .replace(target, Reference::Array(vec![Value::Nil]))
            .unwrap();
        assert_eq!(old.kind(), ReferenceKind::Object);

        for child in g.elements(holder).unwrap() {
            let id = child.as_node().unwrap();
            assert_eq!(id, target);
            assert_eq!(g.kind(id).unwrap(), ReferenceKind::Array);
        }
    }

    #[test]
    fn assign_copies_variant_and_container() {
        let mut g = Graph::new();
        let obj = g.anonymous_object();
        let src = g.array(vec![Value::from(1)]);

        g.assign(obj, src).unwrap();
        assert_eq!(g.kind(obj).unwrap(), ReferenceKind::Array);

        g.push_element(obj, 2).unwrap();
        assert_eq!(g.elements(src).unwrap(), &[Value::from(1)]);
        assert_eq!(g.elements(obj).unwrap(), &[Value::from(1), Value::from(2)]);
    }

    #[test]
    fn duplicate_gets_new_identity_and_own_container() {
        let mut g = Graph::new();
        let child = g.array(Vec::new());
        let original = g.array(vec![child.into()]);
        let copy = g.duplicate(original).unwrap();

        assert_ne!(copy, original);
        // Children are shared by handle.
        assert_eq!(g.elements(copy).unwrap(), &[Value::Ref(child)]);

        g.push_element(copy, Value::Nil).unwrap();
        assert_eq!(g.elements(original).unwrap().len(), 1);
        assert_eq!(g.elements(copy).unwrap().len(), 2);
    }

    #[test]
    fn variant_mismatch() {
        let mut g = Graph::new();
        let a = g.array(Vec::new());
        let err = g.set_ivar(a, "@x", 1).unwrap_err();
        assert!(matches!(
            err,
            MarshalError::VariantMismatch {
                expected: ReferenceKind::Object,
                actual: ReferenceKind::Array,
                ..
            }
        ));

        let s = g.string();
        assert!(matches!(
            g.push_element(s, 1).unwrap_err(),
            MarshalError::VariantMismatch { .. }
        ));
    }

    #[test]
    fn unknown_handle() {
        let mut g = Graph::new();
        let mut other = Graph::new();
        other.array(Vec::new());
        let foreign = other.array(Vec::new());

        assert!(!g.contains(foreign));
        assert!(matches!(
            g.get(foreign).unwrap_err(),
            MarshalError::NodeNotFound(id) if id == foreign
        ));
        assert!(g.duplicate(foreign).is_err());
        assert!(g.replace(foreign, Reference::String).is_err());
    }

    #[test]
    fn children_in_wire_order() {
        let mut g = Graph::new();
        let o = g.object("Pair");
        g.set_ivar(o, "@b", 2).unwrap();
        g.set_ivar(o, "@a", 1).unwrap();
        let children = g.get(o).unwrap().children();
        assert_eq!(children, vec![&Value::from(2), &Value::from(1)]);
        assert!(Reference::String.children().is_empty());
    }
}
