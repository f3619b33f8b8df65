//! Immediate values and node handles.

use std::fmt;

use crate::symbol::Symbol;

/// Stable identity of a reference node inside a [`Graph`](crate::Graph).
///
/// Handles are only meaningful for the graph that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A slot in a marshal graph: either an immediate or a handle to a
/// reference node.
///
/// Immediates carry no identity, so two equal immediates are
/// interchangeable. `Ref` compares by handle, i.e. by identity.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    True,
    False,
    /// Stored wide so out-of-range values can be represented and rejected
    /// by the generator.
    Integer(i64),
    /// Floats are part of the model but not of the supported wire subset.
    Float(f64),
    Symbol(Symbol),
    Ref(NodeId),
}

impl Value {
    pub fn symbol(name: impl Into<Symbol>) -> Self {
        Self::Symbol(name.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Whether this value is a reference rather than an immediate.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Symbol(sym) => Some(sym),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b {
            Self::True
        } else {
            Self::False
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Self::Symbol(sym)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Self::Ref(id)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}
