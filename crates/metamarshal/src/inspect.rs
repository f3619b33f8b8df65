//! Cycle-safe textual rendering of graph values.

use std::collections::HashSet;
use std::fmt;

use crate::graph::{Graph, Reference};
use crate::symbol::Symbol;
use crate::value::{NodeId, Value};

/// [`fmt::Display`] adapter returned by [`Graph::display`].
pub struct Inspect<'g> {
    graph: &'g Graph,
    value: &'g Value,
}

impl Graph {
    /// Render `value` for debugging, e.g. `Array([1, :foo, Array(...)])`.
    ///
    /// A node reached again while it is still being rendered prints as
    /// `Kind(...)`. Shared but acyclic nodes print in full each time.
    pub fn display<'g>(&'g self, value: &'g Value) -> Inspect<'g> {
        Inspect { graph: self, value }
    }
}

impl fmt::Display for Inspect<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(self.graph, self.value, f)
    }
}

/// Output still to produce, popped from the back.
enum Step<'g> {
    Value(&'g Value),
    Text(&'static str),
    Ivar(&'g Symbol),
    /// Rendering of this node's contents is finished.
    Leave(NodeId),
}

fn write_value<'g>(graph: &'g Graph, root: &'g Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut steps = vec![Step::Value(root)];
    // Nodes whose contents are being rendered.
    let mut path = HashSet::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Text(text) => f.write_str(text)?,
            Step::Ivar(name) => write!(f, "{}: ", name.to_string_lossy())?,
            Step::Leave(id) => {
                path.remove(&id);
            }
            Step::Value(Value::Ref(id)) => enter(graph, *id, &mut path, &mut steps, f)?,
            Step::Value(value) => write_immediate(value, f)?,
        }
    }
    Ok(())
}

fn write_immediate(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Nil => f.write_str("nil"),
        Value::True => f.write_str("true"),
        Value::False => f.write_str("false"),
        Value::Integer(n) => write!(f, "{n}"),
        Value::Float(x) => write!(f, "{x:?}"),
        Value::Symbol(sym) => write!(f, "{sym}"),
        Value::Ref(id) => write!(f, "{id}"),
    }
}

/// Open a node: write its prefix and queue its contents.
fn enter<'g>(
    graph: &'g Graph,
    id: NodeId,
    path: &mut HashSet<NodeId>,
    steps: &mut Vec<Step<'g>>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let Ok(node) = graph.get(id) else {
        return write!(f, "<dangling {id}>");
    };
    if path.contains(&id) {
        return write!(f, "{}(...)", node.kind());
    }

    let mut queued = Vec::new();
    match node {
        Reference::Array(elements) => {
            f.write_str("Array([")?;
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    queued.push(Step::Text(", "));
                }
                queued.push(Step::Value(element));
            }
            queued.push(Step::Text("])"));
        }
        Reference::Object(data) => {
            f.write_str("Object(")?;
            match &data.class_name {
                Some(name) => write!(f, "{name}")?,
                None => f.write_str("nil")?,
            }
            if !data.ivars.is_empty() {
                queued.push(Step::Text(", {"));
                for (i, (name, value)) in data.ivars.iter().enumerate() {
                    if i > 0 {
                        queued.push(Step::Text(", "));
                    }
                    queued.push(Step::Ivar(name));
                    queued.push(Step::Value(value));
                }
                queued.push(Step::Text("}"));
            }
            queued.push(Step::Text(")"));
        }
        Reference::String => return f.write_str("String"),
    }

    path.insert(id);
    queued.push(Step::Leave(id));
    steps.extend(queued.into_iter().rev());
    Ok(())
}
