//! Identity-aware structural comparison of graphs.
//!
//! Two values are isomorphic when a bijection between their reference
//! nodes exists under which immediates are equal and corresponding nodes
//! agree in variant, class name, ivar names and children, in order. Plain
//! content equality is not enough: `[x, x]` with a shared `x` is not
//! isomorphic to `[x, y]` with an equal but distinct `y`.

use std::collections::HashMap;

use crate::graph::{Graph, Reference};
use crate::value::{NodeId, Value};

/// Whether `a_root` in `a` and `b_root` in `b` are isomorphic.
pub fn isomorphic(a: &Graph, a_root: &Value, b: &Graph, b_root: &Value) -> bool {
    Isomorphism {
        a,
        b,
        forward: HashMap::new(),
        backward: HashMap::new(),
    }
    .check(a_root, b_root)
}

struct Isomorphism<'g> {
    a: &'g Graph,
    b: &'g Graph,
    forward: HashMap<NodeId, NodeId>,
    backward: HashMap<NodeId, NodeId>,
}

impl<'g> Isomorphism<'g> {
    /// Pairs still to compare are kept on a worklist, so graph depth does
    /// not grow the call stack. The pairing is forced by position, so the
    /// visiting order does not change the answer.
    fn check(&mut self, x: &'g Value, y: &'g Value) -> bool {
        let mut pending = vec![(x, y)];
        while let Some((x, y)) = pending.pop() {
            let same = match (x, y) {
                (Value::Ref(p), Value::Ref(q)) => self.nodes(*p, *q, &mut pending),
                (Value::Ref(_), _) | (_, Value::Ref(_)) => false,
                _ => x == y,
            };
            if !same {
                return false;
            }
        }
        true
    }

    /// Pair `p` with `q`. Children of a newly paired node are queued.
    fn nodes(&mut self, p: NodeId, q: NodeId, pending: &mut Vec<(&'g Value, &'g Value)>) -> bool {
        if let Some(&mapped) = self.forward.get(&p) {
            return mapped == q;
        }
        if let Some(&mapped) = self.backward.get(&q) {
            return mapped == p;
        }
        self.forward.insert(p, q);
        self.backward.insert(q, p);

        let (a, b) = (self.a, self.b);
        let (Ok(x), Ok(y)) = (a.get(p), b.get(q)) else {
            return false;
        };

        match (x, y) {
            (Reference::Array(xs), Reference::Array(ys)) => {
                if xs.len() != ys.len() {
                    return false;
                }
                pending.extend(xs.iter().zip(ys));
                true
            }
            (Reference::Object(xo), Reference::Object(yo)) => {
                let shape_matches = xo.class_name == yo.class_name
                    && xo.ivars.len() == yo.ivars.len()
                    && xo.ivars.iter().zip(&yo.ivars).all(|((xk, _), (yk, _))| xk == yk);
                if !shape_matches {
                    return false;
                }
                pending.extend(xo.ivars.iter().zip(&yo.ivars).map(|((_, xv), (_, yv))| (xv, yv)));
                true
            }
            (Reference::String, Reference::String) => true,
            _ => false,
        }
    }
}
