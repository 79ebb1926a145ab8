//! Cycle-aware structural comparison.
//!
//! Two values are structurally equal when they have the same shape all the
//! way down: same kinds, same primitives, same keys (in order) with the same
//! enumerability, same set/map iteration order. Pairs of composites already
//! under comparison are assumed equal, which makes the check terminate on
//! cyclic graphs. Sharing topology is not compared.

use rustc_hash::FxHashSet;

use crate::value::{ObjectId, ObjectKind, ObjectRef, Record, Value};

pub fn structurally_eq(a: &Value, b: &Value) -> bool {
    Comparator::default().values_eq(a, b)
}

#[derive(Default)]
struct Comparator {
    assumed: FxHashSet<(ObjectId, ObjectId)>,
}

impl Comparator {
    fn values_eq(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Object(x), Value::Object(y)) => self.objects_eq(x, y),
            _ => a == b,
        }
    }

    fn objects_eq(&mut self, x: &ObjectRef, y: &ObjectRef) -> bool {
        if x.ptr_eq(y) || !self.assumed.insert((x.id(), y.id())) {
            return true;
        }
        let (x, y) = (x.borrow(), y.borrow());

        let payload_eq = match (x.kind(), y.kind()) {
            (ObjectKind::Record, ObjectKind::Record) => true,
            (ObjectKind::Sequence(a), ObjectKind::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(p, q)| self.values_eq(p, q))
            }
            (ObjectKind::Set(a), ObjectKind::Set(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(p, q)| self.values_eq(p, q))
            }
            (ObjectKind::Map(a), ObjectKind::Map(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, va), (kb, vb))| {
                        self.values_eq(ka, kb) && self.values_eq(va, vb)
                    })
            }
            (ObjectKind::Instant(a), ObjectKind::Instant(b)) => a == b,
            (ObjectKind::Pattern(a), ObjectKind::Pattern(b)) => {
                a.source() == b.source()
                    && a.flags() == b.flags()
                    && a.last_index() == b.last_index()
            }
            (ObjectKind::Function(a), ObjectKind::Function(b)) => a.ptr_eq(b),
            _ => false,
        };

        payload_eq && self.records_eq(x.properties(), y.properties())
    }

    fn records_eq(&mut self, a: &Record, b: &Record) -> bool {
        let keys = a.own_keys();
        if keys != b.own_keys() {
            return false;
        }
        keys.iter()
            .all(|key| match (a.property(key), b.property(key)) {
                (Some(p), Some(q)) => {
                    p.enumerable == q.enumerable && self.values_eq(&p.value, &q.value)
                }
                _ => false,
            })
    }
}
