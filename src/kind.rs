//! Runtime kind classification.

use std::fmt;

use crate::value::{Object, ObjectKind, Value};

/// The closed set of kinds the cloner dispatches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Undefined, null, booleans, numbers, text and symbols
    Primitive,
    Instant,
    Pattern,
    Set,
    Map,
    Sequence,
    /// Plain keyed record; anything composite without its own rule lands here
    Record,
}

impl ValueKind {
    pub fn is_composite(self) -> bool {
        self != ValueKind::Primitive
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Primitive => "primitive",
            ValueKind::Instant => "instant",
            ValueKind::Pattern => "pattern",
            ValueKind::Set => "set",
            ValueKind::Map => "map",
            ValueKind::Sequence => "sequence",
            ValueKind::Record => "record",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn classify(value: &Value) -> ValueKind {
    match value {
        Value::Object(object) => classify_object(&object.borrow()),
        _ => ValueKind::Primitive,
    }
}

pub fn classify_object(object: &Object) -> ValueKind {
    match object.kind() {
        ObjectKind::Instant(_) => ValueKind::Instant,
        ObjectKind::Pattern(_) => ValueKind::Pattern,
        ObjectKind::Set(_) => ValueKind::Set,
        ObjectKind::Map(_) => ValueKind::Map,
        ObjectKind::Sequence(_) => ValueKind::Sequence,
        ObjectKind::Record | ObjectKind::Function(_) => ValueKind::Record,
    }
}
