//! Shallow and deep structural cloning.
//!
//! Both entry points report through [`CloneResult`] instead of panicking or
//! returning `Err`: a shallow clone of a primitive fails softly and hands the
//! original value back, a deep clone always succeeds.

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::kind::{ValueKind, classify, classify_object};
use crate::memo::Memo;
use crate::value::{Object, ObjectKind, ObjectRef, Record, Value};

/// Diagnostic messages carried by [`CloneResult::msg`].
pub mod msg {
    pub const NOT_COMPOSITE: &str = "source is not a composite value";
    pub const SHALLOW: &str = "shallow copy created";
    pub const PRIMITIVE: &str = "primitive value needs no copy";
    pub const SHARED: &str = "reused clone of an already visited composite";
    pub const INSTANT: &str = "instant cloned";
    pub const PATTERN: &str = "pattern cloned";
    pub const SET: &str = "set cloned";
    pub const MAP: &str = "map cloned";
    pub const SEQUENCE: &str = "sequence cloned";
    pub const RECORD: &str = "record cloned";
}

#[derive(Debug, Error)]
pub enum CloneError {
    /// Shallow copy of something that is not a composite. The original value
    /// is handed back untouched.
    #[error("cannot copy a {kind} value: {message}")]
    InvalidInputKind {
        kind: ValueKind,
        message: &'static str,
        value: Value,
    },
}

/// Outcome of a clone operation.
///
/// When `status` is false, `data` is the caller's own value, not a copy.
#[derive(Clone, Debug)]
pub struct CloneResult {
    pub status: bool,
    pub msg: &'static str,
    pub data: Value,
}

impl CloneResult {
    fn success(msg: &'static str, data: Value) -> Self {
        Self {
            status: true,
            msg,
            data,
        }
    }

    fn failure(msg: &'static str, data: Value) -> Self {
        Self {
            status: false,
            msg,
            data,
        }
    }

    pub fn into_result(self) -> Result<Value, CloneError> {
        if self.status {
            Ok(self.data)
        } else {
            Err(CloneError::InvalidInputKind {
                kind: classify(&self.data),
                message: self.msg,
                value: self.data,
            })
        }
    }
}

/// One-level copy.
///
/// Sequences become new sequences holding the same elements; every other
/// composite becomes a record holding its enumerable string-keyed own
/// properties. Nested composites are shared with the source.
pub fn shallow_clone(source: &Value) -> CloneResult {
    let Value::Object(original) = source else {
        log::debug!("shallow clone rejected a {} value", classify(source));
        return CloneResult::failure(msg::NOT_COMPOSITE, source.clone());
    };
    let object = original.borrow();

    let mut copy = match object.kind() {
        ObjectKind::Sequence(items) => Object::sequence(items.clone()),
        _ => Object::record(),
    };
    let properties = object.properties();
    for key in properties.enumerable_keys() {
        if let Some(value) = properties.get(&key) {
            copy.properties_mut().insert(key, value.clone());
        }
    }

    CloneResult::success(msg::SHALLOW, Value::from(copy))
}

/// Full recursive copy with a fresh memo.
pub fn deep_clone(source: &Value) -> CloneResult {
    let mut memo = Memo::new();
    let result = deep_clone_with(source, &mut memo);
    let stats = memo.stats();
    log::debug!(
        "deep clone of {} done: {} composites cloned, {} shared references reused",
        classify(source),
        stats.registered,
        stats.hits
    );
    result
}

/// Full recursive copy through a caller-owned memo.
///
/// Reusing one memo across calls makes later calls reuse clones made by
/// earlier ones, so identity shared between separate sources stays shared
/// between their copies.
pub fn deep_clone_with(source: &Value, memo: &mut Memo) -> CloneResult {
    let Value::Object(original) = source else {
        return CloneResult::success(msg::PRIMITIVE, source.clone());
    };
    if let Some(clone) = memo.resolve(original) {
        return CloneResult::success(msg::SHARED, Value::Object(clone));
    }

    let object = original.borrow();
    log::trace!("cloning {} {:?}", classify_object(&object), original);

    let (clone, message) = match object.kind() {
        ObjectKind::Instant(time) => (register(memo, original, Object::instant(*time)), msg::INSTANT),
        ObjectKind::Pattern(pattern) => (
            register(memo, original, Object::pattern(pattern.duplicate())),
            msg::PATTERN,
        ),
        ObjectKind::Set(members) => {
            let clone = register(memo, original, Object::set(IndexSet::with_capacity(members.len())));
            for member in members {
                let member = deep_clone_with(member, memo).data;
                clone.add(member);
            }
            (clone, msg::SET)
        }
        ObjectKind::Map(entries) => {
            let clone = register(memo, original, Object::map(IndexMap::with_capacity(entries.len())));
            for (key, value) in entries {
                let key = deep_clone_with(key, memo).data;
                let value = deep_clone_with(value, memo).data;
                clone.map_insert(key, value);
            }
            (clone, msg::MAP)
        }
        ObjectKind::Sequence(items) => {
            let clone = register(memo, original, Object::sequence(Vec::with_capacity(items.len())));
            for item in items {
                let item = deep_clone_with(item, memo).data;
                clone.push(item);
            }
            clone_own_properties(object.properties(), &clone, memo);
            (clone, msg::SEQUENCE)
        }
        // Functions are opaque: only their own properties carry over.
        ObjectKind::Record | ObjectKind::Function(_) => {
            let clone = register(memo, original, Object::record());
            clone_own_properties(object.properties(), &clone, memo);
            (clone, msg::RECORD)
        }
    };

    CloneResult::success(message, Value::Object(clone))
}

fn register(memo: &mut Memo, original: &ObjectRef, object: Object) -> ObjectRef {
    let clone = ObjectRef::new(object);
    memo.register(original, &clone);
    clone
}

/// Every own key, hidden and symbol keys included; enumerability is kept.
fn clone_own_properties(properties: &Record, target: &ObjectRef, memo: &mut Memo) {
    for key in properties.own_keys() {
        let Some(property) = properties.property(&key) else {
            continue;
        };
        let value = deep_clone_with(&property.value, memo).data;
        target.define(key, value, property.enumerable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::structurally_eq;

    #[test]
    fn test_shallow_rejects_primitives() {
        for value in [Value::number(5.0), Value::Null, Value::Undefined, Value::text("x")] {
            let result = shallow_clone(&value);
            assert!(!result.status);
            assert_eq!(result.msg, msg::NOT_COMPOSITE);
            assert_eq!(result.data, value);
        }
    }

    #[test]
    fn test_into_result() {
        let ok = deep_clone(&Value::number(1.0)).into_result();
        assert_eq!(ok.ok(), Some(Value::number(1.0)));

        match shallow_clone(&Value::number(5.0)).into_result() {
            Err(CloneError::InvalidInputKind { kind, value, .. }) => {
                assert_eq!(kind, ValueKind::Primitive);
                assert_eq!(value, Value::number(5.0));
            }
            Ok(_) => panic!("primitive must not shallow clone"),
        }
    }

    #[test]
    fn test_error_message() {
        let error = shallow_clone(&Value::Null).into_result().unwrap_err();
        assert_eq!(
            error.to_string(),
            "cannot copy a primitive value: source is not a composite value"
        );
    }

    #[test]
    fn test_deep_messages_name_the_kind() {
        assert_eq!(deep_clone(&Value::Null).msg, msg::PRIMITIVE);
        assert_eq!(deep_clone(&Value::set([])).msg, msg::SET);
        assert_eq!(deep_clone(&Value::map([])).msg, msg::MAP);
        assert_eq!(deep_clone(&Value::sequence([])).msg, msg::SEQUENCE);
        assert_eq!(
            deep_clone(&Value::record([("a", Value::Null)])).msg,
            msg::RECORD
        );
    }

    #[test]
    fn test_memo_is_filled_before_children() {
        let root = Value::record(std::iter::empty::<(&str, Value)>());
        let object = root.as_object().cloned().unwrap();
        object.set("self", root.clone());

        let mut memo = Memo::new();
        let copy = deep_clone_with(&root, &mut memo).data;
        assert_eq!(memo.len(), 1);
        assert_eq!(memo.stats().hits, 1);
        assert!(memo.get(&object).is_some_and(|c| Some(c) == copy.as_object()));
    }

    #[test]
    fn test_deep_clone_is_structurally_equal() {
        let source = Value::record([
            ("list", Value::sequence([Value::number(1.0), Value::text("two")])),
            ("set", Value::set([Value::number(3.0)])),
        ]);
        let copy = deep_clone(&source).data;
        assert_ne!(copy, source);
        assert!(structurally_eq(&copy, &source));
    }
}
