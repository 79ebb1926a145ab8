//! Runtime values the structural cloner operates on.
//!
//! Primitives are plain data and compare by value. Composites live behind an
//! [`ObjectRef`] (`Rc<RefCell<Object>>`) and compare and hash by identity, so
//! a composite can be a set member or a map key the same way it can in a
//! dynamic runtime (SameValueZero).

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use ordered_float::OrderedFloat;

use crate::pattern::Pattern;

/// A runtime value.
///
/// Cloning a `Value` is O(1): composites share the same [`ObjectRef`].
/// Use [`crate::deep_clone`] for an independent copy.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    /// Absent value
    Undefined,
    /// Explicit empty value
    Null,
    Bool(bool),
    /// Number with total equality (NaN equals NaN, -0 equals +0)
    Number(OrderedFloat<f64>),
    Text(Rc<str>),
    Symbol(Symbol),
    /// Any composite, compared by identity
    Object(ObjectRef),
}

impl Value {
    pub fn number(n: f64) -> Self {
        Value::Number(OrderedFloat(n))
    }

    pub fn text(s: impl Into<Rc<str>>) -> Self {
        Value::Text(s.into())
    }

    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn symbol(description: Option<&str>) -> Self {
        Value::Symbol(Symbol::new(description))
    }

    /// Record with enumerable fields in the given order.
    pub fn record(fields: impl IntoIterator<Item = (impl Into<PropertyKey>, Value)>) -> Self {
        let mut object = Object::record();
        for (key, value) in fields {
            object.properties_mut().insert(key.into(), value);
        }
        Value::from(object)
    }

    pub fn sequence(items: impl IntoIterator<Item = Value>) -> Self {
        Value::from(Object::sequence(items.into_iter().collect()))
    }

    /// Set keeping first-insertion order; duplicates are dropped.
    pub fn set(members: impl IntoIterator<Item = Value>) -> Self {
        Value::from(Object::set(members.into_iter().collect()))
    }

    /// Map keeping first-insertion order of keys; later duplicates overwrite.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::from(Object::map(entries.into_iter().collect()))
    }

    pub fn instant(time: DateTime<Utc>) -> Self {
        Value::from(Object::instant(time))
    }

    pub fn pattern(pattern: Pattern) -> Self {
        Value::from(Object::pattern(pattern))
    }

    pub fn function(function: Function) -> Self {
        Value::from(Object::function(function))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.0),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// `Null` or `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Convert to user-visible display string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if n.0.is_nan() {
                    "NaN".to_string()
                } else if n.0.is_infinite() {
                    let sign = if n.0 > 0.0 { "" } else { "-" };
                    format!("{sign}Infinity")
                } else if n.0 == n.0.trunc() && n.0.abs() < 1e15 {
                    format!("{}", n.0 as i64)
                } else {
                    format!("{}", n.0)
                }
            }
            Value::Text(s) => s.to_string(),
            Value::Symbol(symbol) => format!("Symbol({})", symbol.description().unwrap_or("")),
            // Composites may be cyclic, so only the kind is shown
            Value::Object(object) => format!("[object {}]", object.kind_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(ObjectRef::new(object))
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

// ----- Symbols -----

struct SymbolData {
    description: Option<Box<str>>,
}

/// Unique token usable as a property key. Two symbols are equal only if they
/// are the same symbol, whatever their descriptions.
#[derive(Clone)]
pub struct Symbol(Rc<SymbolData>);

impl Symbol {
    pub fn new(description: Option<&str>) -> Self {
        Self(Rc::new(SymbolData {
            description: description.map(Into::into),
        }))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

// ----- Properties -----

/// Own-property key: a string or a symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(Rc<str>),
    Symbol(Symbol),
}

impl PropertyKey {
    /// Canonical array index (`"0"`, `"17"`, not `"017"` or `"+1"`).
    pub fn array_index(&self) -> Option<u32> {
        let PropertyKey::String(name) = self else {
            return None;
        };
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if name.len() > 1 && name.starts_with('0') {
            return None;
        }
        name.parse::<u32>().ok().filter(|index| *index != u32::MAX)
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::String(name.into())
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        PropertyKey::String(name.into())
    }
}

impl From<Symbol> for PropertyKey {
    fn from(symbol: Symbol) -> Self {
        PropertyKey::Symbol(symbol)
    }
}

impl From<&Symbol> for PropertyKey {
    fn from(symbol: &Symbol) -> Self {
        PropertyKey::Symbol(symbol.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub value: Value,
    pub enumerable: bool,
}

/// Own-property table of a composite.
#[derive(Clone, Debug, Default)]
pub struct Record {
    entries: IndexMap<PropertyKey, Property>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&Value> {
        self.entries.get(key).map(|property| &property.value)
    }

    pub fn property(&self, key: &PropertyKey) -> Option<&Property> {
        self.entries.get(key)
    }

    /// Assign a value. New keys are enumerable; existing keys keep their
    /// enumerability.
    pub fn insert(&mut self, key: PropertyKey, value: Value) -> Option<Value> {
        match self.entries.get_mut(&key) {
            Some(property) => Some(std::mem::replace(&mut property.value, value)),
            None => {
                self.entries.insert(
                    key,
                    Property {
                        value,
                        enumerable: true,
                    },
                );
                None
            }
        }
    }

    /// Insert or overwrite a property with explicit enumerability.
    pub fn define(&mut self, key: PropertyKey, value: Value, enumerable: bool) {
        self.entries.insert(key, Property { value, enumerable });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All own keys: array indices ascending, then other strings in
    /// insertion order, then symbols in insertion order.
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut indices = Vec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for key in self.entries.keys() {
            match (key, key.array_index()) {
                (PropertyKey::String(_), Some(index)) => indices.push((index, key)),
                (PropertyKey::String(_), None) => strings.push(key),
                (PropertyKey::Symbol(_), _) => symbols.push(key),
            }
        }
        indices.sort_by_key(|(index, _)| *index);
        indices
            .into_iter()
            .map(|(_, key)| key)
            .chain(strings)
            .chain(symbols)
            .cloned()
            .collect()
    }

    /// Enumerable string keys in own-key order. Symbol keys are never listed.
    pub fn enumerable_keys(&self) -> Vec<PropertyKey> {
        self.own_keys()
            .into_iter()
            .filter(|key| matches!(key, PropertyKey::String(_)))
            .filter(|key| self.entries.get(key).is_some_and(|p| p.enumerable))
            .collect()
    }
}

// ----- Functions -----

/// Opaque callable. The cloner never looks inside it.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    body: Rc<dyn Fn(&[Value]) -> Value>,
}

impl Function {
    pub fn new(name: impl Into<Rc<str>>, body: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self {
            name: name.into(),
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.body)(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

// ----- Objects -----

/// Kind-specific payload of a composite.
#[derive(Clone, Debug)]
pub enum ObjectKind {
    /// Plain keyed record, all state is in the property table
    Record,
    /// Ordered sequence
    Sequence(Vec<Value>),
    /// Unique-value set, insertion ordered
    Set(IndexSet<Value>),
    /// Key-value map, insertion ordered
    Map(IndexMap<Value, Value>),
    /// Date/time instant
    Instant(DateTime<Utc>),
    /// Stateful pattern (regex-like) value
    Pattern(Pattern),
    Function(Function),
}

/// A composite: kind payload plus own properties.
#[derive(Clone, Debug)]
pub struct Object {
    kind: ObjectKind,
    properties: Record,
}

impl Object {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: Record::new(),
        }
    }

    pub fn record() -> Self {
        Self::new(ObjectKind::Record)
    }

    pub fn sequence(items: Vec<Value>) -> Self {
        Self::new(ObjectKind::Sequence(items))
    }

    pub fn set(members: IndexSet<Value>) -> Self {
        Self::new(ObjectKind::Set(members))
    }

    pub fn map(entries: IndexMap<Value, Value>) -> Self {
        Self::new(ObjectKind::Map(entries))
    }

    pub fn instant(time: DateTime<Utc>) -> Self {
        Self::new(ObjectKind::Instant(time))
    }

    pub fn pattern(pattern: Pattern) -> Self {
        Self::new(ObjectKind::Pattern(pattern))
    }

    pub fn function(function: Function) -> Self {
        Self::new(ObjectKind::Function(function))
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn properties(&self) -> &Record {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Record {
        &mut self.properties
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Record => "Record",
            ObjectKind::Sequence(_) => "Sequence",
            ObjectKind::Set(_) => "Set",
            ObjectKind::Map(_) => "Map",
            ObjectKind::Instant(_) => "Instant",
            ObjectKind::Pattern(_) => "Pattern",
            ObjectKind::Function(_) => "Function",
        }
    }

    /// Own keys: sequence indices first, then the property table's own keys.
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let indices = match &self.kind {
            ObjectKind::Sequence(items) => items.len(),
            _ => 0,
        };
        let shadowed = |key: &PropertyKey| key.array_index().is_some_and(|i| (i as usize) < indices);
        (0..indices)
            .map(|index| PropertyKey::from(index.to_string()))
            .chain(self.properties.own_keys().into_iter().filter(|key| !shadowed(key)))
            .collect()
    }

    /// Look up an own key, including sequence indices.
    pub fn get(&self, key: &PropertyKey) -> Option<Value> {
        if let (ObjectKind::Sequence(items), Some(index)) = (&self.kind, key.array_index()) {
            if let Some(item) = items.get(index as usize) {
                return Some(item.clone());
            }
        }
        self.properties.get(key).cloned()
    }

    /// Write a sequence element, growing the sequence with `Undefined` up to
    /// `index`. Returns false for other kinds.
    fn write_element(&mut self, index: u32, value: Value) -> bool {
        let ObjectKind::Sequence(items) = &mut self.kind else {
            return false;
        };
        let index = index as usize;
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value;
        true
    }
}

/// Identity of a composite, valid while the composite is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

/// Shared, mutable handle to a composite.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    pub fn id(&self) -> ObjectId {
        ObjectId(Rc::as_ptr(&self.0).cast::<()>() as usize)
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn kind_name(&self) -> &'static str {
        match self.0.try_borrow() {
            Ok(object) => object.kind_name(),
            Err(_) => "Object",
        }
    }

    /// Empty the container and drop all properties, keeping the kind.
    ///
    /// `Rc` graphs with cycles are never freed on their own; clearing any
    /// object on each cycle releases them.
    pub fn clear(&self) {
        let released = {
            let mut object = self.borrow_mut();
            let emptied = match &object.kind {
                ObjectKind::Sequence(_) => ObjectKind::Sequence(Vec::new()),
                ObjectKind::Set(_) => ObjectKind::Set(IndexSet::new()),
                ObjectKind::Map(_) => ObjectKind::Map(IndexMap::new()),
                other => other.clone(),
            };
            let kind = std::mem::replace(&mut object.kind, emptied);
            let properties = std::mem::take(&mut object.properties);
            (kind, properties)
        };
        // Children may drop other objects; no borrow is held by then
        drop(released);
    }

    // ----- Property helpers -----

    pub fn get(&self, key: impl Into<PropertyKey>) -> Option<Value> {
        self.borrow().get(&key.into())
    }

    /// Assign a property. On a sequence an index key writes the element,
    /// growing the sequence when the index is past its end.
    pub fn set(&self, key: impl Into<PropertyKey>, value: Value) {
        let key = key.into();
        let mut object = self.borrow_mut();
        match key.array_index() {
            Some(index) if matches!(object.kind, ObjectKind::Sequence(_)) => {
                object.write_element(index, value);
            }
            _ => {
                object.properties.insert(key, value);
            }
        }
    }

    /// Like [`ObjectRef::set`] with explicit enumerability. Sequence elements
    /// are always enumerable.
    pub fn define(&self, key: impl Into<PropertyKey>, value: Value, enumerable: bool) {
        let key = key.into();
        let mut object = self.borrow_mut();
        match key.array_index() {
            Some(index) if matches!(object.kind, ObjectKind::Sequence(_)) => {
                object.write_element(index, value);
            }
            _ => object.properties.define(key, value, enumerable),
        }
    }

    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.borrow().own_keys()
    }

    // ----- Sequence helpers -----

    /// Append to a sequence. Returns false for other kinds.
    pub fn push(&self, value: Value) -> bool {
        match &mut self.borrow_mut().kind {
            ObjectKind::Sequence(items) => {
                items.push(value);
                true
            }
            _ => false,
        }
    }

    pub fn element(&self, index: usize) -> Option<Value> {
        match &self.borrow().kind {
            ObjectKind::Sequence(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    pub fn elements(&self) -> Vec<Value> {
        match &self.borrow().kind {
            ObjectKind::Sequence(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    // ----- Set helpers -----

    /// Add a set member. Returns false if it was already present or this is
    /// not a set.
    pub fn add(&self, value: Value) -> bool {
        match &mut self.borrow_mut().kind {
            ObjectKind::Set(members) => members.insert(value),
            _ => false,
        }
    }

    pub fn has(&self, value: &Value) -> bool {
        match &self.borrow().kind {
            ObjectKind::Set(members) => members.contains(value),
            ObjectKind::Map(entries) => entries.contains_key(value),
            _ => false,
        }
    }

    pub fn members(&self) -> Vec<Value> {
        match &self.borrow().kind {
            ObjectKind::Set(members) => members.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    // ----- Map helpers -----

    /// Insert a map entry. Returns false for other kinds.
    pub fn map_insert(&self, key: Value, value: Value) -> bool {
        match &mut self.borrow_mut().kind {
            ObjectKind::Map(entries) => {
                entries.insert(key, value);
                true
            }
            _ => false,
        }
    }

    pub fn map_get(&self, key: &Value) -> Option<Value> {
        match &self.borrow().kind {
            ObjectKind::Map(entries) => entries.get(key).cloned(),
            _ => None,
        }
    }

    pub fn map_entries(&self) -> Vec<(Value, Value)> {
        match &self.borrow().kind {
            ObjectKind::Map(entries) => entries
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    // ----- Instant / pattern helpers -----

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match &self.borrow().kind {
            ObjectKind::Instant(time) => Some(*time),
            _ => None,
        }
    }

    pub fn set_instant(&self, time: DateTime<Utc>) -> bool {
        match &mut self.borrow_mut().kind {
            ObjectKind::Instant(current) => {
                *current = time;
                true
            }
            _ => false,
        }
    }

    /// Run `f` against the pattern payload, if this is a pattern.
    pub fn with_pattern<R>(&self, f: impl FnOnce(&mut Pattern) -> R) -> Option<R> {
        match &mut self.borrow_mut().kind {
            ObjectKind::Pattern(pattern) => Some(f(pattern)),
            _ => None,
        }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

// Shallow on purpose: the graph behind a handle may be cyclic.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{:#x}", self.kind_name(), self.id().0)
    }
}
