//! Deep clone: kind dispatch, independence and idempotence.

use boon_clone::{
    Function, ObjectKind, Pattern, PropertyKey, Symbol, Value, ValueKind, classify, deep_clone,
    structurally_eq,
};
use chrono::{TimeZone, Utc};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn empty_record() -> Value {
    Value::record(std::iter::empty::<(&str, Value)>())
}

#[test]
fn primitives_pass_through() {
    init_logger();
    let five = deep_clone(&Value::number(5.0));
    assert!(five.status);
    assert_eq!(five.data, Value::number(5.0));

    let null = deep_clone(&Value::Null);
    assert!(null.status);
    assert_eq!(null.data, Value::Null);

    let symbol = Value::symbol(Some("id"));
    assert_eq!(deep_clone(&symbol).data, symbol);
}

#[test]
fn nested_sequence_is_independent() {
    init_logger();
    let src = Value::record([(
        "a",
        Value::sequence([Value::number(1.0), Value::number(2.0), Value::number(3.0)]),
    )]);
    let copy = deep_clone(&src).data;

    let copied_list = copy.as_object().and_then(|o| o.get("a")).unwrap();
    let original_list = src.as_object().and_then(|o| o.get("a")).unwrap();
    assert_ne!(copied_list, original_list);

    copied_list.as_object().unwrap().push(Value::number(4.0));
    copied_list.as_object().unwrap().set("0", Value::number(100.0));

    assert_eq!(
        original_list.as_object().unwrap().elements(),
        vec![Value::number(1.0), Value::number(2.0), Value::number(3.0)]
    );
}

#[test]
fn cloning_twice_gives_equal_results_and_leaves_source_alone() {
    init_logger();
    let time = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
    let src = Value::record([
        ("when", Value::instant(time)),
        ("tags", Value::set([Value::text("a"), Value::text("b")])),
        ("lookup", Value::map([(Value::text("k"), Value::sequence([Value::Null]))])),
        ("pattern", Value::pattern(Pattern::new("x+", "gi").unwrap())),
    ]);
    let snapshot = deep_clone(&src).data;

    let first = deep_clone(&src).data;
    let second = deep_clone(&src).data;
    assert!(structurally_eq(&first, &second));
    assert!(structurally_eq(&first, &src));
    assert!(structurally_eq(&src, &snapshot));
}

#[test]
fn instant_keeps_time_value() {
    init_logger();
    let time = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap();
    let src = Value::instant(time);
    let result = deep_clone(&src);
    assert_eq!(classify(&result.data), ValueKind::Instant);
    assert_ne!(result.data, src);

    let copy = result.data.as_object().unwrap();
    assert_eq!(copy.instant(), Some(time));

    let later = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    copy.set_instant(later);
    assert_eq!(src.as_object().unwrap().instant(), Some(time));
}

#[test]
fn set_order_is_preserved() {
    init_logger();
    let src = Value::set([Value::number(3.0), Value::number(1.0), Value::number(2.0)]);
    let copy = deep_clone(&src).data;
    assert_eq!(
        copy.as_object().unwrap().members(),
        vec![Value::number(3.0), Value::number(1.0), Value::number(2.0)]
    );
}

#[test]
fn set_members_are_deep_cloned() {
    init_logger();
    let member = Value::record([("n", Value::number(1.0))]);
    let src = Value::set([member.clone()]);
    let copy = deep_clone(&src).data;

    let members = copy.as_object().unwrap().members();
    assert_eq!(members.len(), 1);
    assert_ne!(members[0], member);
    assert!(structurally_eq(&members[0], &member));
    assert!(!copy.as_object().unwrap().has(&member));
}

#[test]
fn map_order_is_preserved_and_keys_are_cloned() {
    init_logger();
    let object_key = Value::record([("id", Value::number(7.0))]);
    let src = Value::map([
        (Value::text("z"), Value::number(1.0)),
        (object_key.clone(), Value::text("object")),
        (Value::text("a"), Value::number(2.0)),
    ]);
    let copy = deep_clone(&src).data;
    let entries = copy.as_object().unwrap().map_entries();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0], (Value::text("z"), Value::number(1.0)));
    assert_eq!(entries[2], (Value::text("a"), Value::number(2.0)));

    let (copied_key, copied_value) = &entries[1];
    assert_ne!(copied_key, &object_key);
    assert!(structurally_eq(copied_key, &object_key));
    assert_eq!(copied_value, &Value::text("object"));
    assert_eq!(copy.as_object().unwrap().map_get(&object_key), None);
}

#[test]
fn hidden_and_symbol_keys_survive() {
    init_logger();
    let marker = Symbol::new(Some("marker"));
    let src = empty_record();
    let object = src.as_object().unwrap();
    object.set("visible", Value::number(1.0));
    object.define("hidden", Value::number(2.0), false);
    object.set(&marker, Value::text("symbolic"));

    let copy = deep_clone(&src).data;
    let copy = copy.as_object().unwrap();
    assert_eq!(copy.own_keys(), object.own_keys());
    assert_eq!(copy.get("hidden"), Some(Value::number(2.0)));
    assert_eq!(copy.get(&marker), Some(Value::text("symbolic")));

    let hidden = copy.borrow().properties().property(&PropertyKey::from("hidden")).cloned();
    assert_eq!(hidden.map(|p| p.enumerable), Some(false));
}

#[test]
fn sequence_properties_survive() {
    init_logger();
    let src = Value::sequence([Value::text("x")]);
    src.as_object().unwrap().set("label", Value::text("list"));

    let copy = deep_clone(&src).data;
    let copy = copy.as_object().unwrap();
    assert_eq!(copy.elements(), vec![Value::text("x")]);
    assert_eq!(copy.get("label"), Some(Value::text("list")));
    assert_eq!(classify(&Value::Object(copy.clone())), ValueKind::Sequence);
}

#[test]
fn function_becomes_record_of_its_properties() {
    init_logger();
    let function = Value::function(Function::new("double", |args| {
        let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
        Value::number(n * 2.0)
    }));
    function.as_object().unwrap().set("arity", Value::number(1.0));

    let result = deep_clone(&function);
    assert!(result.status);
    let copy = result.data.as_object().unwrap();
    assert_eq!(copy.kind_name(), "Record");
    assert_eq!(copy.get("arity"), Some(Value::number(1.0)));

    let callable = match &*function.as_object().unwrap().borrow().kind() {
        ObjectKind::Function(callable) => Some(callable.clone()),
        _ => None,
    };
    let callable = callable.unwrap();
    assert_eq!(callable.name(), "double");
    assert_eq!(callable.call(&[Value::number(4.0)]), Value::number(8.0));
}
