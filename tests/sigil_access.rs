use spark_observables::{
    effect, get_signal, object, signals_graph, try_observable, try_observable_in, GraphOptions,
    Key, ObservableError, PropertyAccess, SigilWrites, SignalAccess, Target, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn sigil_aliases_get_signal() {
    let o = try_observable(object! { "foo" => 1 }).unwrap();
    let via_sigil = o.access("$foo").into_signal().unwrap();

    assert_eq!(via_sigil, get_signal(&o, "foo"));
    assert_eq!(via_sigil, o.access("$foo").into_signal().unwrap());

    o.set("foo", 2).unwrap();
    assert_eq!(via_sigil.get(), Value::from(2));
    assert_eq!(get_signal(&o, "foo").get(), Value::from(2));
}

#[test]
fn sigil_on_getter_gives_derived_handle() {
    let o = try_observable(
        Target::object()
            .with("value", 3)
            .with_getter("double", |this| {
                Value::from(this.get("value").as_f64().unwrap_or(0.0) * 2.0)
            }),
    )
    .unwrap();

    let double = o.access("$double").into_signal().unwrap();
    assert!(!double.is_writable());
    assert_eq!(double.get(), Value::from(6));

    o.set("value", 4).unwrap();
    assert_eq!(double.get(), Value::from(8));
}

#[test]
fn existing_literal_names_are_not_intercepted() {
    let o = try_observable(object! { "$price" => "4.20", "price" => 4.2 }).unwrap();
    assert_eq!(o.access("$price"), PropertyAccess::Value(Value::from("4.20")));

    // A literal sigil field can still be written
    o.set("$price", "5.00").unwrap();
    assert_eq!(o.get("$price"), Value::from("5.00"));
}

#[test]
fn sigil_read_does_not_subscribe_the_reader() {
    let o = try_observable(object! { "foo" => 1 }).unwrap();
    let handles = Rc::new(RefCell::new(Vec::new()));

    let _e = effect({
        let (o, handles) = (o.clone(), handles.clone());
        move || handles.borrow_mut().push(o.access("$foo"))
    });

    o.set("foo", 2).unwrap();
    assert_eq!(handles.borrow().len(), 1);
}

#[test]
fn sigil_writes_are_rejected_by_default() {
    let o = try_observable(object! { "foo" => 1 }).unwrap();
    assert_eq!(
        o.set("$foo", 2),
        Err(ObservableError::SigilWrite { key: Key::from("$foo") })
    );
    assert!(!o.source().has("$foo"));
    assert_eq!(o.get("foo"), Value::from(1));
}

#[test]
fn literal_policy_creates_a_field() {
    let graph = signals_graph(GraphOptions::default().with_sigil_writes(SigilWrites::Literal));
    let o = try_observable_in(&graph, object! { "foo" => 1 }).unwrap();

    assert_eq!(o.set("$foo", 2), Ok(true));
    // Now a real property, so it shadows the signal alias
    assert_eq!(o.access("$foo"), PropertyAccess::Value(Value::from(2)));
    assert_eq!(o.get("foo"), Value::from(1));
}

#[test]
fn sigil_works_on_array_indices() {
    let list = try_observable(spark_observables::array!["a", "b"]).unwrap();
    let second = list.access("$1").into_signal().unwrap();

    list.set(1, "B").unwrap();
    assert_eq!(second.get(), Value::from("B"));
    assert_eq!(second, get_signal(&list, 1));
}
