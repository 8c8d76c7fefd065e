use spark_observables::{
    batch, effect, get_signal, object, observable, try_observable, Key, ObservableError,
    PropertySignal, Target, Value,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn counter() -> Rc<Cell<u32>> {
    Rc::new(Cell::new(0))
}

#[test]
fn handle_reflects_value_on_object() {
    let o = try_observable(object! { "value" => 1 }).unwrap();
    let h = get_signal(&o, "value");

    h.set(5).unwrap();
    assert_eq!(o.get("value"), Value::from(5));

    o.set("value", 9).unwrap();
    assert_eq!(h.get(), Value::from(9));
    assert_eq!(h.peek(), Value::from(9));
}

#[test]
fn same_property_same_handle() {
    let o = try_observable(object! { "a" => 1, "b" => 2 }).unwrap();
    let a1 = get_signal(&o, "a");
    let a2 = get_signal(&o, "a");
    let b = get_signal(&o, "b");

    assert_eq!(a1, a2);
    assert_ne!(a1, b);
    assert_eq!(a1.key(), &Key::from("a"));
}

#[test]
fn handles_are_per_object() {
    let raw = object! { "a" => 1 };
    let first = try_observable(raw.clone()).unwrap();
    let second = try_observable(object! { "a" => 1 }).unwrap();

    assert_ne!(get_signal(&first, "a"), get_signal(&second, "a"));

    // Wrapping the same raw object again yields the same node
    let again = try_observable(raw).unwrap();
    assert_eq!(get_signal(&first, "a"), get_signal(&again, "a"));
}

#[test]
fn effect_on_handle_reruns_on_object_write() {
    let o = try_observable(object! { "name" => "Ada" }).unwrap();
    let h = get_signal(&o, "name");
    let seen = Rc::new(RefCell::new(Vec::new()));

    let _e = effect({
        let (h, seen) = (h.clone(), seen.clone());
        move || seen.borrow_mut().push(h.get())
    });

    o.set("name", "Grace").unwrap();
    o.set("name", "Grace").unwrap();
    assert_eq!(*seen.borrow(), vec![Value::from("Ada"), Value::from("Grace")]);
}

#[test]
fn peek_is_isolated() {
    let o = try_observable(object! { "value" => 1 }).unwrap();
    let h = get_signal(&o, "value");
    let runs = counter();

    let _e = effect({
        let (h, runs) = (h.clone(), runs.clone());
        move || {
            let _ = h.peek();
            runs.set(runs.get() + 1);
        }
    });

    o.set("value", 2).unwrap();
    h.set(3).unwrap();
    assert_eq!(runs.get(), 1);
}

#[test]
fn batched_handle_writes_coalesce() {
    let o = try_observable(object! { "a" => 1, "b" => 2 }).unwrap();
    let (a, b) = (get_signal(&o, "a"), get_signal(&o, "b"));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let _e = effect({
        let (o, seen) = (o.clone(), seen.clone());
        move || seen.borrow_mut().push((o.get("a"), o.get("b")))
    });

    batch(|| {
        a.set(1).unwrap();
        a.set(10).unwrap();
        b.set(20).unwrap();
    });

    assert_eq!(
        *seen.borrow(),
        vec![
            (Value::from(1), Value::from(2)),
            (Value::from(10), Value::from(20)),
        ]
    );
}

#[test]
fn derived_field_handle() {
    let o = try_observable(
        Target::object()
            .with("value", 1)
            .with_getter("double", |this| {
                Value::from(this.get("value").as_f64().unwrap_or(0.0) * 2.0)
            }),
    )
    .unwrap();
    let double = get_signal(&o, "double");
    let seen = Rc::new(RefCell::new(Vec::new()));

    let _e = effect({
        let (double, seen) = (double.clone(), seen.clone());
        move || seen.borrow_mut().push(double.get())
    });

    o.set("value", 5).unwrap();
    assert_eq!(*seen.borrow(), vec![Value::from(2), Value::from(10)]);
    assert!(matches!(double, PropertySignal::Derived(_)));
    assert_eq!(
        double.set(1),
        Err(ObservableError::ReadOnly { key: Key::from("double") })
    );
}

#[test]
fn nested_objects_have_their_own_handles() {
    let o = try_observable(object! { "user" => object! { "name" => "Ada" } }).unwrap();
    let user = o.get("user");
    let user = user.as_observable().unwrap();
    let name = get_signal(user, "name");

    user.set("name", "Grace").unwrap();
    assert_eq!(name.get(), Value::from("Grace"));
    assert_eq!(name, get_signal(o.get("user").as_observable().unwrap(), "name"));
}

#[test]
fn writes_to_frozen_objects_fail_through_handle() {
    let raw = object! { "value" => 1 };
    let o = try_observable(raw.clone()).unwrap();
    let h = get_signal(&o, "value");
    raw.freeze();

    assert_eq!(
        h.set(2),
        Err(ObservableError::Frozen { key: Key::from("value") })
    );
    assert_eq!(h.get(), Value::from(1));
}

#[test]
fn raw_writes_need_report_changed() {
    let o = observable(object! { "value" => 1 });
    let obj = o.as_observable().unwrap().clone();
    let h = get_signal(&obj, "value");
    let seen = Rc::new(RefCell::new(Vec::new()));

    let _sub = h.subscribe({
        let seen = seen.clone();
        move |v| seen.borrow_mut().push(v)
    });

    obj.source().set("value", 2).unwrap();
    assert_eq!(h.peek(), Value::from(2));
    assert_eq!(seen.borrow().len(), 1);

    spark_observables::report_changed(&o).unwrap();
    assert_eq!(*seen.borrow(), vec![Value::from(1), Value::from(2)]);
}
