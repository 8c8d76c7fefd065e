// ============================================================================
// spark-observables - Observable Engine
// Plain data turned into change-tracked objects, over any reactive runtime
// ============================================================================
//
// The engine owns the data model (values, raw targets, administrations) and
// reaches the reactive runtime only through `GraphCapabilities`. The
// functions below are its introspection surface.
// ============================================================================

pub mod administration;
pub mod class;
pub mod error;
pub mod graph;
pub mod proxy;
pub mod target;
pub mod value;

use std::rc::Rc;

pub use administration::ObjectAdministration;
pub use class::ObservableClass;
pub use error::{ObservableError, Result};
pub use graph::{
    create_graph, AtomNode, ComputeFn, ComputedNode, Graph, GraphCapabilities, GraphOptions,
    InternalNode, NodeId, SigilWrites, Subscription,
};
pub use proxy::Observable;
pub use target::{Getter, Property, PropertyReader, Target, MAX_ARRAY_LENGTH};
pub use value::{Key, Value};

/// Wrap objects and arrays for `graph`.
///
/// Observables already bound to `graph` come back as they are; ones bound to
/// another graph are re-bound. Primitives and frozen targets are returned
/// unchanged.
pub fn get_observable(value: Value, graph: &Graph) -> Value {
    match value {
        Value::Object(target) if !target.is_frozen() => {
            Value::Observable(Observable::bind(target, graph))
        }
        Value::Observable(o) if !o.graph().ptr_eq(graph) => {
            Value::Observable(Observable::bind(o.source(), graph))
        }
        other => other,
    }
}

/// Unwrap an observable to its raw target. Anything else is returned as is.
pub fn get_source(value: Value) -> Value {
    match value {
        Value::Observable(o) => Value::Object(o.source()),
        other => other,
    }
}

/// Build a tracked instance of `instance`. Frozen layouts are wrapped too;
/// their writes fail instead.
pub fn get_observable_class_instance<T: ObservableClass>(instance: T, graph: &Graph) -> Observable {
    Observable::bind(instance.into_target(), graph)
}

pub fn get_administration(value: &Value) -> Result<Rc<ObjectAdministration>> {
    match value {
        Value::Observable(o) => Ok(o.administration().clone()),
        other => Err(ObservableError::NotObservable { kind: other.kind() }),
    }
}

pub fn get_internal_node(object: &Observable, key: impl Into<Key>) -> InternalNode {
    object.administration().internal_node(&key.into())
}

pub fn is_observable(value: &Value) -> bool {
    matches!(value, Value::Observable(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{graph, signals_graph};

    #[test]
    fn primitives_pass_through() {
        let g = graph();
        assert_eq!(get_observable(Value::from(3), &g), Value::from(3));
        assert_eq!(get_source(Value::from("s")), Value::from("s"));
        assert!(!is_observable(&Value::Null));
    }

    #[test]
    fn frozen_targets_are_declined() {
        let t = Target::object();
        t.freeze();
        assert!(!is_observable(&get_observable(Value::from(t), &graph())));
    }

    #[test]
    fn rebinding_to_another_graph() {
        let a = graph();
        let b = signals_graph(GraphOptions::default());
        let target = Target::object();

        let in_a = get_observable(Value::from(target.clone()), &a);
        let again = get_observable(in_a.clone(), &a);
        assert_eq!(in_a, again);

        let in_b = get_observable(in_a.clone(), &b);
        assert_ne!(in_a, in_b);
        assert!(in_b.as_observable().unwrap().graph().ptr_eq(&b));
        assert_eq!(get_source(in_b), Value::from(target));
    }

    #[test]
    fn internal_node_kinds() {
        let o = get_observable_class_instance(
            Target::object()
                .with("a", 1)
                .with_getter("b", |this| this.get("a")),
            &graph(),
        );

        assert!(!get_internal_node(&o, "a").is_computed());
        assert!(get_internal_node(&o, "b").is_computed());
        assert!(!get_internal_node(&o, "missing").is_computed());
        assert_eq!(get_internal_node(&o, "a").id(), get_internal_node(&o, "a").id());
        assert_ne!(get_internal_node(&o, "a").id(), get_internal_node(&o, "missing").id());
    }

    #[test]
    fn administration_requires_observable() {
        assert_eq!(
            get_administration(&Value::from(1)).err(),
            Some(ObservableError::NotObservable { kind: "number" })
        );
        let raw = Value::from(Target::array());
        assert_eq!(
            get_administration(&raw).err(),
            Some(ObservableError::NotObservable { kind: "array" })
        );
    }
}
