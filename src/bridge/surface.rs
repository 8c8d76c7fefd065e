// ============================================================================
// spark-observables - Observable Surface
// Wrapping, unwrapping and reporting, on the default graph or a given one
// ============================================================================

use crate::observable::{
    get_administration, get_observable, get_observable_class_instance, get_source, Graph,
    Observable, ObservableClass, ObservableError, Result, Value,
};

use super::graph::graph;

/// Wrap objects and arrays on the default graph. Everything the engine
/// declines (primitives, frozen targets) is returned unchanged.
///
/// # Example
///
/// ```
/// use spark_observables::{is_observable, observable, Target, Value};
///
/// let state = observable(Target::object().with("n", 1));
/// assert!(is_observable(&state));
/// assert_eq!(observable(5), Value::from(5));
/// ```
pub fn observable(value: impl Into<Value>) -> Value {
    observable_in(&graph(), value)
}

pub fn observable_in(graph: &Graph, value: impl Into<Value>) -> Value {
    get_observable(value.into(), graph)
}

/// Like [`observable`], but anything that does not come back observable is
/// an error.
pub fn try_observable(value: impl Into<Value>) -> Result<Observable> {
    try_observable_in(&graph(), value)
}

pub fn try_observable_in(graph: &Graph, value: impl Into<Value>) -> Result<Observable> {
    match get_observable(value.into(), graph) {
        Value::Observable(o) => Ok(o),
        Value::Object(_) => Err(ObservableError::NotObservable { kind: "frozen object" }),
        other => Err(ObservableError::NotObservable { kind: other.kind() }),
    }
}

/// The raw data behind an observable; any other value unchanged.
pub fn source(value: impl Into<Value>) -> Value {
    get_source(value.into())
}

pub use crate::observable::is_observable;

/// Build a tracked instance of a model type on the default graph.
pub fn construct<T: ObservableClass>(instance: T) -> Observable {
    construct_in(&graph(), instance)
}

pub fn construct_in<T: ObservableClass>(graph: &Graph, instance: T) -> Observable {
    get_observable_class_instance(instance, graph)
}

/// Notify everything observing `value`, e.g. after mutating its source
/// directly. Returns `value` for chaining.
pub fn report_changed(value: &Value) -> Result<&Value> {
    get_administration(value)?.report_changed();
    Ok(value)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Also observe every object reachable from this one.
    pub deep: bool,
}

impl ObserveOptions {
    pub fn deep() -> Self {
        Self { deep: true }
    }
}

/// Subscribe the running computation to any change of `value`.
pub fn report_observed(value: &Value, options: ObserveOptions) -> Result<&Value> {
    get_administration(value)?.report_observed(options.deep);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::Target;

    #[test]
    fn try_observable_classifies() {
        assert!(try_observable(Target::object()).is_ok());
        assert_eq!(
            try_observable("text").err(),
            Some(ObservableError::NotObservable { kind: "string" })
        );

        let frozen = Target::object();
        frozen.freeze();
        assert_eq!(
            try_observable(frozen).err(),
            Some(ObservableError::NotObservable { kind: "frozen object" })
        );
    }

    #[test]
    fn source_round_trip() {
        let raw = Target::array_from([1]);
        let o = observable(raw.clone());
        assert_eq!(source(o.clone()), Value::from(raw));
        assert_eq!(observable(source(o.clone())), o);
    }

    #[test]
    fn reporting_requires_observable() {
        let raw = Value::from(Target::object());
        assert!(report_changed(&raw).is_err());
        assert!(report_observed(&raw, ObserveOptions::default()).is_err());

        let o = observable(Target::object());
        assert!(report_changed(&o).is_ok_and(|v| *v == o));
    }
}
