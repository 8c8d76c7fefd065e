// ============================================================================
// spark-observables - Observable Classes
// ============================================================================

use super::target::Target;

/// A model type that can be turned into a tracked instance.
///
/// `into_target` lays the instance out as a raw object: plain fields become
/// fields, derived accessors become getters. `construct` then returns the
/// tracked instance, getters memoized as computeds.
///
/// ```
/// use spark_observables::{construct, ObservableClass, Target, Value};
///
/// struct Counter {
///     count: f64,
/// }
///
/// impl ObservableClass for Counter {
///     fn into_target(self) -> Target {
///         Target::object()
///             .with("count", self.count)
///             .with_getter("double", |this| {
///                 Value::from(this.get("count").as_f64().unwrap_or(0.0) * 2.0)
///             })
///     }
/// }
///
/// let counter = construct(Counter { count: 2.0 });
/// counter.set("count", 3).unwrap();
/// assert_eq!(counter.get("double"), Value::from(6));
/// ```
pub trait ObservableClass {
    fn into_target(self) -> Target;
}

impl ObservableClass for Target {
    fn into_target(self) -> Target {
        self
    }
}
