// ============================================================================
// spark-observables - Ergonomic Macros
// ============================================================================

/// Clone variables into a move closure.
///
/// ```rust
/// use spark_observables::{cloned, computed, signal};
///
/// let a = signal(1);
/// let b = signal(2);
/// let sum = computed(cloned!(a, b => move || a.get() + b.get()));
/// assert_eq!(sum.get(), 3);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// `computed(cloned!(deps => move || body))`.
///
/// ```rust
/// use spark_observables::{computed, signal};
///
/// let n = signal(2);
/// let squared = computed!(n => n.get() * n.get());
/// assert_eq!(squared.get(), 4);
/// ```
#[macro_export]
macro_rules! computed {
    ($($deps:ident),+ => $body:expr) => {
        $crate::computed($crate::cloned!($($deps),+ => move || $body))
    };
    ($body:expr) => {
        $crate::computed(move || $body)
    };
}

/// `effect(cloned!(deps => move || body))`.
///
/// ```rust
/// use spark_observables::{effect, observable, Target};
///
/// let state = observable(Target::object().with("n", 1));
/// let _e = effect!(state => {
///     println!("n = {}", state.as_observable().map(|o| o.get("n")).unwrap_or_default());
/// });
/// ```
#[macro_export]
macro_rules! effect {
    ($($deps:ident),+ => $body:expr) => {
        $crate::effect($crate::cloned!($($deps),+ => move || { $body; }))
    };
    ($body:expr) => {
        $crate::effect(move || { $body; })
    };
}

/// Build a raw object [`Target`](crate::Target) from `key => value` pairs.
///
/// ```rust
/// use spark_observables::{object, Value};
///
/// let point = object! { "x" => 1, "y" => 2.5, "label" => "origin" };
/// assert_eq!(point.get("y"), Value::from(2.5));
/// ```
#[macro_export]
macro_rules! object {
    () => {
        $crate::Target::object()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Target::object()$(.with($key, $value))+
    };
}

/// Build a raw array [`Target`](crate::Target).
///
/// ```rust
/// use spark_observables::array;
///
/// let list = array![1, "two", true];
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! array {
    () => {
        $crate::Target::array()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Target::array_from([$($crate::Value::from($value)),+])
    };
}
