//! Construction macro for [`JsonValue`](crate::JsonValue) trees.

/// Builds a [`JsonValue`](crate::JsonValue) from JSON-like syntax.
///
/// Keys must be string literals; values may be any expression convertible
/// into a `JsonValue`.
///
/// # Examples
///
/// ```rust
/// use jsonbind::jval;
///
/// let user = jval!({
///     "name": "Alice",
///     "age": 30,
///     "roles": ["admin", "ops"],
///     "manager": null
/// });
/// assert!(user.is_object());
///
/// let nums = jval!([1, 2.5, "three"]);
/// assert!(nums.is_array());
/// ```
#[macro_export]
macro_rules! jval {
    (null) => {
        $crate::JsonValue::Null
    };
    (true) => {
        $crate::JsonValue::Bool(true)
    };
    (false) => {
        $crate::JsonValue::Bool(false)
    };
    ([]) => {
        $crate::JsonValue::Array(::std::vec::Vec::new())
    };
    ([ $($item:tt),* $(,)? ]) => {
        $crate::JsonValue::Array(::std::vec![ $( $crate::jval!($item) ),* ])
    };
    ({}) => {
        $crate::JsonValue::Object($crate::JsonMap::new())
    };
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::JsonMap::new();
        $(
            map.insert(::std::string::String::from($key), $crate::jval!($value));
        )*
        $crate::JsonValue::Object(map)
    }};
    ($other:expr) => {
        $crate::JsonValue::from($other)
    };
}
