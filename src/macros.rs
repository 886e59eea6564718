/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// ```rust
/// use tabnest::{value, Value};
///
/// let rule = value!({
///     "select": ["city", {"name": {"as": "person"}}],
///     "groups": {"city": {}}
/// });
/// assert!(rule.is_object());
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::Record::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::Record::new();
        $(
            object.insert($key.to_string(), $crate::value!($value));
        )*
        $crate::Value::Object(object)
    }};

    // Any other expression convertible into a Value
    ($s:expr) => {
        $crate::Value::from($s)
    };
}

/// Builds a [`Record`](crate::Record) (one row) from `"field": value` pairs.
///
/// ```rust
/// use tabnest::record;
///
/// let row = record! { "a": "1", "b": "x" };
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };

    ($($key:literal : $value:tt),* $(,)?) => {{
        let mut row = $crate::Record::new();
        $(
            row.insert($key.to_string(), $crate::value!($value));
        )*
        row
    }};
}

#[cfg(test)]
mod tests {
    use crate::{Number, Record, Value};

    #[test]
    fn test_value_macro_primitives() {
        assert_eq!(value!(null), Value::Null);
        assert_eq!(value!(true), Value::Bool(true));
        assert_eq!(value!(42), Value::Number(Number::Integer(42)));
        assert_eq!(value!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn test_value_macro_nested() {
        let obj = value!({
            "name": "Alice",
            "tags": ["a", "b"],
            "meta": {}
        });

        match obj {
            Value::Object(map) => {
                assert_eq!(map.len(), 3);
                assert_eq!(map.get("name"), Some(&Value::from("Alice")));
                assert_eq!(map.get("meta"), Some(&Value::Object(Record::new())));
                assert_eq!(
                    map.get("tags").and_then(|v| v.as_array()).map(Vec::len),
                    Some(2)
                );
            }
            _ => panic!("Expected object"),
        }
    }

    #[test]
    fn test_record_macro() {
        assert!(record!().is_empty());
        let row = record! { "b": "2", "a": "1" };
        let keys: Vec<_> = row.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
