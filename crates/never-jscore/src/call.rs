//! Call expression building for [`Context::call`](crate::Context::call)

use serde::Serialize;

use crate::error::{JsCoreError, JsCoreResult};

/// Separator placed between encoded arguments
pub const ARG_SEPARATOR: &str = ", ";

/// Encode each argument to JSON independently.
///
/// The first argument that fails to encode aborts the whole list and is
/// reported by position.
pub fn encode_args<I>(args: I) -> JsCoreResult<Vec<String>>
where
    I: IntoIterator,
    I::Item: Serialize,
{
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            serde_json::to_string(&arg)
                .map_err(|source| JsCoreError::ArgumentEncodingFailed { index, source })
        })
        .collect()
}

/// Build `name(arg0, arg1, ...)` with JSON-encoded arguments
pub fn build_call_expression<I>(name: &str, args: I) -> JsCoreResult<String>
where
    I: IntoIterator,
    I::Item: Serialize,
{
    let encoded = encode_args(args)?;
    Ok(format!("{}({})", name, encoded.join(ARG_SEPARATOR)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    #[test]
    fn test_numbers() {
        assert_eq!(build_call_expression("add", [5, 7]).unwrap(), "add(5, 7)");
    }

    #[test]
    fn test_no_args() {
        assert_eq!(build_call_expression("now", Vec::<Value>::new()).unwrap(), "now()");
    }

    #[test]
    fn test_heterogeneous_values() {
        let args = [
            Value::Null,
            json!(true),
            json!(1.5),
            json!("it's \"quoted\""),
            json!([1, [2]]),
            json!({ "k": "v" }),
        ];
        assert_eq!(
            build_call_expression("f", &args).unwrap(),
            r#"f(null, true, 1.5, "it's \"quoted\"", [1,[2]], {"k":"v"})"#
        );
    }

    #[test]
    fn test_method_path_name() {
        assert_eq!(
            build_call_expression("Math.max", [1, 9, 3]).unwrap(),
            "Math.max(1, 9, 3)"
        );
    }

    #[test]
    fn test_encoding_failure_reports_position() {
        // Non-string map keys only fail once a key is actually written
        let empty: BTreeMap<(i32, i32), i32> = BTreeMap::new();
        let keyed = BTreeMap::from([((1, 2), 3)]);

        let err = encode_args([empty.clone(), empty, keyed]).unwrap_err();
        match err {
            JsCoreError::ArgumentEncodingFailed { index, .. } => assert_eq!(index, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
