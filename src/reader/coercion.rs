use serde_json::Value;

use crate::mission::Frame;

/// Rewrites the value stored under `field()` before schema deserialization.
pub trait Coercion: Send + Sync {
    fn field(&self) -> &str;

    fn coerce(&self, value: &Value) -> Result<Value, String>;
}

/// Normalizes coordinate frames to their canonical name.
///
/// Accepts any casing of a frame name, or `{"name": "<frame>"}`.
pub struct FrameCoercion;

impl Coercion for FrameCoercion {
    fn field(&self) -> &str {
        "frame"
    }

    fn coerce(&self, value: &Value) -> Result<Value, String> {
        let name = match value {
            Value::String(name) => name.as_str(),
            Value::Object(map) => match map.get("name") {
                Some(Value::String(name)) => name.as_str(),
                _ => return Err("frame object requires a string `name`".to_string()),
            },
            other => return Err(format!("expected frame name, found {}", other)),
        };

        Frame::from_name(name)
            .map(|frame| Value::String(frame.as_str().to_string()))
            .ok_or_else(|| format!("unknown frame `{}`", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_accepts_names_and_objects() {
        assert_eq!(FrameCoercion.coerce(&json!("Robot")).unwrap(), json!("robot"));
        assert_eq!(
            FrameCoercion.coerce(&json!({"name": "asset"})).unwrap(),
            json!("asset")
        );
    }

    #[test]
    fn test_coerce_rejects_unknown() {
        assert!(FrameCoercion.coerce(&json!("world")).is_err());
        assert!(FrameCoercion.coerce(&json!(3)).is_err());
        assert!(FrameCoercion.coerce(&json!({"id": "robot"})).is_err());
    }
}
