use crate::StorageError;
use loggraph_core::Content;

/// Turns a content payload into text for formats that only carry strings.
pub trait Stringizer {
    fn stringize(&self, value: &Content) -> Result<String, StorageError>;
}

/// Inverse of [`Stringizer`].
pub trait Destringizer {
    fn destringize(&self, text: &str) -> Result<Content, StorageError>;
}

/// Compact JSON text. The default pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStringizer;

impl Stringizer for JsonStringizer {
    fn stringize(&self, value: &Content) -> Result<String, StorageError> {
        Ok(serde_json::to_string(value)?)
    }
}

impl Destringizer for JsonStringizer {
    fn destringize(&self, text: &str) -> Result<Content, StorageError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Keeps string payloads verbatim and stores anything else as JSON text.
/// Reads back as a string unless the text parses as a JSON container.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextStringizer;

impl Stringizer for PlainTextStringizer {
    fn stringize(&self, value: &Content) -> Result<String, StorageError> {
        Ok(loggraph_core::content_text(value))
    }
}

impl Destringizer for PlainTextStringizer {
    fn destringize(&self, text: &str) -> Result<Content, StorageError> {
        if text.is_empty() {
            return Ok(Content::Null);
        }
        match serde_json::from_str::<Content>(text) {
            Ok(value @ (Content::Array(_) | Content::Object(_))) => Ok(value),
            _ => Ok(Content::String(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_pair_round_trips_structured_content() {
        let value = json!({"prompt": "hi", "tokens": [1, 2, 3]});
        let text = JsonStringizer.stringize(&value).unwrap();
        assert_eq!(JsonStringizer.destringize(&text).unwrap(), value);
    }

    #[test]
    fn test_plain_text_pair() {
        let text = PlainTextStringizer.stringize(&json!("hello")).unwrap();
        assert_eq!(text, "hello");
        assert_eq!(
            PlainTextStringizer.destringize("hello").unwrap(),
            json!("hello")
        );
        assert_eq!(PlainTextStringizer.destringize("").unwrap(), json!(null));
        assert_eq!(
            PlainTextStringizer.destringize("[1,2]").unwrap(),
            json!([1, 2])
        );
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            JsonStringizer.destringize("{not json"),
            Err(StorageError::Json(_))
        ));
    }
}
