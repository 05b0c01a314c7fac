use serde::{Deserialize, Serialize};

/// Response body shared by both dispatch variants.
///
/// `greetings` is in the order the dispatcher drained them, which for the
/// concurrent variant is completion order rather than submission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub elapsed_seconds: f64,
    pub greetings: Vec<String>,
}

impl Envelope {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elapsed_seconds: 0.0,
            greetings: Vec::with_capacity(capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Envelope;

    #[test]
    fn wire_shape() {
        let envelope = Envelope {
            elapsed_seconds: 1.5,
            greetings: vec!["Hello Maia from worker number 0".to_string()],
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "elapsed_seconds": 1.5,
                "greetings": ["Hello Maia from worker number 0"],
            })
        );
    }

    #[test]
    fn empty_greetings_serialize_as_array() {
        let json = serde_json::to_string(&Envelope::with_capacity(4)).unwrap();
        assert_eq!(json, r#"{"elapsed_seconds":0.0,"greetings":[]}"#);
    }
}
