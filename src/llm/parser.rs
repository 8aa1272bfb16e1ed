//! Recovery of one well-formed JSON object from noisy model output.
//!
//! Model responses arrive in several dresses: a bare JSON object, an object
//! wrapped in a provider envelope, a double-encoded JSON string, or several
//! line-delimited fragments with prose in between. The sieve tries these
//! shapes in a fixed priority order and always produces an object carrying
//! exactly the expected key set — it never fails, so the pipeline always has
//! a filtered artifact to write.

use serde_json::{Map, Value};

/// A named envelope recognizer: pulls the inner response string out of a
/// provider-shaped object. Tried in priority order.
struct EnvelopeRecognizer {
    name: &'static str,
    extract: fn(&Value) -> Option<&str>,
}

const ENVELOPES: &[EnvelopeRecognizer] = &[
    EnvelopeRecognizer {
        name: "chat_message_content",
        extract: extract_chat_content,
    },
    EnvelopeRecognizer {
        name: "completion_text",
        extract: extract_completion_text,
    },
    EnvelopeRecognizer {
        name: "top_level_content",
        extract: extract_top_level_content,
    },
];

/// `choices[0].message.content`
fn extract_chat_content(v: &Value) -> Option<&str> {
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

/// `choices[0].text`
fn extract_completion_text(v: &Value) -> Option<&str> {
    v.get("choices")?.get(0)?.get("text")?.as_str()
}

/// top-level `content`
fn extract_top_level_content(v: &Value) -> Option<&str> {
    v.get("content")?.as_str()
}

/// Configurable model-response extractor.
///
/// The same machinery serves the three-key field extraction and the one-key
/// doc-type check; only the expected key set differs.
pub struct ResponseSieve {
    expected_keys: Vec<String>,
}

impl ResponseSieve {
    pub fn new(expected_keys: &[&str]) -> Self {
        Self {
            expected_keys: expected_keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Recover the best-effort object. Deterministic for identical input;
    /// the fallback is every expected key mapped to null.
    pub fn sieve(&self, raw: &str) -> Map<String, Value> {
        let trimmed = raw.trim();
        let mut candidates: Vec<Map<String, Value>> = Vec::new();

        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            self.gather(&value, &mut candidates, 0);
        }

        // Multi-fragment output: each non-empty line stands on its own.
        if candidates.is_empty() {
            for line in trimmed.lines().map(str::trim).filter(|l| !l.is_empty()) {
                if let Ok(value) = serde_json::from_str::<Value>(line) {
                    self.gather(&value, &mut candidates, 0);
                }
            }
        }

        for candidate in &candidates {
            if self.has_all_keys(candidate) {
                return self.project(candidate);
            }
        }
        if let Some(first) = candidates.first() {
            tracing::debug!(
                keys = %self.expected_keys.join(","),
                "Model response incomplete, filling missing keys with null"
            );
            return self.project(first);
        }

        tracing::debug!(
            keys = %self.expected_keys.join(","),
            "No JSON object recoverable from model response"
        );
        self.null_object()
    }

    /// Collect candidate objects from one parsed value, best first:
    /// a directly complete object, then envelope-inner objects, then the
    /// bare object itself as a weak dict-shaped fallback. A string value is
    /// treated as double-encoded JSON and decoded once more.
    fn gather(&self, value: &Value, out: &mut Vec<Map<String, Value>>, depth: u8) {
        if depth > 2 {
            return;
        }
        match value {
            Value::Object(map) => {
                if self.has_all_keys(map) {
                    out.push(map.clone());
                }
                for envelope in ENVELOPES {
                    if let Some(inner) = (envelope.extract)(value) {
                        if let Ok(Value::Object(inner_map)) =
                            serde_json::from_str::<Value>(inner)
                        {
                            tracing::trace!(envelope = envelope.name, "Provider envelope unwrapped");
                            out.push(inner_map);
                        }
                    }
                }
                if !self.has_all_keys(map) {
                    out.push(map.clone());
                }
            }
            Value::String(inner) => {
                if let Ok(decoded) = serde_json::from_str::<Value>(inner) {
                    self.gather(&decoded, out, depth + 1);
                }
            }
            _ => {}
        }
    }

    fn has_all_keys(&self, map: &Map<String, Value>) -> bool {
        self.expected_keys.iter().all(|k| map.contains_key(k))
    }

    /// Keep exactly the expected keys; anything missing becomes null.
    fn project(&self, map: &Map<String, Value>) -> Map<String, Value> {
        self.expected_keys
            .iter()
            .map(|k| (k.clone(), map.get(k).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    fn null_object(&self) -> Map<String, Value> {
        self.expected_keys
            .iter()
            .map(|k| (k.clone(), Value::Null))
            .collect()
    }
}
