//! Body inspection.
//!
//! A complete body is decoded as JSON. Decodable bodies are pretty-printed to
//! the log. For request bodies the outcome also decides whether the proxy
//! should bother sending the response for inspection: JSON requests get their
//! response headers and fully buffered response body, anything else skips
//! the response phases entirely.
//!
//! Decoding is lenient in the same places common JSON decoders are: invalid
//! UTF-8 inside the document is replaced with U+FFFD rather than rejected, and
//! nesting is accepted up to [`MAX_NESTING_DEPTH`] levels. Parsing and
//! printing grow the stack on demand, so deep documents cannot overflow a
//! worker thread.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use super::event::{Direction, ModeOverride};

/// Deepest array/object nesting a body may have and still count as JSON.
pub const MAX_NESTING_DEPTH: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("exceeded max nesting depth of {limit}")]
    TooDeep { limit: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A decoded JSON body.
#[derive(Debug)]
pub struct JsonBody(Value);

impl JsonBody {
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Render with two-space indentation.
    pub fn pretty(&self) -> Result<String, serde_json::Error> {
        let mut out = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"  "));
        self.0.serialize(serde_stacker::Serializer::new(&mut ser))?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

impl Drop for JsonBody {
    // The derived drop of `Value` recurses once per nesting level.
    fn drop(&mut self) {
        let mut pending = vec![std::mem::take(&mut self.0)];
        while let Some(value) = pending.pop() {
            match value {
                Value::Array(items) => pending.extend(items),
                Value::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
                _ => {}
            }
        }
    }
}

/// Decode a body as a single JSON document.
pub fn decode_body(body: &[u8]) -> Result<JsonBody, DecodeError> {
    if exceeds_depth(body, MAX_NESTING_DEPTH) {
        return Err(DecodeError::TooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }

    let text = String::from_utf8_lossy(body);
    let mut de = serde_json::Deserializer::from_str(&text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    let parsed = JsonBody(value);
    de.end()?;
    Ok(parsed)
}

/// Whether brackets outside of strings nest deeper than `limit`.
fn exceeds_depth(body: &[u8], limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in body {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

/// Inspect a complete body and return the override to attach to the reply.
///
/// Always `Some` for request bodies and `None` for response bodies, since no
/// phase follows the response body.
pub fn inspect_body(body: &[u8], direction: Direction) -> Option<ModeOverride> {
    match decode_body(body) {
        Ok(parsed) => {
            if tracing::enabled!(tracing::Level::INFO) {
                match parsed.pretty() {
                    Ok(content) => {
                        tracing::info!(direction = %direction, "{} body: {}", direction, content)
                    }
                    Err(e) => {
                        tracing::warn!(direction = %direction, error = %e, "Failed to format body")
                    }
                }
            }
            match direction {
                Direction::Request => Some(ModeOverride::FORWARD_BUFFERED),
                Direction::Response => None,
            }
        }
        Err(e) => {
            tracing::debug!(
                direction = %direction,
                bytes = body.len(),
                error = %e,
                "Body is not JSON"
            );
            match direction {
                Direction::Request => Some(ModeOverride::SKIP_RESPONSE),
                Direction::Response => None,
            }
        }
    }
}
