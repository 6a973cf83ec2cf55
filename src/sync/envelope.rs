use serde::{Deserialize, Serialize};

use crate::board::Pixel;
use crate::error::{CanvasError, Result};

/// Envelope type of an outbound placement
pub const KIND_SEND: &str = "send";
/// Envelope type of an inbound broadcast
pub const KIND_GET: &str = "get";

/// Real-time message: `{"type": "get" | "send", "content": {x, y, c}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl Envelope {
    pub fn send(pixel: Pixel) -> Self {
        Self::wrap(KIND_SEND, pixel)
    }

    pub fn get(pixel: Pixel) -> Self {
        Self::wrap(KIND_GET, pixel)
    }

    fn wrap(kind: &str, pixel: Pixel) -> Self {
        Self {
            kind: kind.to_string(),
            content: serde_json::json!({ "x": pixel.x, "y": pixel.y, "c": pixel.c }),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CanvasError::MalformedMessage(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        // Serializing a String and a Value cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Content as a pixel; `{x, y, c}` must all be integers
    pub fn pixel(&self) -> Result<Pixel> {
        Pixel::deserialize(&self.content).map_err(|e| CanvasError::MalformedMessage(e.to_string()))
    }
}

/// Decode an inbound frame. `Ok(None)` for envelopes that are not broadcasts.
pub fn decode_update(text: &str) -> Result<Option<Pixel>> {
    let envelope = Envelope::parse(text)?;
    if envelope.kind != KIND_GET {
        return Ok(None);
    }
    envelope.pixel().map(Some)
}

/// Encode an outbound placement
pub fn encode_send(pixel: Pixel) -> String {
    Envelope::send(pixel).to_json()
}
