use serde::{Deserialize, Serialize};

use crate::types::MessageRole;

/// Request body for a streaming ask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskParams {
    /// Room the question belongs to.
    pub room_id: i64,

    /// The question text.
    pub message: String,

    /// Always `human` for client-originated asks.
    pub role: MessageRole,

    /// Latitude for location-aware answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Longitude for location-aware answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Base64 image payload to attach to the question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl AskParams {
    /// Creates ask parameters for a plain text question.
    pub fn new(room_id: i64, message: impl Into<String>) -> Self {
        AskParams {
            room_id,
            message: message.into(),
            role: MessageRole::Human,
            latitude: None,
            longitude: None,
            image_path: None,
        }
    }

    /// Attaches the asker's coordinates.
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Attaches an image to the question.
    pub fn with_image(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_omits_unset_fields() {
        let params = AskParams::new(4, "one day in Busan");
        let json = serde_json::to_value(&params).unwrap();
        let expected = serde_json::json!({
            "room_id": 4,
            "message": "one day in Busan",
            "role": "human"
        });
        assert_eq!(json, expected);
    }

    #[test]
    fn serialization_with_location() {
        let params = AskParams::new(4, "lunch near here").with_location(37.5665, 126.978);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["latitude"], serde_json::json!(37.5665));
        assert_eq!(json["longitude"], serde_json::json!(126.978));
    }
}
