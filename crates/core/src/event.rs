//! Progress events emitted by the streaming pipeline.
//!
//! Wire format is NDJSON: one internally-tagged JSON object per line.
//! Every stream terminates with exactly one `complete` or `error` event.

use serde::{Deserialize, Serialize};

use crate::assets::{MarketingBrief, MarketingEmail};
use crate::outcome::Performance;
use crate::session::GeneratedImage;

/// Current wall-clock time as fractional unix seconds.
#[allow(clippy::cast_precision_loss)]
pub fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// One event in a streaming generation's NDJSON sequence.
///
/// Fixed order: `start` -> `brief` -> `email` -> `image_start` -> one
/// `image` per completed item in completion order -> `complete`; or a
/// terminal `error` at any point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Emitted by the HTTP layer before the pipeline starts.
    Start {
        timestamp: f64,
        generation_id: String,
        user_id: String,
        image_count: u32,
    },
    Brief {
        timestamp: f64,
        data: MarketingBrief,
    },
    /// Emitted once both angles and email are computed (they run
    /// concurrently; only the email is streamed).
    Email {
        timestamp: f64,
        data: MarketingEmail,
    },
    /// Image generation is starting; `count` items were submitted.
    ImageStart { timestamp: f64, count: u32 },
    /// One item finished and was persisted. Emitted in completion
    /// order, not canonical order.
    Image {
        timestamp: f64,
        data: GeneratedImage,
    },
    Complete {
        timestamp: f64,
        generation_id: String,
        message: String,
        performance: Performance,
    },
    Error {
        timestamp: f64,
        generation_id: String,
        message: String,
    },
}

impl ProgressEvent {
    pub fn start(generation_id: impl Into<String>, user_id: impl Into<String>, count: u32) -> Self {
        Self::Start {
            timestamp: unix_timestamp(),
            generation_id: generation_id.into(),
            user_id: user_id.into(),
            image_count: count,
        }
    }

    pub fn brief(data: MarketingBrief) -> Self {
        Self::Brief {
            timestamp: unix_timestamp(),
            data,
        }
    }

    pub fn email(data: MarketingEmail) -> Self {
        Self::Email {
            timestamp: unix_timestamp(),
            data,
        }
    }

    pub fn image_start(count: u32) -> Self {
        Self::ImageStart {
            timestamp: unix_timestamp(),
            count,
        }
    }

    pub fn image(data: GeneratedImage) -> Self {
        Self::Image {
            timestamp: unix_timestamp(),
            data,
        }
    }

    pub fn complete(generation_id: impl Into<String>, performance: Performance) -> Self {
        let message = format!("Generated {} images", performance.images_generated);
        Self::Complete {
            timestamp: unix_timestamp(),
            generation_id: generation_id.into(),
            message,
            performance,
        }
    }

    pub fn error(generation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            timestamp: unix_timestamp(),
            generation_id: generation_id.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for the two events that may end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_snake_case_type() {
        let event = ProgressEvent::image_start(3);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "image_start");
        assert_eq!(value["count"], 3);
        assert!(value["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn complete_carries_summary_message() {
        let event = ProgressEvent::complete(
            "gen-1",
            Performance {
                total_time: 12.0,
                image_generation_time: 9.5,
                images_generated: 2,
                images_requested: 3,
            },
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["message"], "Generated 2 images");
        assert_eq!(value["performance"]["images_requested"], 3);
    }

    #[test]
    fn terminality() {
        assert!(ProgressEvent::error("g", "boom").is_terminal());
        assert!(!ProgressEvent::image_start(1).is_terminal());
    }
}
