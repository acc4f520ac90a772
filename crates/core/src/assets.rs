//! Typed text assets produced by the generation stages.
//!
//! Each asset is parsed from the text model's JSON output immediately
//! after the salvage-parse step, so shape mismatches fail the stage
//! rather than surfacing as missing keys deep in formatting code.

use serde::{Deserialize, Serialize};

/// Strategy brief driving every later stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingBrief {
    pub product_or_service: String,
    pub target_audience: String,
    pub value_proposition: String,
    pub key_benefits: Vec<String>,
    pub tone_of_voice: String,
    pub call_to_action: String,
}

/// One creative direction for a visual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeAngle {
    pub angle_name: String,
    pub intent: String,
    /// What the image should visually emphasize (workflow, system,
    /// outcome, comparison, ...).
    pub visual_focus: String,
}

/// The set of creative angles generated from the brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeAngles {
    pub angles: Vec<CreativeAngle>,
}

/// Marketing email copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingEmail {
    pub subject: String,
    pub body: String,
}

/// One executable image-generation prompt plus its user-facing summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePromptSpec {
    pub angle_name: String,
    /// Plain-language caption shown next to the image; not part of the
    /// prompt sent to the engine.
    pub summary: String,
    /// Full structured design prompt sent to the image engine.
    pub prompt: String,
}

/// The full prompt set handed to the batch controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePromptSet {
    pub prompts: Vec<ImagePromptSpec>,
}

/// All four text assets, persisted together before image generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAssets {
    pub brief: MarketingBrief,
    pub angles: CreativeAngles,
    pub email: MarketingEmail,
    pub image_prompts: ImagePromptSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brief_rejects_missing_keys() {
        let json = serde_json::json!({
            "product_or_service": "CRM",
            "target_audience": "SMBs"
        });
        assert!(serde_json::from_value::<MarketingBrief>(json).is_err());
    }

    #[test]
    fn prompt_set_parses() {
        let json = serde_json::json!({
            "prompts": [
                {"angle_name": "Flow", "summary": "Shows the flow", "prompt": "Title: Flow"},
                {"angle_name": "Stack", "summary": "Shows the stack", "prompt": "Title: Stack"}
            ]
        });
        let set: ImagePromptSet = serde_json::from_value(json).unwrap();
        assert_eq!(set.prompts.len(), 2);
        assert_eq!(set.prompts[1].angle_name, "Stack");
    }

    #[test]
    fn email_roundtrip() {
        let email = MarketingEmail {
            subject: "Ship faster".into(),
            body: "Hello,\n...".into(),
        };
        let json = serde_json::to_string(&email).unwrap();
        let back: MarketingEmail = serde_json::from_str(&json).unwrap();
        assert_eq!(back, email);
    }
}
