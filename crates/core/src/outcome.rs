use serde::{Deserialize, Serialize};

use crate::assets::{CreativeAngles, ImagePromptSet, MarketingBrief, MarketingEmail};
use crate::session::GeneratedImage;

/// Timing and yield metrics for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Total wall-clock seconds for the whole pipeline.
    pub total_time: f64,
    /// Wall-clock seconds spent in the image batch stage.
    pub image_generation_time: f64,
    /// Images that completed and were persisted.
    pub images_generated: usize,
    /// Images the caller asked for.
    pub images_requested: u32,
}

/// Everything a blocking generation call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub generation_id: String,
    pub marketing_brief: MarketingBrief,
    pub creative_angles: CreativeAngles,
    pub email: MarketingEmail,
    pub image_prompts: ImagePromptSet,
    /// Successful images in canonical order (ascending `image_index`).
    pub generated_images: Vec<GeneratedImage>,
    pub performance: Performance,
}
