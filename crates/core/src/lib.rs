//! Core domain types shared by every Copysmith crate.
//!
//! A [`GenerationSession`] is the persisted record of one end-to-end
//! generation request. The text-generation stages produce typed
//! [`assets`](crate::assets); the image stage turns each
//! [`CreativeItem`] into a persisted [`GeneratedImage`]. Streaming
//! callers observe the pipeline through [`ProgressEvent`]s.

pub mod assets;
pub mod event;
pub mod item;
pub mod outcome;
pub mod session;

pub use assets::{
    CreativeAngle, CreativeAngles, ImagePromptSet, ImagePromptSpec, MarketingBrief,
    MarketingEmail, TextAssets,
};
pub use event::{ProgressEvent, unix_timestamp};
pub use item::CreativeItem;
pub use outcome::{GenerationOutcome, Performance};
pub use session::{
    GeneratedImage, GenerationSession, NewImage, SessionStatus, SessionWithImages, SourceTexts,
    truncate_chars,
};
