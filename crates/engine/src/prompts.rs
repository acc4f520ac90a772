//! Prompt templates for the four text stages.
//!
//! Each builder returns the system/user pair plus the sampling
//! temperature for that stage. Briefs and angles are passed between
//! stages as pretty-printed JSON so the model sees the validated shape,
//! not free text.

use copysmith_core::{CreativeAngles, MarketingBrief};
use copysmith_llm::LlmError;

/// A ready-to-send prompt pair with its sampling temperature.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub system: String,
    pub user: String,
    pub temperature: f64,
}

/// Brief generation from the merged source context.
pub fn marketing_brief(source_context: &str) -> PromptSpec {
    PromptSpec {
        system: "You are a senior marketing strategist who also thinks in terms of product \
                 structure, system components, and visual metaphors. Write briefs that are \
                 useful for both copywriting and visual design."
            .to_owned(),
        user: format!(
            "From the sources below, generate a marketing brief.\n\
             Return a JSON OBJECT with EXACTLY these keys:\n\
             - product_or_service\n\
             - target_audience\n\
             - value_proposition\n\
             - key_benefits (array of strings)\n\
             - tone_of_voice\n\
             - call_to_action\n\n\
             Sources:\n{source_context}"
        ),
        temperature: 0.3,
    }
}

/// Creative-angle generation from the brief.
pub fn creative_angles(brief: &MarketingBrief, count: u32) -> Result<PromptSpec, LlmError> {
    let brief_json = to_pretty_json(brief)?;
    Ok(PromptSpec {
        system: "You are a creative director.".to_owned(),
        user: format!(
            "From the brief below, generate exactly {count} distinct creative angles.\n\n\
             Each angle must include:\n\
             - angle_name\n\
             - intent\n\
             - visual_focus (what the image should visually emphasize, e.g. workflow, \
             system, outcome, comparison)\n\n\
             Brief:\n{brief_json}\n\n\
             Return JSON object with key \"angles\"."
        ),
        temperature: 0.6,
    })
}

/// Marketing email generation from the brief.
pub fn marketing_email(brief: &MarketingBrief) -> Result<PromptSpec, LlmError> {
    let brief_json = to_pretty_json(brief)?;
    Ok(PromptSpec {
        system: "You are a professional copywriter.".to_owned(),
        user: format!(
            "Write a marketing email using the brief below.\n\
             Include keys: \"subject\", \"body\".\n\
             Brief:\n{brief_json}\n\n\
             Return JSON object only."
        ),
        temperature: 0.6,
    })
}

/// Image-prompt generation from the brief and angles.
pub fn image_prompts(
    brief: &MarketingBrief,
    angles: &CreativeAngles,
) -> Result<PromptSpec, LlmError> {
    let brief_json = to_pretty_json(brief)?;
    let angles_json = to_pretty_json(angles)?;
    Ok(PromptSpec {
        system: "You are a senior visual designer specializing in professional B2B marketing \
                 visuals, product infographics, technical diagrams, and social media brand \
                 graphics. You think in terms of layout, visual hierarchy, and information \
                 clarity. Your outputs look designed, not illustrated."
            .to_owned(),
        user: format!(
            "You will generate image-generation prompts for marketing visuals.\n\n\
             CRITICAL RULE:\n\
             - The final image prompt must be LONG, STRUCTURED, and EXECUTABLE.\n\
             - Do NOT write summaries, descriptions, or captions INSIDE the image prompt.\n\
             - Write prompts that read like a design specification given to a visual designer.\n\
             - If the output could be used as a caption, it is WRONG.\n\n\
             NEW REQUIREMENT:\n\
             - In addition to the full image-generation prompt, generate a SHORT, USER-FACING \
             SUMMARY.\n\
             - This summary is NOT part of the image prompt.\n\
             - It should read like a feature explanation or caption a user would see next to \
             the image.\n\
             - It must be concise, plain-language, and explain what the visual shows and why \
             it matters.\n\n\
             INTERNAL PROCESS (do not output these steps):\n\
             1. Infer product category and complexity from the marketing brief.\n\
             2. For each creative angle, derive a VISUAL BRIEF with:\n\
                - Visual format (choose ONE): infographic, workflow diagram, system \
             architecture, UI feature panel, comparison visual\n\
                - Primary visual metaphor (flow, hub-and-spoke, layered stack, timeline)\n\
                - Information density (low / medium / high)\n\
                - Focal point\n\
             3. Convert the visual brief into a FULL DESIGN PROMPT using the REQUIRED FORMAT \
             below.\n\
             4. Separately generate a one-sentence USER SUMMARY describing the visual at a \
             feature level.\n\n\
             REQUIRED FINAL PROMPT FORMAT (MUST FOLLOW EXACTLY):\n\n\
             Title:\n(one short internal title, not marketing copy)\n\n\
             Visual Type:\n(explicitly state the visual format)\n\n\
             Layout & Composition:\n(bullet points describing layout zones, hierarchy, \
             spacing, reading order)\n\n\
             Core Visual Elements:\n(bullet points describing what is drawn, where, and how \
             elements relate spatially)\n\n\
             Data / UI Representation:\n(bullet points describing charts, panels, metrics, \
             flows, arrows, dashboards)\n\n\
             Style & Aesthetic:\n(bullet points defining flat vs isometric, realism level, \
             color mood, contrast)\n\n\
             Constraints:\n(bullet points listing what must NOT appear)\n\n\
             Purpose:\n(one sentence describing what the viewer should understand in 3 \
             seconds)\n\n\
             GLOBAL CONSTRAINTS (apply to all prompts):\n\
             - Diagrammatic / schematic, not marketing poster or hero art\n\
             - No headline-style text embedded in image\n\
             - No cinematic lighting, glow, or concept art\n\
             - No realistic people as main subjects (icons or silhouettes only)\n\
             - Clean, professional, brand-neutral\n\
             - Aspect ratio: 4:5, social media feed optimized\n\n\
             MARKETING BRIEF:\n{brief_json}\n\n\
             CREATIVE ANGLES:\n{angles_json}\n\n\
             OUTPUT:\n\
             Return JSON only:\n\
             {{\n\
               \"prompts\": [\n\
                 {{\n\
                   \"angle_name\": \"...\",\n\
                   \"summary\": \"Plain-language explanation of what the image visualizes \
             and the feature or insight it communicates.\",\n\
                   \"prompt\": \"FULL STRUCTURED PROMPT TEXT\"\n\
                 }}\n\
               ]\n\
             }}"
        ),
        temperature: 0.5,
    })
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, LlmError> {
    serde_json::to_string_pretty(value).map_err(|e| LlmError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use copysmith_core::CreativeAngle;

    fn test_brief() -> MarketingBrief {
        MarketingBrief {
            product_or_service: "Deploy bot".into(),
            target_audience: "Platform teams".into(),
            value_proposition: "Safer releases".into(),
            key_benefits: vec!["rollbacks".into()],
            tone_of_voice: "confident".into(),
            call_to_action: "Book a demo".into(),
        }
    }

    #[test]
    fn brief_prompt_embeds_sources_and_keys() {
        let spec = marketing_brief("SOURCE: PRESENTATION\nhello");
        assert!(spec.user.contains("marketing brief"));
        assert!(spec.user.contains("key_benefits"));
        assert!(spec.user.contains("SOURCE: PRESENTATION"));
        assert!((spec.temperature - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn angles_prompt_embeds_count_and_brief() {
        let spec = creative_angles(&test_brief(), 4).unwrap();
        assert!(spec.user.contains("exactly 4 distinct creative angles"));
        assert!(spec.user.contains("Deploy bot"));
        assert!(spec.user.contains("visual_focus"));
    }

    #[test]
    fn email_prompt_requests_subject_and_body() {
        let spec = marketing_email(&test_brief()).unwrap();
        assert!(spec.user.contains("marketing email"));
        assert!(spec.user.contains("\"subject\""));
        assert!(spec.user.contains("\"body\""));
    }

    #[test]
    fn image_prompt_embeds_brief_and_angles() {
        let angles = CreativeAngles {
            angles: vec![CreativeAngle {
                angle_name: "Pipeline view".into(),
                intent: "show flow".into(),
                visual_focus: "workflow".into(),
            }],
        };
        let spec = image_prompts(&test_brief(), &angles).unwrap();
        assert!(spec.user.contains("image-generation prompts"));
        assert!(spec.user.contains("Pipeline view"));
        assert!(spec.user.contains("\"prompts\""));
        assert!((spec.temperature - 0.5).abs() < f64::EPSILON);
    }
}
