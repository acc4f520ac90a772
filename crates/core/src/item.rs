use crate::assets::ImagePromptSet;

/// One creative angle's worth of image-generation work.
///
/// Ephemeral and in-memory only: produced from the prompt stage's
/// [`ImagePromptSet`], consumed by the batch controller, never persisted
/// directly (only its derived `GeneratedImage` is).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeItem {
    /// 0-based original index; defines the canonical ordering of the
    /// batch. Duplicate angle names are permitted -- this index is the
    /// only identity key.
    pub index: usize,
    pub angle_name: String,
    pub summary: String,
    /// Full structured prompt text sent to the image engine.
    pub prompt: String,
}

impl CreativeItem {
    /// Expand a prompt set into ordered items, assigning indices by
    /// position.
    pub fn from_prompt_set(set: &ImagePromptSet) -> Vec<Self> {
        set.prompts
            .iter()
            .enumerate()
            .map(|(index, spec)| Self {
                index,
                angle_name: spec.angle_name.clone(),
                summary: spec.summary.clone(),
                prompt: spec.prompt.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImagePromptSpec;

    #[test]
    fn indices_follow_prompt_order() {
        let set = ImagePromptSet {
            prompts: vec![
                ImagePromptSpec {
                    angle_name: "A".into(),
                    summary: "a".into(),
                    prompt: "pa".into(),
                },
                ImagePromptSpec {
                    angle_name: "B".into(),
                    summary: "b".into(),
                    prompt: "pb".into(),
                },
            ],
        };
        let items = CreativeItem::from_prompt_set(&set);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].angle_name, "B");
    }

    #[test]
    fn empty_set_yields_no_items() {
        let set = ImagePromptSet { prompts: vec![] };
        assert!(CreativeItem::from_prompt_set(&set).is_empty());
    }
}
