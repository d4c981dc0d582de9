use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Wardrobe slot a clothing item occupies.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum GarmentKind {
    Top,
    Bottom,
}

impl GarmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

/// A clothing item in the caller's closet. Owned by the UI layer; this
/// core reads it (id, kind, description, image) but never mutates it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ClothingItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: GarmentKind,
    pub description: String,
    /// Data URL (`data:image/...;base64,...`) as stored by the UI.
    pub image_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One outfit suggestion produced by `recommend_styles`.
///
/// `top_id` / `bottom_id` name items from the closet that was passed in,
/// but the backend is free to hallucinate an id that isn't there — callers
/// treat a failed lookup as "no match", not an error.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct StyleRecommendation {
    /// Short name of the style, e.g. "Smart Casual".
    pub style_name: String,
    /// One or two sentences on why the combination works.
    pub description: String,
    /// Id of the recommended top, when one fits the style.
    #[serde(default)]
    pub top_id: Option<String>,
    /// Id of the recommended bottom, when one fits the style.
    #[serde(default)]
    pub bottom_id: Option<String>,
}

/// Prior like/dislike verdicts keyed by style name. Captured by the
/// caller; passed read-only into recommendation calls to steer the
/// backend away from styles the user already rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StyleFeedback {
    #[serde(default)]
    pub liked: Vec<String>,
    #[serde(default)]
    pub disliked: Vec<String>,
}

impl StyleFeedback {
    pub fn is_empty(&self) -> bool {
        self.liked.is_empty() && self.disliked.is_empty()
    }
}

/// Result of an image-producing operation: a rendered image, a caption,
/// or both. Adapters never return both fields `None` — that condition is
/// reported as `GarbError::EmptyResponse` instead. A caption without an
/// image is a valid partial result for `design_outfit` (the model
/// described an outfit but declined to render it).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Composition {
    pub image_base64: Option<String>,
    pub caption: Option<String>,
}

/// Free-text/enum description of a garment to synthesize from scratch.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GarmentSpec {
    pub style: String,
    pub color: String,
    pub kind: GarmentKind,
    pub description: String,
}

/// Verdict on a photographed outfit.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct OutfitCritique {
    /// Overall score, 1 (rework it) to 10 (wear it out the door).
    pub score: u8,
    /// One-line verdict.
    pub headline: String,
    /// Concrete suggestion for improving the outfit.
    pub advice: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clothing_item_round_trips_ui_shape() {
        let json = r#"{
            "id": "item-7",
            "type": "TOP",
            "description": "cream linen shirt",
            "image_url": "data:image/png;base64,AAAA",
            "tags": ["summer", "linen"]
        }"#;
        let item: ClothingItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, GarmentKind::Top);
        assert_eq!(item.tags.len(), 2);

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["type"], "TOP");
    }

    #[test]
    fn clothing_item_tags_default_to_empty() {
        let json = r#"{
            "id": "item-1",
            "type": "BOTTOM",
            "description": "grey wool trousers",
            "image_url": "data:image/png;base64,AAAA"
        }"#;
        let item: ClothingItem = serde_json::from_str(json).unwrap();
        assert!(item.tags.is_empty());
    }

    #[test]
    fn recommendation_accepts_missing_item_ids() {
        let json = r#"{"style_name": "Minimal", "description": "clean lines"}"#;
        let rec: StyleRecommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.top_id, None);
        assert_eq!(rec.bottom_id, None);
    }

    #[test]
    fn garment_kind_prompt_names_are_lowercase() {
        assert_eq!(GarmentKind::Top.as_str(), "top");
        assert_eq!(GarmentKind::Bottom.as_str(), "bottom");
    }
}
