//! Offline backend. Needs no credentials and no network; every reply is
//! derived deterministically from the inputs so demo flows and tests are
//! repeatable. Stands in for the real backends when neither is usable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::backend::Stylist;
use crate::closet::{
    ClothingItem, Composition, GarmentKind, GarmentSpec, OutfitCritique, StyleFeedback,
    StyleRecommendation,
};
use crate::error::GarbError;

const PROVIDER: &str = "mock";

/// Keeps the UI's loading states honest without slowing tests down
/// (tests construct with `with_delay(Duration::ZERO)`).
const DEFAULT_DELAY: Duration = Duration::from_millis(400);

/// 1x1 PNG swatches, one per stock color. Valid base64 image data so
/// anything downstream that decodes or displays the result keeps working.
const SWATCHES: [(&str, &str); 5] = [
    (
        "slate",
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGNIKekGAAKjAWRgxqrsAAAAAElFTkSuQmCC",
    ),
    (
        "indigo",
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGPwd3sKAAJiAXvBJn9xAAAAAElFTkSuQmCC",
    ),
    (
        "olive",
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGPILrABAAJhARhshkBfAAAAAElFTkSuQmCC",
    ),
    (
        "rust",
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGPYEswJAALPARF/hbTgAAAAAElFTkSuQmCC",
    ),
    (
        "cream",
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGP4+uEhAAWkAsd1HO/KAAAAAElFTkSuQmCC",
    ),
];

const STOCK_STYLES: [&str; 5] = [
    "Smart Casual",
    "Weekend Minimal",
    "City Layers",
    "Soft Tailoring",
    "Off-Duty Classic",
];

const CRITIQUE_HEADLINES: [&str; 4] = [
    "Solid foundation, safe execution",
    "Strong silhouette, colors clash",
    "Relaxed and coherent",
    "Ambitious mix that almost lands",
];

const CRITIQUE_ADVICE: [&str; 4] = [
    "Swap the top for something with more structure. Keep the palette to two colors plus one accent.",
    "Tuck or crop the top to restore proportions. A simpler shoe would let the outfit breathe.",
    "Add one textured piece to avoid flatness. Roll the sleeves to bring some ease into it.",
    "Anchor the look with darker footwear. Drop one pattern so the strongest piece can lead.",
];

pub struct MockStylist {
    delay: Duration,
    calls: AtomicU64,
}

impl Default for MockStylist {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStylist {
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of operations served. Handy in tests and diagnostics.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn begin(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Stable 64-bit seed over the operation name and its inputs.
fn seed(parts: &[&str]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0]);
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Swatch for a seed; a color keyword in `hint` wins over the seed.
fn pick_swatch(seed: u64, hint: &str) -> &'static str {
    let hint = hint.to_lowercase();
    for (name, data) in SWATCHES {
        if hint.contains(name) {
            return data;
        }
    }
    SWATCHES[(seed % SWATCHES.len() as u64) as usize].1
}

#[async_trait]
impl Stylist for MockStylist {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn try_on(
        &self,
        subject: &str,
        items: &[ClothingItem],
    ) -> Result<Composition, GarbError> {
        self.begin().await;

        let mut seed_parts = vec!["try_on", subject];
        for item in items {
            seed_parts.push(&item.id);
        }
        let seed = seed(&seed_parts);

        let caption = if items.is_empty() {
            "Rendered the subject in their original outfit.".to_string()
        } else {
            let described = items
                .iter()
                .map(|item| item.description.as_str())
                .collect::<Vec<_>>()
                .join(" + ");
            format!("Rendered the subject wearing {described}.")
        };

        Ok(Composition {
            image_base64: Some(pick_swatch(seed, "").to_string()),
            caption: Some(caption),
        })
    }

    async fn design_outfit(&self, subject: &str) -> Result<Composition, GarbError> {
        self.begin().await;

        let seed = seed(&["design_outfit", subject]);
        let style = STOCK_STYLES[(seed % STOCK_STYLES.len() as u64) as usize];
        let (color, swatch) = SWATCHES[((seed / 7) % SWATCHES.len() as u64) as usize];

        Ok(Composition {
            image_base64: Some(swatch.to_string()),
            caption: Some(format!(
                "{style}: a {color} knit over straight-leg trousers, finished with clean white sneakers."
            )),
        })
    }

    async fn recommend_styles(
        &self,
        closet: &[ClothingItem],
        feedback: Option<&StyleFeedback>,
    ) -> Result<Vec<StyleRecommendation>, GarbError> {
        self.begin().await;

        let tops: Vec<&ClothingItem> = closet
            .iter()
            .filter(|i| i.kind == GarmentKind::Top)
            .collect();
        let bottoms: Vec<&ClothingItem> = closet
            .iter()
            .filter(|i| i.kind == GarmentKind::Bottom)
            .collect();

        if tops.is_empty() && bottoms.is_empty() {
            return Ok(vec![]);
        }

        let disliked: Vec<&str> = feedback
            .map(|fb| fb.disliked.iter().map(String::as_str).collect())
            .unwrap_or_default();
        let styles: Vec<&str> = STOCK_STYLES
            .iter()
            .copied()
            .filter(|s| !disliked.contains(s))
            .collect();
        if styles.is_empty() {
            return Ok(vec![]);
        }

        let mut seed_parts = vec!["recommend_styles"];
        for item in closet {
            seed_parts.push(&item.id);
        }
        let seed = seed(&seed_parts);

        let count = 3.min(styles.len());
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let style = styles[(seed.wrapping_add(i as u64) as usize) % styles.len()];
            let top = tops.get(i % tops.len().max(1)).copied();
            let bottom = bottoms.get(i % bottoms.len().max(1)).copied();
            out.push(StyleRecommendation {
                style_name: style.to_string(),
                description: format!(
                    "Pairs what you already own into a {} look.",
                    style.to_lowercase()
                ),
                top_id: top.map(|t| t.id.clone()),
                bottom_id: bottom.map(|b| b.id.clone()),
            });
        }
        Ok(out)
    }

    async fn generate_garment(&self, spec: &GarmentSpec) -> Result<String, GarbError> {
        self.begin().await;

        let seed = seed(&[
            "generate_garment",
            &spec.style,
            &spec.color,
            spec.kind.as_str(),
            &spec.description,
        ]);
        Ok(pick_swatch(seed, &spec.color).to_string())
    }

    async fn critique_outfit(&self, subject: &str) -> Result<OutfitCritique, GarbError> {
        self.begin().await;

        let seed = seed(&["critique_outfit", subject]);
        let idx = (seed % CRITIQUE_HEADLINES.len() as u64) as usize;
        Ok(OutfitCritique {
            score: (seed % 6 + 4) as u8,
            headline: CRITIQUE_HEADLINES[idx].to_string(),
            advice: CRITIQUE_ADVICE[idx].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, kind: GarmentKind, description: &str) -> ClothingItem {
        ClothingItem {
            id: id.to_string(),
            kind,
            description: description.to_string(),
            image_url: "data:image/png;base64,AAAA".to_string(),
            tags: vec![],
        }
    }

    fn mock() -> MockStylist {
        MockStylist::with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn try_on_is_deterministic_and_non_empty() {
        let stylist = mock();
        let items = [item("t1", GarmentKind::Top, "slate overshirt")];
        let first = stylist.try_on("subject-photo", &items).await.unwrap();
        let second = stylist.try_on("subject-photo", &items).await.unwrap();
        assert_eq!(first, second);
        assert!(!first.image_base64.unwrap().is_empty());
        assert!(first.caption.unwrap().contains("slate overshirt"));
        assert_eq!(stylist.calls(), 2);
    }

    #[tokio::test]
    async fn generate_garment_honors_color_keyword() {
        let stylist = mock();
        let spec = GarmentSpec {
            style: "casual".into(),
            color: "olive green".into(),
            kind: GarmentKind::Top,
            description: "field jacket".into(),
        };
        let image = stylist.generate_garment(&spec).await.unwrap();
        assert_eq!(image, SWATCHES[2].1);
    }

    #[tokio::test]
    async fn recommendations_use_closet_ids_and_skip_disliked() {
        let stylist = mock();
        let closet = [
            item("t1", GarmentKind::Top, "white tee"),
            item("b1", GarmentKind::Bottom, "dark denim"),
        ];
        let fb = StyleFeedback {
            liked: vec![],
            disliked: vec!["Smart Casual".into()],
        };
        let recs = stylist.recommend_styles(&closet, Some(&fb)).await.unwrap();
        assert_eq!(recs.len(), 3);
        for rec in &recs {
            assert_ne!(rec.style_name, "Smart Casual");
            assert_eq!(rec.top_id.as_deref(), Some("t1"));
            assert_eq!(rec.bottom_id.as_deref(), Some("b1"));
        }
    }

    #[tokio::test]
    async fn empty_closet_yields_no_recommendations() {
        let recs = mock().recommend_styles(&[], None).await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn recommended_styles_rotate_without_repeating() {
        let stylist = mock();
        let closet = [
            item("t1", GarmentKind::Top, "white tee"),
            item("b1", GarmentKind::Bottom, "dark denim"),
        ];
        let recs = stylist.recommend_styles(&closet, None).await.unwrap();
        let names: Vec<&str> = recs.iter().map(|r| r.style_name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert!(names.iter().all(|n| STOCK_STYLES.contains(n)));
        for (i, name) in names.iter().enumerate() {
            for other in &names[i + 1..] {
                assert_ne!(name, other);
            }
        }
    }

    #[tokio::test]
    async fn critique_score_stays_in_range() {
        let critique = mock().critique_outfit("photo").await.unwrap();
        assert!((1..=10).contains(&critique.score));
        assert!(!critique.headline.is_empty());
        assert!(!critique.advice.is_empty());
    }

    #[tokio::test]
    async fn design_outfit_returns_image_and_caption() {
        let comp = mock().design_outfit("photo").await.unwrap();
        assert!(comp.image_base64.is_some());
        assert!(comp.caption.is_some());
    }
}
