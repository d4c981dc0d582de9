//! Instruction text for each wardrobe operation. The adapters attach these
//! as text parts next to the inline images.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::closet::{ClothingItem, GarmentSpec, StyleFeedback};

const SEASONS: [&str; 4] = ["spring", "summer", "autumn", "winter"];

const STYLES: [&str; 6] = [
    "smart casual",
    "streetwear",
    "business casual",
    "minimalist",
    "vintage",
    "outdoor",
];

/// Try-on instruction. Reference photos are attached after the subject
/// photo, in the same order as the numbered list here.
pub fn try_on(items: &[ClothingItem]) -> String {
    let mut out = String::from(
        "You are a virtual try-on engine. Render a new photograph of the person \
         in the first image wearing the clothing described below. Keep the \
         person's pose, face, body shape, lighting and background exactly as in \
         the original photo. Only the clothing changes.\n",
    );

    if items.is_empty() {
        out.push_str("\nNo reference garments were provided; keep the outfit coherent.\n");
    } else {
        out.push_str("\nGarments to apply (reference photos attached in order):\n");
        for (i, item) in items.iter().enumerate() {
            out.push_str(&format!(
                "{}. [{}] {}\n",
                i + 1,
                item.kind.as_str(),
                item.description
            ));
        }
    }

    out.push_str("\nReturn the edited photograph.");
    out
}

/// First step of the designer flow: ask for an outfit concept in plain text.
/// Season and style rotate so repeated calls do not converge on one look.
pub fn design_concept() -> String {
    let (season, style) = pick_theme();
    format!(
        "You are a fashion stylist. Describe one complete {style} outfit for \
         {season}, in two or three sentences: the garments, their colors and \
         materials, and one styling note. Plain text only, no preamble."
    )
}

/// Second step of the designer flow: render the concept onto the subject.
pub fn design_render(concept: &str) -> String {
    format!(
        "Render a new photograph of the person in the attached image wearing \
         this outfit:\n\n{concept}\n\nKeep the person's pose, face, body shape, \
         lighting and background exactly as in the original photo. Return the \
         edited photograph."
    )
}

/// Recommendation instruction over the closet listing. Ids in the output
/// must come from the listing; the schema rides in the generation config.
pub fn recommend(closet: &[ClothingItem], feedback: Option<&StyleFeedback>) -> String {
    let mut out = String::from(
        "You are a fashion stylist. Suggest exactly 3 outfit combinations from \
         the wardrobe below. For each, give a short style name, one or two \
         sentences on why it works, and the id of the top and bottom used. \
         Only use ids from the list; omit a slot when nothing fits.\n\nWardrobe:\n",
    );

    if closet.is_empty() {
        out.push_str("(empty)\n");
    } else {
        for item in closet {
            out.push_str(&format!(
                "- id={} [{}] {}\n",
                item.id,
                item.kind.as_str(),
                item.description
            ));
        }
    }

    if let Some(fb) = feedback.filter(|fb| !fb.is_empty()) {
        out.push_str("\nPrior feedback:\n");
        if !fb.liked.is_empty() {
            out.push_str(&format!("- liked styles: {}\n", fb.liked.join(", ")));
        }
        if !fb.disliked.is_empty() {
            out.push_str(&format!(
                "- disliked styles (avoid anything similar): {}\n",
                fb.disliked.join(", ")
            ));
        }
    }

    out
}

/// Garment synthesis instruction. No reference photo; studio product shot.
pub fn garment(spec: &GarmentSpec) -> String {
    format!(
        "Generate a studio product photograph of a single {color} {kind} in a \
         {style} style: {description}. The garment is shown isolated on a plain \
         light background, no person, no mannequin. Return only the image.",
        color = spec.color,
        kind = spec.kind.as_str(),
        style = spec.style,
        description = spec.description
    )
}

/// Critique instruction. The score/headline/advice schema rides in the
/// generation config.
pub fn critique() -> String {
    "You are a fashion critic. Judge the outfit worn by the person in the \
     attached photo. Give a score from 1 to 10, a one-line headline verdict, \
     and two sentences of specific, actionable advice."
        .to_string()
}

/// Rotate through season/style pairs using the clock. Good enough variety
/// for a per-call pick without pulling in an RNG.
fn pick_theme() -> (&'static str, &'static str) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as usize;
    (SEASONS[nanos % SEASONS.len()], STYLES[(nanos / 7) % STYLES.len()])
}
