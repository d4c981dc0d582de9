//! Request and response shapes for the generateContent wire format, as the
//! backends assemble and consume them.

use garb::GarbError;
use garb::closet::OutfitCritique;
use garb::wire::{self, RecommendationList};
use serde_json::json;

// ---------------------------------------------------------------------------
// Request assembly
// ---------------------------------------------------------------------------

#[test]
fn try_on_shaped_request_keeps_subject_first() {
    let subject = "data:image/png;base64,U1VC";
    let reference = "data:image/jpeg;base64,UkVG";

    let body = wire::user_request(
        vec![
            wire::image_part(subject),
            wire::text_part("swap in the overshirt"),
            wire::image_part(reference),
        ],
        wire::image_config(),
    );

    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["inlineData"]["mimeType"], json!("image/png"));
    assert_eq!(parts[0]["inlineData"]["data"], json!("U1VC"));
    assert_eq!(parts[1]["text"], json!("swap in the overshirt"));
    assert_eq!(parts[2]["inlineData"]["mimeType"], json!("image/jpeg"));
    assert_eq!(body["contents"][0]["role"], json!("user"));
}

#[test]
fn structured_request_carries_schema_without_draft_key() {
    let body = wire::user_request(
        vec![wire::text_part("critique the outfit")],
        wire::structured_config::<OutfitCritique>(),
    );

    let config = &body["generationConfig"];
    assert_eq!(config["responseMimeType"], json!("application/json"));
    let schema = &config["responseJsonSchema"];
    assert!(schema.get("$schema").is_none());
    assert!(schema["properties"].get("score").is_some());
    assert!(schema["properties"].get("headline").is_some());
    assert!(schema["properties"].get("advice").is_some());
}

#[test]
fn recommendation_schema_names_the_fields_the_parser_expects() {
    let schema = wire::response_schema::<RecommendationList>();
    let rendered = schema.to_string();
    assert!(rendered.contains("recommendations"));
    assert!(rendered.contains("style_name"));
    assert!(rendered.contains("top_id"));
    assert!(rendered.contains("bottom_id"));
}

// ---------------------------------------------------------------------------
// Response consumption
// ---------------------------------------------------------------------------

#[test]
fn verbose_api_reply_parses_down_to_image_and_caption() {
    // Shape as returned by the live endpoint, including fields we ignore.
    let raw = json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    {"text": "Here is the rendered look."},
                    {"inlineData": {"mimeType": "image/png", "data": "UE5H"}}
                ]
            },
            "finishReason": "STOP",
            "index": 0
        }],
        "usageMetadata": {"promptTokenCount": 263, "candidatesTokenCount": 1290},
        "modelVersion": "gemini-2.5-flash-image"
    })
    .to_string();

    let response: wire::GenerateResponse = serde_json::from_str(&raw).unwrap();
    let composition = response.into_composition("direct", "try_on").unwrap();
    assert_eq!(composition.image_base64.as_deref(), Some("UE5H"));
    assert_eq!(
        composition.caption.as_deref(),
        Some("Here is the rendered look.")
    );
}

#[test]
fn fenced_and_chatty_structured_replies_still_parse() {
    let fenced = "```json\n{\"recommendations\": [{\"style_name\": \"City Layers\", \
                  \"description\": \"light jacket over knit\", \"top_id\": \"t1\", \
                  \"bottom_id\": null}]}\n```";
    let list: RecommendationList = wire::parse_structured(fenced, "style recommendations").unwrap();
    assert_eq!(list.recommendations.len(), 1);
    assert_eq!(list.recommendations[0].style_name, "City Layers");
    assert_eq!(list.recommendations[0].bottom_id, None);

    let err =
        wire::parse_structured::<RecommendationList>("the model rambled instead", "style recommendations")
            .unwrap_err();
    assert!(matches!(err, GarbError::SchemaParse(_)));
}

#[test]
fn geo_block_wins_over_the_auth_triage_for_403() {
    let body = r#"{"error": {"code": 403, "message": "User location is not supported for the API use.", "status": "PERMISSION_DENIED"}}"#;
    let err = wire::status_error("direct", reqwest::StatusCode::FORBIDDEN, body);
    assert!(matches!(err, GarbError::GeoRestricted { .. }));
    assert!(err.is_geo_restricted());

    // Same status without the signature is an ordinary auth failure.
    let err = wire::status_error("direct", reqwest::StatusCode::FORBIDDEN, "key revoked");
    assert!(matches!(err, GarbError::AuthFailed { .. }));
}
