// ============================================================
// Layer 3 — Feature Extraction
// ============================================================
// Maps one page element to the six numbers the network sees:
//
//   [width, height, isImg, isIframe, idHasAd, classHasAd]
//
// The same extraction runs inside the browser extension before
// calling the exported model, so the order and the exact matching
// rules must not drift:
//   - tag checks are case-sensitive exact matches
//   - "ad" checks lowercase first and match anywhere, so
//     "gradient" and "header-shadow" count too

use crate::domain::element::{ElementRecord, UnlabeledElement};

/// Number of features produced per element
pub const FEATURE_COUNT: usize = 6;

/// Fixed-length numeric encoding of one element
pub type FeatureVector = [f32; FEATURE_COUNT];

/// Extract the model input for a labelled record.
pub fn extract_features(element: &ElementRecord) -> FeatureVector {
    encode(
        element.width,
        element.height,
        &element.tag_name,
        &element.id,
        &element.class_name,
    )
}

/// Extract the model input for an element awaiting a prediction.
pub fn extract_unlabeled(element: &UnlabeledElement) -> FeatureVector {
    encode(
        element.width,
        element.height,
        &element.tag_name,
        &element.id,
        &element.class_name,
    )
}

fn encode(width: f32, height: f32, tag_name: &str, id: &str, class_name: &str) -> FeatureVector {
    [
        width,
        height,
        indicator(tag_name == "IMG"),
        indicator(tag_name == "IFRAME"),
        indicator(contains_ad(id)),
        indicator(contains_ad(class_name)),
    ]
}

fn contains_ad(s: &str) -> bool {
    s.to_lowercase().contains("ad")
}

fn indicator(flag: bool) -> f32 {
    if flag { 1.0 } else { 0.0 }
}
