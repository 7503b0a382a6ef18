// ============================================================
// Layer 3 — Element Domain Types
// ============================================================
// A page element as captured by the browser extension:
// its rendered size, tag, id and class attribute.
//
// JSON keys follow the DOM property names (tagName, className)
// so dataset files dumped from the page need no renaming.

use serde::{Deserialize, Serialize};

/// One labelled training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// Rendered width in CSS pixels (offsetWidth)
    pub width: f32,

    /// Rendered height in CSS pixels (offsetHeight)
    pub height: f32,

    /// Upper-case tag name as reported by the DOM, e.g. "IMG"
    pub tag_name: String,

    /// Value of the id attribute, empty when absent
    pub id: String,

    /// Value of the class attribute, empty when absent
    pub class_name: String,

    /// Ground-truth label
    pub is_ad: bool,
}

impl ElementRecord {
    pub fn new(
        width:      f32,
        height:     f32,
        tag_name:   impl Into<String>,
        id:         impl Into<String>,
        class_name: impl Into<String>,
        is_ad:      bool,
    ) -> Self {
        Self {
            width,
            height,
            tag_name:   tag_name.into(),
            id:         id.into(),
            class_name: class_name.into(),
            is_ad,
        }
    }

    /// The label as the 0/1 target the network is trained against
    pub fn target(&self) -> u8 {
        u8::from(self.is_ad)
    }
}

/// An element to be scored by a trained model.
/// Same shape as [`ElementRecord`]; `isAd` may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlabeledElement {
    pub width:      f32,
    pub height:     f32,
    pub tag_name:   String,
    #[serde(default)]
    pub id:         String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub is_ad:      Option<bool>,
}

impl From<ElementRecord> for UnlabeledElement {
    fn from(r: ElementRecord) -> Self {
        Self {
            width:      r.width,
            height:     r.height,
            tag_name:   r.tag_name,
            id:         r.id,
            class_name: r.class_name,
            is_ad:      Some(r.is_ad),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialises_dom_property_names() {
        let json = r#"{"width":300,"height":250,"tagName":"IMG","id":"","className":"banner","isAd":true}"#;
        let rec: ElementRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec, ElementRecord::new(300.0, 250.0, "IMG", "", "banner", true));
        assert_eq!(rec.target(), 1);
    }

    #[test]
    fn test_unlabeled_element_label_is_optional() {
        let json = r#"{"width":10,"height":20,"tagName":"DIV","id":"x","className":""}"#;
        let el: UnlabeledElement = serde_json::from_str(json).unwrap();
        assert_eq!(el.is_ad, None);
        assert_eq!(el.tag_name, "DIV");
    }
}
