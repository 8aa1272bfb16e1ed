use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::OcrError;

/// One recognized page of text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub page_number: Option<u32>,
    pub text: String,
}

/// Ordered page set produced once per run and consumed by both agents.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PageSet {
    pub pages: Vec<Page>,
}

impl PageSet {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Serialized form substituted into agent prompts.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"pages":[]}"#.to_string())
    }
}

/// A named shape recognizer: returns the page set when the payload matches
/// its shape, None otherwise. Recognizers are tried in priority order.
struct ShapeRecognizer {
    name: &'static str,
    recognize: fn(&Value) -> Option<PageSet>,
}

const RECOGNIZERS: &[ShapeRecognizer] = &[
    ShapeRecognizer {
        name: "full_document_text",
        recognize: recognize_full_text,
    },
    ShapeRecognizer {
        name: "page_list",
        recognize: recognize_page_list,
    },
    ShapeRecognizer {
        name: "detection_list",
        recognize: recognize_detection_list,
    },
];

/// Normalize a raw OCR payload into the uniform page set.
///
/// Backends disagree on shape: some return one full-document text field,
/// some a page array, some a flat list of typed detections. The first
/// recognizer that matches wins; no match is `UnsupportedFormat`.
pub fn normalize_ocr_payload(payload: &Value) -> Result<PageSet, OcrError> {
    for recognizer in RECOGNIZERS {
        if let Some(pages) = (recognizer.recognize)(payload) {
            tracing::debug!(
                shape = recognizer.name,
                pages = pages.pages.len(),
                "OCR payload normalized"
            );
            return Ok(pages);
        }
    }
    Err(OcrError::UnsupportedFormat)
}

/// `{"data": {"text": "..."}}` — the whole document as one string.
fn recognize_full_text(payload: &Value) -> Option<PageSet> {
    let text = payload.get("data")?.get("text")?.as_str()?;
    Some(PageSet {
        pages: vec![Page {
            page_number: Some(1),
            text: text.to_string(),
        }],
    })
}

/// `{"data": {"pages": [{"page_number": n, "text": "..."}, ...]}}`.
/// Page numbers default to the 1-based position when the source omits them.
fn recognize_page_list(payload: &Value) -> Option<PageSet> {
    let raw_pages = payload.get("data")?.get("pages")?.as_array()?;
    let pages = raw_pages
        .iter()
        .enumerate()
        .map(|(i, p)| Page {
            page_number: p
                .get("page_number")
                .and_then(Value::as_u64)
                .map(|n| n as u32)
                .or(Some(i as u32 + 1)),
            text: p
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect();
    Some(PageSet { pages })
}

/// `{"Blocks": [{"BlockType": "LINE"|"WORD", "Text": "..."}, ...]}` —
/// a flat detection list. Line detections join with newlines; when no line
/// grain exists, word detections join with spaces. Either way one page.
fn recognize_detection_list(payload: &Value) -> Option<PageSet> {
    let blocks = payload.get("Blocks")?.as_array()?;

    let lines: Vec<&str> = blocks
        .iter()
        .filter(|b| b.get("BlockType").and_then(Value::as_str) == Some("LINE"))
        .filter_map(|b| b.get("Text").and_then(Value::as_str))
        .collect();

    let text = if !lines.is_empty() {
        lines.join("\n")
    } else {
        blocks
            .iter()
            .filter_map(|b| b.get("Text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    };

    Some(PageSet {
        pages: vec![Page {
            page_number: Some(1),
            text,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_text_shape_yields_one_page() {
        let payload = json!({"success": true, "data": {"text": "Приказ № 12"}});
        let pages = normalize_ocr_payload(&payload).unwrap();
        assert_eq!(pages.pages.len(), 1);
        assert_eq!(pages.pages[0].page_number, Some(1));
        assert_eq!(pages.pages[0].text, "Приказ № 12");
    }

    #[test]
    fn page_list_preserves_order_and_numbers() {
        let payload = json!({"data": {"pages": [
            {"page_number": 1, "text": "first"},
            {"page_number": 2, "text": "second"},
        ]}});
        let pages = normalize_ocr_payload(&payload).unwrap();
        assert_eq!(pages.pages.len(), 2);
        assert_eq!(pages.pages[0].text, "first");
        assert_eq!(pages.pages[1].page_number, Some(2));
        assert_eq!(pages.pages[1].text, "second");
    }

    #[test]
    fn page_list_defaults_to_positional_numbering() {
        let payload = json!({"data": {"pages": [{"text": "a"}, {"text": "b"}]}});
        let pages = normalize_ocr_payload(&payload).unwrap();
        assert_eq!(pages.pages[0].page_number, Some(1));
        assert_eq!(pages.pages[1].page_number, Some(2));
    }

    #[test]
    fn empty_page_list_is_recognized_but_empty() {
        let payload = json!({"data": {"pages": []}});
        let pages = normalize_ocr_payload(&payload).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn line_detections_join_with_newlines_in_order() {
        let payload = json!({"Blocks": [
            {"BlockType": "PAGE"},
            {"BlockType": "LINE", "Text": "СПРАВКА"},
            {"BlockType": "WORD", "Text": "СПРАВКА"},
            {"BlockType": "LINE", "Text": "от 01.02.2025"},
        ]});
        let pages = normalize_ocr_payload(&payload).unwrap();
        assert_eq!(pages.pages.len(), 1);
        assert_eq!(pages.pages[0].text, "СПРАВКА\nот 01.02.2025");
    }

    #[test]
    fn word_detections_join_with_spaces_when_no_lines() {
        let payload = json!({"Blocks": [
            {"BlockType": "WORD", "Text": "Иванов"},
            {"BlockType": "WORD", "Text": "Иван"},
            {"BlockType": "PAGE"},
            {"BlockType": "WORD", "Text": "Иванович"},
        ]});
        let pages = normalize_ocr_payload(&payload).unwrap();
        assert_eq!(pages.pages[0].text, "Иванов Иван Иванович");
    }

    #[test]
    fn unsupported_shape_is_an_error() {
        let payload = json!({"result": "something else"});
        assert!(matches!(
            normalize_ocr_payload(&payload),
            Err(OcrError::UnsupportedFormat)
        ));
    }

    #[test]
    fn full_text_wins_over_page_list() {
        let payload = json!({"data": {
            "text": "whole document",
            "pages": [{"text": "page one"}],
        }});
        let pages = normalize_ocr_payload(&payload).unwrap();
        assert_eq!(pages.pages.len(), 1);
        assert_eq!(pages.pages[0].text, "whole document");
    }
}
