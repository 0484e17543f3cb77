//! Helpers for the photographed-label path. The vision model call itself
//! lives outside this crate; these build its input and read its output.
//!
//! Nothing in the CLI or server calls these yet: `/extract` answers
//! `scan_type: "image"` with 400 until a vision provider is wired in, at which
//! point that handler sends `LABEL_PROMPT` with `image_data_url` and feeds the
//! reply to `parse_label_response`.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;

use crate::medicine::MedicineInfo;

pub const LABEL_PROMPT: &str = "\
You are a medicine info extractor:
Extract out the following in JSON format only:
- medicineName
- price
- manufacturingDate
- expiryDate
- batchNumber
- quantity
- extractedText
Do not give any false if it is not found in the given image.
Notes and other response also to be put in the JSON object only.
Return a valid JSON object that includes all these fields.
Only a JSON should be returned by you nothing else.
";

pub fn image_data_url(image_bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64.encode(image_bytes))
}

/// Reads the model's reply into a fully keyed record. Accepts a bare JSON
/// object or prose wrapping one `{...}` block.
pub fn parse_label_response(output_text: &str) -> Result<MedicineInfo> {
    let value = match serde_json::from_str::<Value>(output_text.trim()) {
        Ok(value) => value,
        Err(_) => {
            let block = outer_json_block(output_text)
                .ok_or_else(|| anyhow!("failed to parse JSON response from model"))?;
            serde_json::from_str::<Value>(block)
                .with_context(|| "failed to parse JSON block in model response")?
        }
    };
    let object = value
        .as_object()
        .ok_or_else(|| anyhow!("model response is not a JSON object"))?;

    let field = |key: &str| object.get(key).map(text_of).unwrap_or_default();
    let extracted = object.get("extractedText").map(text_of);
    Ok(MedicineInfo {
        medicine_name: field("medicineName"),
        price: field("price"),
        manufacturing_date: field("manufacturingDate"),
        expiry_date: field("expiryDate"),
        batch_number: field("batchNumber"),
        quantity: field("quantity"),
        barcode_data: None,
        barcode_type: None,
        extracted_text: Some(extracted.unwrap_or_default()),
    })
}

fn outer_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

// Models answer with nulls, numbers and `false` for missing values.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Null | Value::Bool(false) => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_reply() {
        let reply = r#"{"medicineName": "Amoxicillin", "price": 12.5, "expiryDate": "2025-01-31",
            "batchNumber": "B77", "quantity": 20, "manufacturingDate": null,
            "extractedText": "AMOXICILLIN 500"}"#;
        let info = parse_label_response(reply).expect("parse");
        assert_eq!(info.medicine_name, "Amoxicillin");
        assert_eq!(info.price, "12.5");
        assert_eq!(info.quantity, "20");
        assert_eq!(info.manufacturing_date, "");
        assert_eq!(info.extracted_text.as_deref(), Some("AMOXICILLIN 500"));
        assert!(info.barcode_type.is_none());
    }

    #[test]
    fn json_wrapped_in_prose() {
        let reply = "Here is the result:\n```json\n{\"medicineName\": \"Cetirizine\", \"price\": false}\n```\nHope it helps";
        let info = parse_label_response(reply).expect("parse");
        assert_eq!(info.medicine_name, "Cetirizine");
        assert_eq!(info.price, "");
        assert_eq!(info.batch_number, "");
        assert_eq!(info.extracted_text.as_deref(), Some(""));
    }

    #[test]
    fn reply_without_json_is_an_error() {
        assert!(parse_label_response("I cannot read this label.").is_err());
        assert!(parse_label_response("[1, 2, 3]").is_err());
    }

    #[test]
    fn data_url_is_base64_jpeg() {
        assert_eq!(image_data_url(b"abc"), "data:image/jpeg;base64,YWJj");
        assert!(LABEL_PROMPT.contains("batchNumber"));
    }
}
