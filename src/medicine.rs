use serde::{Deserialize, Serialize};

use crate::barcode::Symbology;

/// Canonical record returned by every extraction path.
///
/// The six medicine fields are always present; an empty string means the
/// value was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInfo {
    pub medicine_name: String,
    pub price: String,
    pub manufacturing_date: String,
    pub expiry_date: String,
    pub batch_number: String,
    pub quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

/// Fields recovered by a single strategy. `None` means the strategy found nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMedicineInfo {
    pub medicine_name: Option<String>,
    pub price: Option<String>,
    pub manufacturing_date: Option<String>,
    pub expiry_date: Option<String>,
    pub batch_number: Option<String>,
    pub quantity: Option<String>,
}

impl PartialMedicineInfo {
    pub fn is_empty(&self) -> bool {
        self.medicine_name.is_none()
            && self.price.is_none()
            && self.manufacturing_date.is_none()
            && self.expiry_date.is_none()
            && self.batch_number.is_none()
            && self.quantity.is_none()
    }

    fn into_record(self) -> MedicineInfo {
        MedicineInfo {
            medicine_name: self.medicine_name.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            manufacturing_date: self.manufacturing_date.unwrap_or_default(),
            expiry_date: self.expiry_date.unwrap_or_default(),
            batch_number: self.batch_number.unwrap_or_default(),
            quantity: self.quantity.unwrap_or_default(),
            barcode_data: None,
            barcode_type: None,
            extracted_text: None,
        }
    }
}

/// Final step of the barcode path: fill the gaps and attach the raw symbol.
pub fn assemble(
    parsed: &PartialMedicineInfo,
    raw_payload: &str,
    symbology: &Symbology,
) -> MedicineInfo {
    let mut record = parsed.clone().into_record();
    record.barcode_data = Some(raw_payload.to_string());
    record.barcode_type = Some(symbology.as_str().to_string());
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_fills_missing_fields_with_empty_strings() {
        let parsed = PartialMedicineInfo {
            expiry_date: Some("2024-06-15".to_string()),
            ..Default::default()
        };
        let record = assemble(&parsed, "17240615", &Symbology::DataMatrix);
        assert_eq!(record.expiry_date, "2024-06-15");
        assert_eq!(record.medicine_name, "");
        assert_eq!(record.batch_number, "");
        assert_eq!(record.barcode_data.as_deref(), Some("17240615"));
        assert_eq!(record.barcode_type.as_deref(), Some("DATAMATRIX"));
        assert!(record.extracted_text.is_none());
    }

    #[test]
    fn assemble_is_idempotent() {
        let parsed = PartialMedicineInfo {
            batch_number: Some("LOT7".to_string()),
            quantity: Some("0042".to_string()),
            ..Default::default()
        };
        let first = assemble(&parsed, "0100000000000000", &Symbology::Code128);
        let second = assemble(&parsed, "0100000000000000", &Symbology::Code128);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).expect("serialize"),
            serde_json::to_string(&second).expect("serialize")
        );
    }

    #[test]
    fn serialized_record_is_fully_keyed() {
        let record = assemble(
            &PartialMedicineInfo::default(),
            "4006381333931",
            &Symbology::Ean13,
        );
        let value = serde_json::to_value(&record).expect("serialize");
        for key in [
            "medicineName",
            "price",
            "manufacturingDate",
            "expiryDate",
            "batchNumber",
            "quantity",
        ] {
            assert_eq!(value[key], "", "{key} should be an empty string");
        }
        assert_eq!(value["barcodeType"], "EAN13");
        assert!(value.get("extractedText").is_none());
    }
}
