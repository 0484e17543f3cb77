use serde::{Deserialize, Serialize};

use crate::ScanType;

#[derive(Debug, Deserialize)]
pub(crate) struct ExtractRequest {
    pub(crate) scan_type: ScanType,
    pub(crate) data_base64: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
