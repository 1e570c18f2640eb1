use crate::errors::ServiceError;
use crate::llm::{self, LlmClient};
use crate::storage;
use serde::Serialize;
use tracing::instrument;

const ROLL_LABEL_PROMPT: &str = "You read photos of raw-material roll labels from a thermoforming \
factory. Reply with a single JSON object, no prose, with exactly these keys: \
\"raw_materials\" (the material description), \"batch_number\" (digits), \
\"box_number\" (digits). Use an empty string for anything unreadable.";

const PALLET_LABEL_PROMPT: &str = "You read photos of raw-material pallet stickers from a \
thermoforming factory. Reply with a single JSON object, no prose, with exactly these keys: \
\"supplier\", \"pallet_no\" (digits), \"stock_code\", \"batch_number\" (digits), \
\"sticker_date\" (YYYY-MM-DD). Use an empty string for anything unreadable.";

/// Fields read off a roll label photo.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RollLabel {
    pub raw_materials: String,
    pub batch_number: String,
    pub box_number: String,
}

/// Fields read off a raw-pallet sticker photo.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PalletLabel {
    pub supplier: String,
    pub pallet_no: Option<i64>,
    pub stock_code: String,
    pub batch_number: String,
    pub sticker_date: Option<String>,
}

#[derive(Clone)]
pub struct OcrService {
    llm: LlmClient,
    max_image_bytes: usize,
}

impl OcrService {
    pub fn new(llm: LlmClient, max_image_bytes: usize) -> Self {
        Self {
            llm,
            max_image_bytes,
        }
    }

    /// Size and base64 validity are checked before anything leaves the
    /// process; oversized payloads never reach the model.
    fn validated_data_url(&self, image_base64: &str) -> Result<String, ServiceError> {
        storage::decode_image_base64(image_base64, self.max_image_bytes)?;
        if image_base64.starts_with("data:") {
            Ok(image_base64.to_string())
        } else {
            Ok(format!("data:image/jpeg;base64,{}", image_base64.trim()))
        }
    }

    #[instrument(skip(self, image_base64))]
    pub async fn read_roll_label(&self, image_base64: &str) -> Result<RollLabel, ServiceError> {
        let data_url = self.validated_data_url(image_base64)?;
        let fields = self.llm.extract_json(ROLL_LABEL_PROMPT, &data_url).await?;
        Ok(RollLabel {
            raw_materials: text_field(&fields, "raw_materials"),
            batch_number: llm::sanitize_digits(&text_field(&fields, "batch_number")),
            box_number: llm::sanitize_digits(&text_field(&fields, "box_number")),
        })
    }

    #[instrument(skip(self, image_base64))]
    pub async fn read_pallet_label(&self, image_base64: &str) -> Result<PalletLabel, ServiceError> {
        let data_url = self.validated_data_url(image_base64)?;
        let fields = self
            .llm
            .extract_json(PALLET_LABEL_PROMPT, &data_url)
            .await?;
        let pallet_no = llm::sanitize_digits(&text_field(&fields, "pallet_no"))
            .parse::<i64>()
            .ok();
        let sticker_date = {
            let raw = text_field(&fields, "sticker_date");
            if raw.is_empty() {
                None
            } else {
                Some(raw)
            }
        };
        Ok(PalletLabel {
            supplier: text_field(&fields, "supplier"),
            pallet_no,
            stock_code: text_field(&fields, "stock_code"),
            batch_number: llm::sanitize_digits(&text_field(&fields, "batch_number")),
            sticker_date,
        })
    }
}

fn text_field(value: &serde_json::Value, key: &str) -> String {
    match value.get(key) {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_field_handles_strings_numbers_and_gaps() {
        let value = json!({"a": " x ", "b": 42, "c": null});
        assert_eq!(text_field(&value, "a"), "x");
        assert_eq!(text_field(&value, "b"), "42");
        assert_eq!(text_field(&value, "c"), "");
        assert_eq!(text_field(&value, "missing"), "");
    }
}
