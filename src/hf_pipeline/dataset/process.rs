//! Text column normalization ahead of tokenization

use serde_json::Value;
use tracing::debug;

use super::text_dataset::{Record, TextDataset};

/// Render a cell as text: strings as-is, null as empty, others as JSON
fn as_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Normalize the text column and optionally append the EOS token
///
/// Returns a new dataset; other columns are carried over unchanged.
#[must_use]
pub fn process_data(dataset: &TextDataset, text_column: &str, eos_token: Option<&str>) -> TextDataset {
    debug!(
        split = dataset.split(),
        text_column,
        append_eos = eos_token.is_some(),
        "processing text column"
    );
    let records = dataset
        .iter()
        .map(|record| {
            let mut text = as_text(record.get(text_column));
            if let Some(eos) = eos_token {
                text.push_str(eos);
            }
            let mut out: Record = record.clone();
            out.insert(text_column.to_string(), Value::String(text));
            out
        })
        .collect();
    TextDataset::new(dataset.split(), records)
}
