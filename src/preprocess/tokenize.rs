//! Tokenize stage

use tracing::info;

use crate::hf_pipeline::TextDataset;
use crate::tokenizer::{Encoded, HfTokenizer};

use super::error::{PreprocessError, Result};
use super::map::{map_batched, MapOptions};

/// Worker hint for tokenization
pub const TOKENIZE_NUM_PROC: usize = 1;

/// A split after tokenization; text columns are gone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedDataset {
    pub split: String,
    pub records: Vec<Encoded>,
}

impl TokenizedDataset {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of tokens across records
    #[must_use]
    pub fn num_tokens(&self) -> usize {
        self.records.iter().map(Encoded::len).sum()
    }
}

/// Tokenize `text_column` of every record
pub fn tokenize(
    dataset: &TextDataset,
    tokenizer: &HfTokenizer,
    text_column: &str,
) -> Result<TokenizedDataset> {
    let indexed: Vec<(usize, &crate::hf_pipeline::Record)> = dataset.iter().enumerate().collect();
    let records = map_batched(
        &indexed,
        MapOptions::with_num_proc(TOKENIZE_NUM_PROC),
        |batch| {
            let texts = batch
                .iter()
                .map(|(index, record)| {
                    record
                        .get(text_column)
                        .and_then(serde_json::Value::as_str)
                        .map(String::from)
                        .ok_or_else(|| PreprocessError::MissingText {
                            column: text_column.to_string(),
                            index: *index,
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(tokenizer.encode_batch(&texts)?)
        },
    )?;

    let tokenized = TokenizedDataset {
        split: dataset.split().to_string(),
        records,
    };
    info!(
        split = %tokenized.split,
        records = tokenized.len(),
        tokens = tokenized.num_tokens(),
        "tokenized"
    );
    Ok(tokenized)
}
