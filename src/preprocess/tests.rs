//! Tests for tokenize and group stages

use super::*;
use crate::hf_pipeline::TextDataset;
use crate::testing::TinyModel;
use crate::tokenizer::{Encoded, HfTokenizer};
use proptest::prelude::*;
use tempfile::TempDir;

fn encoded(ids: std::ops::Range<u32>) -> Encoded {
    let input_ids: Vec<u32> = ids.collect();
    let attention_mask = vec![1; input_ids.len()];
    Encoded {
        input_ids,
        attention_mask,
    }
}

/// Split `total` tokens into records of the given lengths (last one takes the rest)
fn records_of(total: usize, lengths: &[usize]) -> Vec<Encoded> {
    let mut records = Vec::new();
    let mut start = 0u32;
    let total = total as u32;
    for &len in lengths {
        if start >= total {
            break;
        }
        let end = (start + len as u32).min(total);
        records.push(encoded(start..end));
        start = end;
    }
    if start < total {
        records.push(encoded(start..total));
    }
    records
}

// ========================================================================
// PROPERTY TESTS
// ========================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(200))]

    #[test]
    fn prop_aligned_sequence_yields_exact_blocks(
        n in 0usize..20,
        block_size in 1usize..32,
        lengths in proptest::collection::vec(1usize..50, 0..10),
    ) {
        let records = records_of(n * block_size, &lengths);
        let blocks = group_batch(&records, block_size);
        prop_assert_eq!(blocks.len(), n);
    }

    #[test]
    fn prop_remainder_is_dropped(
        k in 0usize..20,
        block_size in 2usize..32,
        r_seed in 1usize..1000,
        lengths in proptest::collection::vec(1usize..50, 0..10),
    ) {
        let r = 1 + r_seed % (block_size - 1);
        let records = records_of(k * block_size + r, &lengths);
        let blocks = group_batch(&records, block_size);
        prop_assert_eq!(blocks.len(), k);
        for block in &blocks {
            prop_assert_eq!(block.input_ids.len(), block_size);
            prop_assert_eq!(&block.labels, &block.input_ids);
        }
    }

    #[test]
    fn prop_shards_partition_contiguously(len in 0usize..5000, shards in 1usize..16) {
        let mut next = 0;
        for i in 0..shards {
            let range = shard_range(len, shards, i);
            prop_assert_eq!(range.start, next);
            next = range.end;
        }
        prop_assert_eq!(next, len);
    }

    #[test]
    fn prop_map_preserves_order(len in 0usize..3000, num_proc in 1usize..6, batch in 1usize..700) {
        let items: Vec<usize> = (0..len).collect();
        let options = MapOptions { batch_size: batch, num_proc };
        let out = map_batched(&items, options, |b| Ok(b.to_vec())).unwrap();
        prop_assert_eq!(out, items);
    }
}

// ========================================================================
// GROUPING
// ========================================================================

#[test]
fn test_group_concatenates_across_records() {
    let records = vec![encoded(0..3), encoded(3..5), encoded(5..9)];
    let blocks = group_batch(&records, 4);
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].input_ids, vec![0, 1, 2, 3]);
    assert_eq!(blocks[1].input_ids, vec![4, 5, 6, 7]);
    assert_eq!(blocks[1].attention_mask, vec![1, 1, 1, 1]);
}

#[test]
fn test_grouping_is_per_map_batch() {
    let tokenized = TokenizedDataset {
        split: "train".into(),
        records: vec![encoded(0..3), encoded(3..6)],
    };
    // one batch: 6 tokens -> one block of 4
    let together = group_texts_with(&tokenized, 4, MapOptions { batch_size: 1000, num_proc: 1 }).unwrap();
    assert_eq!(together.len(), 1);
    // batches of one record: 3 tokens each, nothing fills a block
    let apart = group_texts_with(&tokenized, 4, MapOptions { batch_size: 1, num_proc: 1 }).unwrap();
    assert!(apart.is_empty());
}

#[test]
fn test_group_rejects_zero_block_size() {
    let tokenized = TokenizedDataset::default();
    assert!(matches!(
        group_texts(&tokenized, 0),
        Err(PreprocessError::InvalidBlockSize)
    ));
}

#[test]
fn test_num_proc_capped_at_len() {
    let items = vec![1, 2];
    let out = map_batched(&items, MapOptions::with_num_proc(GROUP_NUM_PROC), |b| Ok(b.to_vec())).unwrap();
    assert_eq!(out, vec![1, 2]);
}

// ========================================================================
// TOKENIZE
// ========================================================================

fn tiny_tokenizer(dir: &TempDir) -> HfTokenizer {
    TinyModel::default().write(dir.path());
    HfTokenizer::from_dir(dir.path()).unwrap()
}

#[test]
fn test_tokenize_drops_text_and_keeps_order() {
    let dir = TempDir::new().unwrap();
    let tokenizer = tiny_tokenizer(&dir);
    let dataset = TextDataset::from_texts("train", "text", ["the cat", "a dog sat down"]);

    let tokenized = tokenize(&dataset, &tokenizer, "text").unwrap();
    assert_eq!(tokenized.split, "train");
    assert_eq!(tokenized.len(), 2);
    assert_eq!(tokenized.records[0].len(), 2);
    assert_eq!(tokenized.records[1].len(), 4);
    assert_eq!(tokenized.num_tokens(), 6);
}

#[test]
fn test_tokenize_reports_missing_text() {
    let dir = TempDir::new().unwrap();
    let tokenizer = tiny_tokenizer(&dir);
    let dataset = TextDataset::from_texts("train", "body", ["the cat"]);

    match tokenize(&dataset, &tokenizer, "text") {
        Err(PreprocessError::MissingText { column, index }) => {
            assert_eq!(column, "text");
            assert_eq!(index, 0);
        }
        other => panic!("expected MissingText, got {other:?}"),
    }
}
