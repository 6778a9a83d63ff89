//! Batched, sharded map over a split
//!
//! Items are cut into `num_proc` contiguous shards; each shard is walked in
//! batches of `batch_size` and the batch function's outputs are concatenated
//! in input order. Shards run on a dedicated rayon pool.

use std::ops::Range;

use rayon::prelude::*;

use super::error::{PreprocessError, Result};

/// Batch size and parallelism for [`map_batched`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapOptions {
    pub batch_size: usize,
    pub num_proc: usize,
}

impl MapOptions {
    pub const DEFAULT_BATCH_SIZE: usize = 1000;

    #[must_use]
    pub fn with_num_proc(num_proc: usize) -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            num_proc,
        }
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        Self::with_num_proc(1)
    }
}

/// Contiguous shard `index` of `num_shards` over `len` items
#[must_use]
pub fn shard_range(len: usize, num_shards: usize, index: usize) -> Range<usize> {
    let div = len / num_shards;
    let rem = len % num_shards;
    let start = div * index + index.min(rem);
    let end = start + div + usize::from(index < rem);
    start..end
}

fn map_shard<T, U, F>(items: &[T], batch_size: usize, f: &F) -> Result<Vec<U>>
where
    F: Fn(&[T]) -> Result<Vec<U>>,
{
    let mut out = Vec::new();
    for batch in items.chunks(batch_size.max(1)) {
        out.extend(f(batch)?);
    }
    Ok(out)
}

/// Apply `f` to every batch and concatenate the outputs in order
pub fn map_batched<T, U, F>(items: &[T], options: MapOptions, f: F) -> Result<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(&[T]) -> Result<Vec<U>> + Sync,
{
    let num_proc = options.num_proc.clamp(1, items.len().max(1));
    if num_proc == 1 {
        return map_shard(items, options.batch_size, &f);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_proc)
        .build()
        .map_err(|e| PreprocessError::WorkerPool(e.to_string()))?;

    let shards: Vec<Vec<U>> = pool.install(|| {
        (0..num_proc)
            .into_par_iter()
            .map(|i| map_shard(&items[shard_range(items.len(), num_proc, i)], options.batch_size, &f))
            .collect::<Result<Vec<_>>>()
    })?;
    Ok(shards.into_iter().flatten().collect())
}
