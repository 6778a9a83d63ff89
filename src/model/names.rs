//! Tensor naming conventions of pretrained checkpoints

use std::cmp::Ordering;

use crate::io::TensorMap;

/// Token embedding tensors across common architectures
pub const EMBEDDING_SUFFIXES: &[&str] = &[
    "embed_tokens.weight",
    "wte.weight",
    "embed_in.weight",
    "word_embeddings.weight",
];

/// Untied output projections
pub const HEAD_SUFFIXES: &[&str] = &["lm_head.weight", "embed_out.weight"];

fn has_suffix(name: &str, suffix: &str) -> bool {
    name == suffix
        || name
            .strip_suffix(suffix)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[must_use]
pub fn is_embedding(name: &str) -> bool {
    EMBEDDING_SUFFIXES.iter().any(|s| has_suffix(name, s))
}

#[must_use]
pub fn is_head(name: &str) -> bool {
    HEAD_SUFFIXES.iter().any(|s| has_suffix(name, s))
}

/// Name of the token embedding in a checkpoint
#[must_use]
pub fn find_embedding(tensors: &TensorMap) -> Option<String> {
    tensors.keys().find(|name| is_embedding(name)).cloned()
}

/// Name of the untied LM head, if the checkpoint has one
#[must_use]
pub fn find_head(tensors: &TensorMap) -> Option<String> {
    tensors.keys().find(|name| is_head(name)).cloned()
}

/// Module path of a weight (`a.b.q_proj.weight` → `a.b.q_proj`)
#[must_use]
pub fn module_of(name: &str) -> &str {
    name.strip_suffix(".weight").unwrap_or(name)
}

/// Compare dotted names with numeric segments ordered by value,
/// so `layers.2` sorts before `layers.10`
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
