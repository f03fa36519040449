use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use irbench_core::traits::Embedder;
use irbench_core::Result;

/// Deterministic feature-hashing encoder. Each lowercase whitespace token
/// lands in one bucket with a signed weight; the result is L2-normalized.
/// Text without tokens encodes to the zero vector.
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hash:{dim}") }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        if self.dim == 0 {
            return v;
        }
        for (i, token) in text.to_lowercase().split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let magnitude = (((h >> 32) as u32) as f32) / (u32::MAX as f32) + (i % 3) as f32 * 0.01;
            v[idx] += if h & 1 == 0 { magnitude } else { -magnitude };
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
