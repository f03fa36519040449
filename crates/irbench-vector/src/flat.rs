//! Exact inner-product search over L2-normalized vectors (cosine similarity).

use irbench_core::topk::select_top_k;
use irbench_core::types::SearchHit;
use irbench_core::{Error, Result, Stage};

/// Divide `v` by its Euclidean norm in place.
///
/// Zero-norm and non-finite vectors are rejected instead of producing
/// NaN/Inf similarities.
pub fn l2_normalize(v: &mut [f32], id: &str, stage: Stage) -> Result<()> {
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::NonFiniteVector { id: id.to_string(), stage });
    }
    let norm = v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Err(Error::ZeroNormVector { id: id.to_string(), stage });
    }
    for x in v.iter_mut() {
        *x = (f64::from(*x) / norm) as f32;
    }
    Ok(())
}

/// Row-major store of normalized document vectors, one row per corpus index.
#[derive(Debug, Clone)]
pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    /// Normalize and store one vector per document. `ids` name the rows for
    /// error reporting and must line up with `vectors`.
    pub fn build<S: AsRef<str>>(ids: &[S], vectors: Vec<Vec<f32>>) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(Error::InvalidConfig(format!(
                "{} vectors supplied for {} documents",
                vectors.len(),
                ids.len()
            )));
        }
        let Some(dim) = vectors.first().map(Vec::len) else {
            return Err(Error::EmptyCorpus);
        };
        let mut data = Vec::with_capacity(dim * vectors.len());
        for (id, mut v) in ids.iter().zip(vectors) {
            let id = id.as_ref();
            if v.len() != dim {
                return Err(Error::DimensionMismatch { id: id.to_string(), stage: Stage::Index, expected: dim, found: v.len() });
            }
            l2_normalize(&mut v, id, Stage::Index)?;
            data.extend_from_slice(&v);
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Stored (normalized) vector of a document.
    pub fn vector(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    /// Cosine similarity of `query` to every stored vector, by corpus index.
    pub fn similarities(&self, query_id: &str, query: &[f32]) -> Result<Vec<f64>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                id: query_id.to_string(),
                stage: Stage::Query,
                expected: self.dim,
                found: query.len(),
            });
        }
        let mut q = query.to_vec();
        l2_normalize(&mut q, query_id, Stage::Query)?;
        Ok(self
            .data
            .chunks_exact(self.dim)
            .map(|row| f64::from(row.iter().zip(&q).map(|(a, b)| a * b).sum::<f32>()))
            .collect())
    }

    /// Exact k-nearest-neighbour search by cosine similarity.
    pub fn search(&self, query_id: &str, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        Ok(select_top_k(&self.similarities(query_id, query)?, k))
    }
}
