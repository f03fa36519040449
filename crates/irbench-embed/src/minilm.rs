//! Sentence-transformer encoder (BERT family, e.g. `all-MiniLM-L6-v2`) on candle.
//!
//! A model directory holds `config.json`, `tokenizer.json` and either
//! `model.safetensors` or `pytorch_model.bin`. Sentence vectors are the
//! attention-masked mean of the last hidden layer, L2-normalized.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use irbench_core::traits::Embedder;
use irbench_core::{Error, Result};

/// Longest input in tokens, special tokens included.
pub const MAX_SEQ_LEN: usize = 256;

/// Directory name looked up when a model id names no directory.
pub const DEFAULT_MODEL_DIR_NAME: &str = "all-MiniLM-L6-v2";

const PAD_ID: u32 = 0;

#[derive(Deserialize)]
struct EncoderShape {
    hidden_size: usize,
    #[serde(default)]
    max_position_embeddings: Option<usize>,
}

pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            tracing::info!("using Metal device");
            return dev;
        }
    }
    Device::Cpu
}

/// Find a model directory from `APP_MODEL_DIR`, `MODEL_DIR`, then
/// `models/all-MiniLM-L6-v2` relative to the working directory or its parent.
pub fn resolve_model_dir() -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() {
                tracing::info!(source = var, dir = %p.display(), "using model directory");
                return Ok(p);
            }
        }
    }
    for root in ["models", "../models"] {
        let p = Path::new(root).join(DEFAULT_MODEL_DIR_NAME);
        if p.exists() {
            tracing::info!(dir = %p.display(), "using model directory");
            return Ok(p);
        }
    }
    Err(Error::InvalidConfig(format!(
        "could not locate a {DEFAULT_MODEL_DIR_NAME} model directory; set APP_MODEL_DIR or use minilm:<dir>"
    )))
}

impl MiniLmEmbedder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let id = format!("minilm:{}", model_dir.display());
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), ?device, "loading sentence encoder");

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).map_err(|e| Error::data_load(&config_path, e))?;
        let config: BertConfig = serde_json::from_str(&raw).map_err(|e| Error::data_load(&config_path, e))?;
        let shape: EncoderShape = serde_json::from_str(&raw).map_err(|e| Error::data_load(&config_path, e))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| Error::data_load(&tokenizer_path, e))?;

        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            let bytes = std::fs::read(&safetensors).map_err(|e| Error::data_load(&safetensors, e))?;
            VarBuilder::from_buffered_safetensors(bytes, DType::F32, &device)
                .map_err(|e| Error::data_load(&safetensors, e))?
        } else {
            let pth = model_dir.join("pytorch_model.bin");
            VarBuilder::from_pth(&pth, DType::F32, &device).map_err(|e| Error::data_load(&pth, e))?
        };
        let model = BertModel::load(vb, &config).map_err(|e| Error::embedding(&id, e))?;

        let max_len = shape.max_position_embeddings.map_or(MAX_SEQ_LEN, |p| p.min(MAX_SEQ_LEN));
        tracing::info!(dim = shape.hidden_size, max_len, "sentence encoder loaded");
        Ok(Self { model, tokenizer, device, dim: shape.hidden_size, max_len, id })
    }

    fn encode(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, Box<dyn std::error::Error + Send + Sync>> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self.tokenizer.encode_batch(inputs, true)?;

        let rows: Vec<Vec<u32>> = encodings.iter().map(|enc| truncate(enc.get_ids(), self.max_len)).collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let mut ids = Vec::with_capacity(rows.len() * width);
        let mut mask = Vec::with_capacity(rows.len() * width);
        for row in &rows {
            ids.extend_from_slice(row);
            ids.extend(std::iter::repeat(PAD_ID).take(width - row.len()));
            mask.extend(std::iter::repeat(1u32).take(row.len()));
            mask.extend(std::iter::repeat(0u32).take(width - row.len()));
        }

        let input_ids = Tensor::from_vec(ids, (rows.len(), width), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (rows.len(), width), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let weights = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&weights)?.sum(1)?;
        let counts = weights.sum(1)?;
        let pooled = summed.broadcast_div(&counts)?;
        let mut vectors = pooled.to_device(&Device::Cpu)?.to_vec2::<f32>()?;
        for v in &mut vectors {
            normalize(v);
        }
        Ok(vectors)
    }
}

/// Cut to `max_len` tokens, keeping the closing special token.
fn truncate(ids: &[u32], max_len: usize) -> Vec<u32> {
    if ids.len() <= max_len {
        return ids.to_vec();
    }
    if max_len < 2 {
        return ids[..max_len].to_vec();
    }
    let mut out = ids[..max_len - 1].to_vec();
    out.extend(ids.last().copied());
    out
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() { *x /= norm; }
    }
}

impl Embedder for MiniLmEmbedder {
    fn model_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.encode(texts).map_err(|e| Error::embedding(&self.id, e))?;
        if vectors.len() != texts.len() {
            return Err(Error::embedding(&self.id, format!("encoded {} of {} texts", vectors.len(), texts.len())));
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_keeps_closing_token() {
        assert_eq!(truncate(&[101, 7, 8, 9, 102], 4), vec![101, 7, 8, 102]);
        assert_eq!(truncate(&[101, 7, 102], 4), vec![101, 7, 102]);
    }

    #[test]
    fn normalize_leaves_zero_vectors_alone() {
        let mut zero = vec![0.0f32; 3];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
        let mut v = vec![3.0f32, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn missing_model_directory_is_a_load_error() {
        let err = MiniLmEmbedder::load(Path::new("/nonexistent/minilm")).err().unwrap();
        assert!(matches!(err, Error::DataLoad { .. }), "got {err:?}");
    }
}
