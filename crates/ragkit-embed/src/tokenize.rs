use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{Tokenizer, TruncationParams};

/// Token ids, type ids and attention mask for a batch, each `[batch, tokens]`.
pub struct BatchInputs {
    pub input_ids: Tensor,
    pub token_type_ids: Tensor,
    pub attention_mask: Tensor,
}

/// Caps inputs at `max_len` tokens, special tokens included, and turns off
/// any padding baked into `tokenizer.json`; `tokenize_batch` pads itself.
pub fn configure_tokenizer(tokenizer: &mut Tokenizer, max_len: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len.max(1), ..Default::default() }))
        .map_err(|e| anyhow!("Invalid truncation settings: {}", e))?;
    tokenizer.with_padding(None);
    Ok(())
}

/// Tokenizes `texts` and right-pads every row to the longest one in the
/// batch with `pad_id`.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], pad_id: u32, device: &Device) -> Result<BatchInputs> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        rows.push((enc.get_ids().to_vec(), enc.get_type_ids().to_vec(), enc.get_attention_mask().to_vec()));
    }
    let width = rows.iter().map(|(ids, _, _)| ids.len()).max().unwrap_or(0).max(1);

    let (mut ids, mut types, mut mask) = (Vec::new(), Vec::new(), Vec::new());
    for (row_ids, row_types, row_mask) in rows {
        let pad = width - row_ids.len();
        ids.extend(row_ids.into_iter().chain(std::iter::repeat(pad_id).take(pad)));
        types.extend(row_types.into_iter().chain(std::iter::repeat(0).take(pad)));
        mask.extend(row_mask.into_iter().chain(std::iter::repeat(0).take(pad)));
    }
    let shape = (texts.len(), width);
    Ok(BatchInputs {
        input_ids: Tensor::from_vec(ids, shape, device)?,
        token_type_ids: Tensor::from_vec(types, shape, device)?,
        attention_mask: Tensor::from_vec(mask, shape, device)?,
    })
}
