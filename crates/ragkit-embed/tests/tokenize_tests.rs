use std::collections::HashMap;

use candle_core::Device;
use tokenizers::models::wordlevel::WordLevel;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::pre_tokenizers::PreTokenizerWrapper;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::processors::PostProcessorWrapper;
use tokenizers::Tokenizer;

use ragkit_embed::tokenize::{configure_tokenizer, tokenize_batch};

const PAD: u32 = 0;
const CLS: u32 = 2;
const SEP: u32 = 3;

fn word_tokenizer() -> Tokenizer {
    let vocab: HashMap<String, u32> = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "a", "b", "c", "d", "e"]
        .iter()
        .enumerate()
        .map(|(i, w)| (w.to_string(), i as u32))
        .collect();
    let model = WordLevel::builder().vocab(vocab).unk_token("[UNK]".to_string()).build().unwrap();
    let mut tokenizer = Tokenizer::new(model);
    tokenizer.with_pre_tokenizer(PreTokenizerWrapper::from(Whitespace::default()));
    tokenizer.with_post_processor(PostProcessorWrapper::from(BertProcessing::new(
        ("[SEP]".to_string(), SEP),
        ("[CLS]".to_string(), CLS),
    )));
    tokenizer
}

fn texts(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

#[test]
fn rows_are_padded_to_the_longest_input() {
    let mut tokenizer = word_tokenizer();
    configure_tokenizer(&mut tokenizer, 16).unwrap();

    let batch = tokenize_batch(&tokenizer, &texts(&["a b c", "d"]), PAD, &Device::Cpu).unwrap();
    let ids: Vec<Vec<u32>> = batch.input_ids.to_vec2().unwrap();
    let mask: Vec<Vec<u32>> = batch.attention_mask.to_vec2().unwrap();
    let types: Vec<Vec<u32>> = batch.token_type_ids.to_vec2().unwrap();

    assert_eq!(ids, vec![vec![CLS, 4, 5, 6, SEP], vec![CLS, 7, SEP, PAD, PAD]]);
    assert_eq!(mask, vec![vec![1, 1, 1, 1, 1], vec![1, 1, 1, 0, 0]]);
    assert!(types.iter().flatten().all(|t| *t == 0));
}

#[test]
fn truncation_keeps_special_tokens() {
    let mut tokenizer = word_tokenizer();
    configure_tokenizer(&mut tokenizer, 4).unwrap();

    let batch = tokenize_batch(&tokenizer, &texts(&["a b c d e", "e"]), PAD, &Device::Cpu).unwrap();
    let ids: Vec<Vec<u32>> = batch.input_ids.to_vec2().unwrap();
    assert_eq!(ids[0], vec![CLS, 4, 5, SEP]);
    assert_eq!(ids[1], vec![CLS, 8, SEP, PAD]);
}
