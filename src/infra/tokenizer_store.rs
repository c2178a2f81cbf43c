// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds a word-level vocabulary from the task corpus and writes
// it as a tokenizer JSON that `tokenizers::Tokenizer::from_file`
// can load back. Writing the JSON directly sidesteps the
// Trainer/ModelWrapper type mismatch in tokenizers 0.15.
//
// Id layout: [PAD] = 0, [UNK] = 1, then corpus words by falling
// frequency from id 2 up. Every id stays below the configured
// vocabulary size, which is exactly the bound the model's
// embedding table enforces.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tokenizers::Tokenizer;

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load an existing tokenizer or build one from `texts`.
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        let path = self.dir.join("tokenizer.json");
        if path.exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join("tokenizer.json");
        Tokenizer::from_file(&path).map_err(|e| {
            anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e)
        })
    }

    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir).ok();

        // Count word frequencies over the whole corpus, lowercased and
        // stripped of edge punctuation to keep the vocabulary dense.
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in text.split_whitespace() {
                let word = word.to_lowercase();
                let word = word.trim_matches(|c: char| !c.is_alphanumeric());
                if !word.is_empty() {
                    *freq.entry(word.to_string()).or_insert(0) += 1;
                }
            }
        }

        // Most frequent words win the id range below vocab_size;
        // two slots are reserved for the special tokens.
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(2));

        let mut vocab = serde_json::json!({
            "[PAD]": PAD_ID,
            "[UNK]": UNK_ID,
        });
        let mut next_id = 2u32;
        for (word, _) in &words {
            if vocab.get(word).is_none() {
                vocab[word] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": PAD_ID, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": UNK_ID, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let path = self.dir.join("tokenizer.json");
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            next_id,
            path.display()
        );

        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_vocabulary_stays_below_the_requested_size() {
        let dir = std::env::temp_dir().join(format!(
            "metaformer-tokenizer-test-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);

        let store = TokenizerStore::new(&dir);
        let texts = vec![
            "the cat sat on the mat".to_string(),
            "the dog sat on the log".to_string(),
        ];
        let tokenizer = store.load_or_build(&texts, 6).unwrap();

        let encoding = tokenizer.encode("the cat barked", false).unwrap();
        assert!(!encoding.get_ids().is_empty());
        // Unknown words fold into [UNK]; every id stays below the vocabulary size.
        assert!(encoding.get_ids().iter().all(|&id| id < 6));
    }
}
