// ============================================================
// Layer 4 — Sentiment Records
// ============================================================
// The sentiment task reads JSONL: one record per line with a
// 1..=5 star rating and the review text. Ratings are shifted to
// 0-based class labels here, at the boundary, so everything
// downstream works in label space.
//
// Tokenisation happens in the application layer (it owns the
// tokenizer); this module only defines the record format, the
// padded sample storage, and the file parsing.

use anyhow::{bail, Context, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::SentimentSample;

pub const NUMBER_OF_CLASSES: usize = 5;

/// One line of the JSONL input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRecord {
    /// Star rating, 1..=5.
    pub rating: u8,
    pub text: String,
}

impl SentimentRecord {
    /// The 0-based class label this record trains towards.
    pub fn label(&self) -> Result<usize> {
        if !(1..=NUMBER_OF_CLASSES as u8).contains(&self.rating) {
            bail!("rating {} is outside 1..=5", self.rating);
        }
        Ok(self.rating as usize - 1)
    }
}

/// Parse a JSONL file of sentiment records.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<SentimentRecord>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read sentiment data from '{}'", path.display()))?;

    let mut records = Vec::new();
    for (number, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: SentimentRecord = serde_json::from_str(line)
            .with_context(|| format!("Malformed record on line {}", number + 1))?;
        records.push(record);
    }

    tracing::info!("Loaded {} sentiment records from '{}'", records.len(), path.display());
    Ok(records)
}

pub struct SentimentDataset {
    samples: Vec<SentimentSample>,
}

impl SentimentDataset {
    pub fn new(samples: Vec<SentimentSample>) -> Self {
        Self { samples }
    }
}

impl Dataset<SentimentSample> for SentimentDataset {
    fn get(&self, index: usize) -> Option<SentimentSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratings_shift_to_zero_based_labels() {
        let record = SentimentRecord { rating: 1, text: "awful".into() };
        assert_eq!(record.label().unwrap(), 0);
        let record = SentimentRecord { rating: 5, text: "great".into() };
        assert_eq!(record.label().unwrap(), 4);
    }

    #[test]
    fn test_out_of_range_ratings_are_rejected() {
        let record = SentimentRecord { rating: 0, text: "?".into() };
        assert!(record.label().is_err());
        let record = SentimentRecord { rating: 6, text: "?".into() };
        assert!(record.label().is_err());
    }

    #[test]
    fn test_jsonl_parsing_skips_blank_lines() {
        let dir = std::env::temp_dir().join("metaformer-sentiment-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("reviews.jsonl");
        std::fs::write(
            &path,
            "{\"rating\": 4, \"text\": \"solid\"}\n\n{\"rating\": 2, \"text\": \"meh\"}\n",
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rating, 4);
        assert_eq!(records[1].text, "meh");
    }
}
