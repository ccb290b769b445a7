//! Labeled evaluation dataset.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sentences grouped by character, then by the emotion they were written to express.
///
/// ```json
/// [{"character_information": "...",
///   "sentences": [{"emotion_label": "悲傷", "emotion_sentences": ["..."]}]}]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    pub characters: Vec<CharacterSentences>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSentences {
    pub character_information: String,
    pub sentences: Vec<LabeledSentences>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSentences {
    pub emotion_label: String,
    pub emotion_sentences: Vec<String>,
}

/// One sentence to classify with its expected label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub index: usize,
    pub character: String,
    pub expected_label: String,
    pub sentence: String,
}

impl Dataset {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Flatten into samples, numbered in file order.
    pub fn samples(&self) -> Vec<Sample> {
        self.characters
            .iter()
            .flat_map(|c| {
                c.sentences.iter().flat_map(move |group| {
                    group.emotion_sentences.iter().map(move |s| {
                        (
                            c.character_information.clone(),
                            group.emotion_label.clone(),
                            s.clone(),
                        )
                    })
                })
            })
            .enumerate()
            .map(|(index, (character, expected_label, sentence))| Sample {
                index,
                character,
                expected_label,
                sentence,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.characters
            .iter()
            .flat_map(|c| c.sentences.iter())
            .map(|g| g.emotion_sentences.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
