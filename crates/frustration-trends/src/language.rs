//! Target-language identification
//!
//! Language detection is a capability behind [`LanguageDetector`] so the
//! cleaning stage can run against a deterministic fake in tests. The bundled
//! [`StopwordLanguageDetector`] is a lightweight English heuristic: it weighs
//! English function words and common review vocabulary against the function
//! words of the other languages that dominate store exports.

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use std::collections::HashSet;
use tracing::debug;

lazy_static! {
    static ref ENGLISH_WORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for",
        "of", "with", "by", "is", "am", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "do", "does", "did", "will", "would",
        "shall", "should", "may", "might", "must", "can", "could", "i", "you",
        "he", "she", "it", "we", "they", "me", "him", "her", "us", "them",
        "my", "your", "his", "its", "our", "their", "this", "that", "these",
        "those", "not", "no", "very", "so", "too", "just", "all", "when",
        "what", "why", "how", "after", "since", "every", "now", "keeps",
        "dont", "doesnt", "cant", "wont", "isnt", "im", "ive", "it's",
        "app", "update", "good", "great", "bad", "love", "hate", "works",
        "work", "working", "useless", "terrible", "awesome", "nice", "best",
        "worst", "please", "fix", "crash", "crashes", "slow", "easy", "use",
        "meeting", "meetings", "video", "audio", "call", "calls", "browser",
        "excellent", "amazing", "poor", "helpful", "thanks", "thank",
    ]
    .into_iter()
    .collect();

    // English homographs ("no", "me", "so", "in", "die", "was") are left out.
    static ref FOREIGN_WORDS: HashSet<&'static str> = [
        // es / pt
        "el", "la", "los", "las", "es", "muy", "pero", "para", "por", "con",
        "una", "que", "del", "mas", "más", "está", "esta", "aplicación",
        "aplicacion", "não", "nao", "muito", "uma", "com", "bom", "boa",
        "buena", "bueno", "excelente",
        // fr
        "le", "les", "des", "est", "une", "très", "tres", "avec", "pour",
        "pas", "je", "c'est", "mais", "bien",
        // de
        "der", "das", "und", "ist", "nicht", "sehr", "ich", "mit", "gut",
        "eine", "auch",
        // it
        "il", "di", "che", "non", "molto", "della", "sono", "questa",
    ]
    .into_iter()
    .collect();
}

/// Decide whether text is written in the target language
pub trait LanguageDetector: Send + Sync {
    /// Returns an error when the text cannot be classified at all
    fn detect(&self, text: &str) -> Result<bool>;
}

/// Fail-closed wrapper: undetermined language counts as "not target"
pub fn is_target_language(detector: &dyn LanguageDetector, text: &str) -> bool {
    match detector.detect(text) {
        Ok(is_target) => is_target,
        Err(e) => {
            debug!("Language detection failed, excluding text: {}", e);
            false
        }
    }
}

/// English detector based on script share and function-word evidence.
///
/// Mostly-Latin text is English unless foreign function words outnumber or
/// tie the English ones, so reviews made only of content words are kept.
#[derive(Debug, Clone)]
pub struct StopwordLanguageDetector {
    min_latin_ratio: f32,
}

impl Default for StopwordLanguageDetector {
    fn default() -> Self {
        Self { min_latin_ratio: 0.9 }
    }
}

impl StopwordLanguageDetector {
    pub fn new(min_latin_ratio: f32) -> Self {
        Self { min_latin_ratio }
    }
}

impl LanguageDetector for StopwordLanguageDetector {
    fn detect(&self, text: &str) -> Result<bool> {
        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        if letters == 0 {
            return Err(anyhow!("no alphabetic content to classify"));
        }

        let ascii_letters = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
        if (ascii_letters as f32 / letters as f32) < self.min_latin_ratio {
            return Ok(false);
        }

        let lowered = text.to_lowercase();
        let mut english_hits = 0usize;
        let mut foreign_hits = 0usize;
        for token in lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
        {
            if ENGLISH_WORDS.contains(token) {
                english_hits += 1;
            } else if FOREIGN_WORDS.contains(token) {
                foreign_hits += 1;
            }
        }

        // Latin text without foreign evidence is taken as English
        Ok(foreign_hits == 0 || english_hits > foreign_hits)
    }
}
