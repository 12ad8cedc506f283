//! The conversion pipeline: furigana parsing, word segmentation, phoneme
//! emission, composed behind one handle.
//!
//! An `Engine` is built once from loaded dictionaries and is read-only
//! afterwards; `&self` conversions may run concurrently from any number of
//! threads.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::converter::{self, MatchedSpan};
use crate::dict::{PhonemeDictionary, WordDictionary};
use crate::furigana;
use crate::segmenter;

/// The topic particle は is pronounced "wa" when it stands alone as a token.
const TOPIC_PARTICLE: &str = "は";
const TOPIC_PARTICLE_PHONEME: &str = "wa";

pub struct Engine {
    phonemes: Arc<PhonemeDictionary>,
    words: Option<Arc<WordDictionary>>,
    segmentation: bool,
}

/// Full conversion output for diagnostics: the phoneme string plus which
/// dictionary spans produced it and what passed through unmatched.
#[derive(Debug, Default, Serialize)]
pub struct ConversionReport {
    pub phonemes: String,
    pub matches: Vec<MatchedSpan>,
    pub unmatched: Vec<String>,
    /// Wall-clock conversion time in microseconds. Informational only.
    pub elapsed_us: u64,
}

impl Engine {
    pub fn new(phonemes: Arc<PhonemeDictionary>) -> Self {
        debug!(entries = phonemes.entry_count(), "engine created");
        Self {
            phonemes,
            words: None,
            segmentation: true,
        }
    }

    pub fn from_parts(
        phonemes: Arc<PhonemeDictionary>,
        words: Option<Arc<WordDictionary>>,
        segmentation: bool,
    ) -> Self {
        Self {
            phonemes,
            words,
            segmentation,
        }
    }

    pub fn set_words(&mut self, words: Arc<WordDictionary>) {
        debug!(words = words.word_count(), "word dictionary attached");
        self.words = Some(words);
    }

    pub fn set_segmentation(&mut self, enabled: bool) {
        self.segmentation = enabled;
    }

    pub fn segmentation(&self) -> bool {
        self.segmentation
    }

    pub fn entry_count(&self) -> usize {
        self.phonemes.entry_count()
    }

    pub fn word_count(&self) -> Option<usize> {
        self.words.as_ref().map(|w| w.word_count())
    }

    /// Convert text to a phoneme string. With segmentation active, token
    /// phonemes are joined by single spaces; otherwise the furigana-expanded
    /// text is converted in one pass with no spaces inserted.
    pub fn convert(&self, text: &str) -> String {
        match self.segmentation_words() {
            Some(words) => {
                let segments = furigana::parse(text, Some(words));
                let tokens = segmenter::tokenize(&segments, words, Some(&self.phonemes));
                let mut out = String::with_capacity(text.len());
                for (i, token) in tokens.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    if token == TOPIC_PARTICLE {
                        out.push_str(TOPIC_PARTICLE_PHONEME);
                    } else {
                        converter::convert_into(&self.phonemes, token, &mut out);
                    }
                }
                out
            }
            None => {
                let segments = furigana::parse(text, None);
                let mut expanded = String::with_capacity(text.len());
                for segment in &segments {
                    expanded.push_str(segment.effective_text());
                }
                converter::convert(&self.phonemes, &expanded)
            }
        }
    }

    /// Convert with per-span diagnostics and timing.
    pub fn convert_detailed(&self, text: &str) -> ConversionReport {
        let start = Instant::now();
        let mut report = ConversionReport::default();

        match self.segmentation_words() {
            Some(words) => {
                let segments = furigana::parse(text, Some(words));
                let tokens = segmenter::tokenize(&segments, words, Some(&self.phonemes));
                let mut byte_offset = 0;
                for (i, token) in tokens.iter().enumerate() {
                    if i > 0 {
                        report.phonemes.push(' ');
                    }
                    if token == TOPIC_PARTICLE {
                        report.phonemes.push_str(TOPIC_PARTICLE_PHONEME);
                        report.matches.push(MatchedSpan {
                            surface: token.clone(),
                            phoneme: TOPIC_PARTICLE_PHONEME.to_string(),
                            start_byte: byte_offset,
                        });
                    } else {
                        let token_result =
                            converter::convert_detailed(&self.phonemes, token, byte_offset);
                        report.phonemes.push_str(&token_result.phonemes);
                        report.matches.extend(token_result.matches);
                        report.unmatched.extend(token_result.unmatched);
                    }
                    byte_offset += token.len();
                }
            }
            None => {
                let segments = furigana::parse(text, None);
                let mut expanded = String::with_capacity(text.len());
                for segment in &segments {
                    expanded.push_str(segment.effective_text());
                }
                let result = converter::convert_detailed(&self.phonemes, &expanded, 0);
                report.phonemes = result.phonemes;
                report.matches = result.matches;
                report.unmatched = result.unmatched;
            }
        }

        report.elapsed_us = start.elapsed().as_micros() as u64;
        report
    }

    /// The word dictionary, when segmentation should actually run.
    fn segmentation_words(&self) -> Option<&WordDictionary> {
        if self.segmentation {
            self.words.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phoneme_dict() -> Arc<PhonemeDictionary> {
        Arc::new(PhonemeDictionary::from_entries([
            ("こんにちは", "koɴnitɕiwa"),
            ("私", "watasi"),
            ("は", "ha"),
            ("リンゴ", "ɾiŋgo"),
            ("が", "ga"),
            ("すき", "sɯki"),
            ("です", "desɯ"),
            ("けんた", "keɴta"),
            ("バカ", "baka"),
            ("みて", "mite"),
            ("おとこ", "otoko"),
            ("その", "sono"),
            ("ひるごはん", "çiɾɯgohaɴ"),
        ]))
    }

    fn word_dict() -> Arc<WordDictionary> {
        Arc::new(WordDictionary::from_words(["私", "リンゴ", "すき", "見て"]))
    }

    fn engine() -> Engine {
        let mut engine = Engine::new(phoneme_dict());
        engine.set_words(word_dict());
        engine
    }

    #[test]
    fn test_plain_conversion_without_segmentation() {
        let mut engine = engine();
        engine.set_segmentation(false);
        // Whole-string trie match; the particle rule does not fire because
        // は is not a standalone token here.
        assert_eq!(engine.convert("こんにちは"), "koɴnitɕiwa");
    }

    #[test]
    fn test_segmented_sentence_with_particles() {
        let engine = engine();
        assert_eq!(
            engine.convert("私はリンゴがすきです"),
            "watasi wa ɾiŋgo ga sɯki desɯ"
        );
    }

    #[test]
    fn test_furigana_hint_with_particle() {
        let engine = engine();
        assert_eq!(engine.convert("健太「けんた」はバカ"), "keɴta wa baka");
    }

    #[test]
    fn test_compound_override_single_token() {
        let engine = engine();
        assert_eq!(engine.convert("見「み」て"), "mite");
    }

    #[test]
    fn test_kana_prefix_stays_out_of_hint() {
        let engine = engine();
        assert_eq!(engine.convert("その男「おとこ」"), "sono otoko");
    }

    #[test]
    fn test_okurigana_surface_reading() {
        let engine = engine();
        assert_eq!(engine.convert("昼ご飯「ひるごはん」"), "çiɾɯgohaɴ");
    }

    #[test]
    fn test_standalone_particle_token() {
        let engine = engine();
        assert_eq!(engine.convert("は"), "wa");
    }

    #[test]
    fn test_empty_input() {
        let engine = engine();
        assert_eq!(engine.convert(""), "");
        let mut off = self::engine();
        off.set_segmentation(false);
        assert_eq!(off.convert(""), "");
    }

    #[test]
    fn test_whitespace_only_input() {
        let engine = engine();
        // Segmentation on: whitespace is skipped, nothing to emit.
        assert_eq!(engine.convert("   "), "");
        // Segmentation off: whitespace passes through untouched.
        let mut off = self::engine();
        off.set_segmentation(false);
        assert_eq!(off.convert("   "), "   ");
    }

    #[test]
    fn test_pass_through_of_unknown_text() {
        let mut engine = engine();
        engine.set_segmentation(false);
        assert_eq!(engine.convert("hello!"), "hello!");
    }

    #[test]
    fn test_segmentation_off_still_expands_hints() {
        let mut engine = engine();
        engine.set_segmentation(false);
        assert_eq!(engine.convert("健太「けんた」はバカ"), "keɴtahabaka");
    }

    #[test]
    fn test_no_word_dict_behaves_like_segmentation_off() {
        let engine = Engine::new(phoneme_dict());
        assert_eq!(engine.convert("私はリンゴ"), "watasihaɾiŋgo");
    }

    #[test]
    fn test_deterministic() {
        let engine = engine();
        let a = engine.convert("私はリンゴがすきです");
        let b = engine.convert("私はリンゴがすきです");
        assert_eq!(a, b);
    }

    #[test]
    fn test_detailed_report() {
        let engine = engine();
        let report = engine.convert_detailed("健太「けんた」はバカ");
        assert_eq!(report.phonemes, "keɴta wa baka");
        let surfaces: Vec<&str> = report.matches.iter().map(|m| m.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["けんた", "は", "バカ"]);
        assert_eq!(report.matches[1].phoneme, "wa");
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn test_detailed_report_collects_unmatched() {
        let mut engine = engine();
        engine.set_segmentation(false);
        let report = engine.convert_detailed("Qこんにちは");
        assert_eq!(report.phonemes, "Qkoɴnitɕiwa");
        assert_eq!(report.unmatched, vec!["Q"]);
    }
}
