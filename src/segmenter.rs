//! Greedy longest-match word segmentation.
//!
//! Dictionary words are matched from the word trie; runs with no match in
//! either trie are coalesced into single grammatical tokens, which yields
//! natural particle and inflection grouping (は, が, です, ました) without
//! explicit lists.

use crate::dict::{PhonemeDictionary, WordDictionary};
use crate::furigana::Segment;

/// Tokenize parsed segments into words.
///
/// A hint segment contributes its whole reading as one token. Plain
/// segments are scanned left to right: the longest word-trie match wins,
/// the phoneme trie serves as a fallback word list, and anything neither
/// trie knows accumulates into a grammar run until the next word match or
/// whitespace.
pub fn tokenize(
    segments: &[Segment],
    words: &WordDictionary,
    phonemes: Option<&PhonemeDictionary>,
) -> Vec<String> {
    let mut tokens = Vec::new();

    for segment in segments {
        let text = match segment {
            Segment::Hint { reading, .. } => {
                tokens.push(reading.clone());
                continue;
            }
            Segment::Plain { text } => text,
        };

        let chars: Vec<char> = text.chars().collect();
        let mut pos = 0;
        while pos < chars.len() {
            if chars[pos].is_ascii_whitespace() {
                pos += 1;
                continue;
            }

            let mut matched = words
                .longest_match(&chars, pos)
                .map(|m| m.len)
                .unwrap_or(0);
            if matched == 0 {
                if let Some(phonemes) = phonemes {
                    matched = phonemes
                        .longest_match(&chars, pos)
                        .map(|m| m.len)
                        .unwrap_or(0);
                }
            }

            if matched > 0 {
                tokens.push(chars[pos..pos + matched].iter().collect());
                pos += matched;
            } else {
                // Grammar run: extend until a dictionary word starts, the
                // segment ends, or whitespace is hit.
                let start = pos;
                pos += 1;
                while pos < chars.len()
                    && !chars[pos].is_ascii_whitespace()
                    && words.longest_match(&chars, pos).is_none()
                {
                    pos += 1;
                }
                tokens.push(chars[start..pos].iter().collect());
            }
        }
    }

    tokens
}
