//! Inline reading-hint parsing.
//!
//! Splits input into plain runs and `surface「reading」` hints. The corner
//! brackets 「 (U+300C) and 」 (U+300D) are the only recognized delimiters;
//! hints do not nest.

use crate::dict::WordDictionary;
use crate::unicode::{is_kana, is_kanji, is_surface_boundary};

pub const OPEN_BRACKET: char = '「';
pub const CLOSE_BRACKET: char = '」';

/// A run of input, either plain text or a surface with a forced reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain { text: String },
    Hint { surface: String, reading: String },
}

impl Segment {
    /// The text that downstream stages should pronounce.
    pub fn effective_text(&self) -> &str {
        match self {
            Self::Plain { text } => text,
            Self::Hint { reading, .. } => reading,
        }
    }

    fn plain(chars: &[char]) -> Self {
        Self::Plain {
            text: chars.iter().collect(),
        }
    }
}

/// Parse `text` into segments.
///
/// When a word dictionary is supplied, a hint whose surface continues into a
/// dictionary word after the closing bracket is collapsed into one plain
/// segment, with the reading substituted for the surface (e.g. 見「み」て
/// with 見て in the dictionary becomes plain みて). This keeps forced
/// readings from splitting inflected forms the dictionary already covers.
pub fn parse(text: &str, words: Option<&WordDictionary>) -> Vec<Segment> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let Some(open) = find(&chars, pos, OPEN_BRACKET) else {
            push_plain(&mut segments, &chars[pos..]);
            break;
        };
        let Some(close) = find(&chars, open + 1, CLOSE_BRACKET) else {
            push_plain(&mut segments, &chars[pos..]);
            break;
        };

        let Some(start) = surface_start(&chars, pos, open) else {
            // Nothing to attach the reading to (bracket at the window start
            // or preceded by punctuation only): drop the hint and its
            // brackets, keep the text before it.
            push_plain(&mut segments, &chars[pos..open]);
            pos = close + 1;
            continue;
        };

        push_plain(&mut segments, &chars[pos..start]);

        let reading: String = chars[open + 1..close].iter().collect();
        let reading = reading.trim_matches(|c: char| c.is_ascii_whitespace());
        if reading.is_empty() {
            // Hint with nothing to pronounce: surface and brackets both drop.
            pos = close + 1;
            continue;
        }

        let after = close + 1;
        if let Some(words) = words {
            if let Some(len) = compound_len(words, &chars, start, open, after) {
                // The reading substitutes for the surface; the compound
                // suffix is retained verbatim.
                let mut text = reading.to_string();
                text.extend(&chars[after..after + len]);
                segments.push(Segment::Plain { text });
                pos = after + len;
                continue;
            }
        }

        segments.push(Segment::Hint {
            surface: chars[start..open].iter().collect(),
            reading: reading.to_string(),
        });
        pos = close + 1;
    }

    segments
}

/// Start of the surface span a hint attaches to.
///
/// Kana between the last non-kana character and the bracket are always part
/// of the span (okurigana). Walking further back, punctuation and whitespace
/// stop the scan, and a kana stops it unless a kanji lies between it and the
/// window start (その男「おとこ」 attaches to 男 only, while 昼ご飯 is
/// captured whole). Returns `None` when the span comes out empty.
fn surface_start(chars: &[char], window_start: usize, open: usize) -> Option<usize> {
    let last_non_kana = (window_start..open).rev().find(|&i| !is_kana(chars[i]))?;

    let mut start = last_non_kana + 1;
    for i in (window_start..=last_non_kana).rev() {
        let c = chars[i];
        if is_surface_boundary(c) {
            break;
        }
        if is_kana(c) && !chars[window_start..i].iter().any(|&p| is_kanji(p)) {
            break;
        }
        start = i;
    }

    (start < open).then_some(start)
}

/// Length of the longest dictionary word continuing past the closing
/// bracket, walking the trie through the surface first.
fn compound_len(
    words: &WordDictionary,
    chars: &[char],
    surface_start: usize,
    open: usize,
    after: usize,
) -> Option<usize> {
    let mut walker = words.walker();
    for &c in &chars[surface_start..open] {
        if !walker.step(c) {
            return None;
        }
    }
    let mut best = None;
    for (i, &c) in chars[after..].iter().enumerate() {
        if !walker.step(c) {
            break;
        }
        if walker.value().is_some() {
            best = Some(i + 1);
        }
    }
    best
}

fn find(chars: &[char], from: usize, needle: char) -> Option<usize> {
    chars[from..]
        .iter()
        .position(|&c| c == needle)
        .map(|i| from + i)
}

fn push_plain(segments: &mut Vec<Segment>, chars: &[char]) {
    if !chars.is_empty() {
        segments.push(Segment::plain(chars));
    }
}
