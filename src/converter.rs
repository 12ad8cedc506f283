//! Greedy longest-match phoneme emission.

use serde::Serialize;

use crate::dict::PhonemeDictionary;
use crate::unicode;

/// One dictionary hit within a converted token.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedSpan {
    pub surface: String,
    pub phoneme: String,
    /// Byte offset of the surface within the concatenated token stream.
    pub start_byte: usize,
}

/// Outcome of converting a single token.
#[derive(Debug, Default)]
pub struct TokenConversion {
    pub phonemes: String,
    pub matches: Vec<MatchedSpan>,
    pub unmatched: Vec<String>,
}

/// Convert one token: at each cursor position emit the phoneme of the
/// longest dictionary prefix, or pass the code point through verbatim.
pub fn convert(dict: &PhonemeDictionary, token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    convert_into(dict, token, &mut out);
    out
}

pub(crate) fn convert_into(dict: &PhonemeDictionary, token: &str, out: &mut String) {
    let chars: Vec<char> = token.chars().collect();
    let mut pos = 0;
    while pos < chars.len() {
        match dict.longest_match(&chars, pos) {
            Some(m) => {
                out.push_str(m.value);
                pos += m.len;
            }
            None => {
                out.push(chars[pos]);
                pos += 1;
            }
        }
    }
}

/// Like [`convert`], but records matched spans and unmatched characters.
/// `base_offset` shifts the reported byte positions, so callers converting
/// a token stream can report offsets into the whole stream.
pub(crate) fn convert_detailed(
    dict: &PhonemeDictionary,
    token: &str,
    base_offset: usize,
) -> TokenConversion {
    // The decoder's parallel offset array maps match positions in the
    // char walk back to byte positions in the token.
    let decoded = unicode::decode(token.as_bytes());
    let chars: Vec<char> = decoded.code_points.iter().copied().map(unicode::to_char).collect();

    let mut result = TokenConversion::default();
    let mut pos = 0;
    while pos < chars.len() {
        match dict.longest_match(&chars, pos) {
            Some(m) => {
                let surface: String = chars[pos..pos + m.len].iter().collect();
                result.matches.push(MatchedSpan {
                    surface,
                    phoneme: m.value.to_string(),
                    start_byte: base_offset + decoded.byte_offsets[pos],
                });
                result.phonemes.push_str(m.value);
                pos += m.len;
            }
            None => {
                let c = chars[pos];
                result.unmatched.push(c.to_string());
                result.phonemes.push(c);
                pos += 1;
            }
        }
    }
    result
}
