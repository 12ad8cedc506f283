use std::fs;
use std::path::Path;

use tracing::debug;

use super::DictError;
use crate::trie::{Match, Trie, Walker};
use crate::unicode;

/// Word-boundary dictionary for segmentation.
///
/// Keys are whole words; the payload is the empty string, used only as an
/// end-of-word marker.
#[derive(Debug)]
pub struct WordDictionary {
    trie: Trie,
}

impl WordDictionary {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trie = Trie::new();
        for word in words {
            trie.insert(word.as_ref(), "");
        }
        Self { trie }
    }

    /// Parse a word list: one word per line, trailing whitespace stripped,
    /// empty lines skipped. Never fails; malformed bytes pass through the
    /// permissive decoder.
    pub fn from_list_slice(bytes: &[u8]) -> Self {
        let text = unicode::sanitize(bytes);
        let mut trie = Trie::new();
        for line in text.lines() {
            let word = line.trim_end();
            if !word.is_empty() {
                trie.insert(word, "");
            }
        }
        Self { trie }
    }

    pub fn from_list_file(path: &Path) -> Result<Self, DictError> {
        let bytes = fs::read(path)?;
        let dict = Self::from_list_slice(&bytes);
        debug!(words = dict.word_count(), path = %path.display(), "loaded word list");
        Ok(dict)
    }

    pub fn word_count(&self) -> usize {
        self.trie.len()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.trie.contains(word)
    }

    /// Longest word starting at `chars[start..]`.
    pub fn longest_match(&self, chars: &[char], start: usize) -> Option<Match<'_>> {
        self.trie.longest_match(chars, start)
    }

    pub fn walker(&self) -> Walker<'_> {
        self.trie.walker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_list_slice() {
        let dict = WordDictionary::from_list_slice("私\nリンゴ  \r\n\nすき\n".as_bytes());
        assert_eq!(dict.word_count(), 3);
        assert!(dict.contains("私"));
        assert!(dict.contains("リンゴ"));
        assert!(dict.contains("すき"));
        assert!(!dict.contains("リンゴ  "));
    }

    #[test]
    fn test_from_list_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ja_words.txt");
        fs::write(&path, "見て\n昼ご飯\n").unwrap();

        let dict = WordDictionary::from_list_file(&path).unwrap();
        assert_eq!(dict.word_count(), 2);
        assert!(dict.contains("昼ご飯"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = WordDictionary::from_list_file(Path::new("/nonexistent/ja_words.txt"))
            .unwrap_err();
        assert!(matches!(err, DictError::Io(_)));
    }

    #[test]
    fn test_duplicate_words_counted_once() {
        let dict = WordDictionary::from_list_slice("木\n木\n".as_bytes());
        assert_eq!(dict.word_count(), 1);
    }
}
