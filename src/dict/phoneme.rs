use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, warn};

use super::{binary, DictError};
use crate::trie::{Match, Trie};

/// Surface-form → phoneme-string dictionary.
#[derive(Debug)]
pub struct PhonemeDictionary {
    trie: Trie,
}

impl PhonemeDictionary {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut trie = Trie::new();
        for (key, value) in entries {
            trie.insert(key.as_ref(), value.as_ref());
        }
        Self { trie }
    }

    /// Parse a flat `{"surface": "phoneme", ...}` map.
    ///
    /// The shipped data contains no escapes or nested values, so a plain
    /// string-to-string map covers it; anything else is a parse error.
    pub fn from_map_slice(bytes: &[u8]) -> Result<Self, DictError> {
        let map: HashMap<String, String> =
            serde_json::from_slice(bytes).map_err(|e| DictError::Parse(e.to_string()))?;
        let mut trie = Trie::new();
        for (key, value) in map {
            trie.insert(&key, value);
        }
        Ok(Self { trie })
    }

    pub fn from_map_file(path: &Path) -> Result<Self, DictError> {
        let bytes = fs::read(path)?;
        let dict = Self::from_map_slice(&bytes)?;
        debug!(entries = dict.entry_count(), path = %path.display(), "loaded phoneme map");
        Ok(dict)
    }

    /// Load a compiled JPHO image from memory.
    pub fn from_binary_slice(data: &[u8]) -> Result<Self, DictError> {
        let mut trie = Trie::new();
        binary::load_jpho(data, &mut trie)?;
        Ok(Self { trie })
    }

    /// Open a compiled dictionary file, mmapped to avoid doubling peak
    /// memory while the trie is built.
    pub fn open_binary(path: &Path) -> Result<Self, DictError> {
        let file = File::open(path)?;
        // SAFETY: the file is opened read-only and the mapping is dropped
        // once the trie is built.
        let mmap = unsafe { Mmap::map(&file)? };
        let dict = Self::from_binary_slice(&mmap)?;
        debug!(entries = dict.entry_count(), path = %path.display(), "loaded compiled dictionary");
        Ok(dict)
    }

    /// Startup path: prefer the compiled sibling `.trie`, fall back to the
    /// map file itself.
    pub fn load_auto(path: &Path) -> Result<Self, DictError> {
        let compiled = path.with_extension("trie");
        if compiled.is_file() {
            match Self::open_binary(&compiled) {
                Ok(dict) => return Ok(dict),
                Err(e) => {
                    warn!(path = %compiled.display(), error = %e, "compiled dictionary unusable, falling back to map file");
                }
            }
        }
        Self::from_map_file(path)
    }

    /// Serialize as a JPHO image.
    pub fn to_bytes(&self) -> Vec<u8> {
        binary::write_jpho(&self.trie.entries())
    }

    pub fn save_binary(&self, path: &Path) -> Result<(), DictError> {
        Ok(fs::write(path, self.to_bytes())?)
    }

    pub fn entry_count(&self) -> usize {
        self.trie.len()
    }

    pub fn lookup(&self, surface: &str) -> Option<&str> {
        self.trie.get(surface)
    }

    /// Longest dictionary prefix of `chars[start..]`.
    pub fn longest_match(&self, chars: &[char], start: usize) -> Option<Match<'_>> {
        self.trie.longest_match(chars, start)
    }
}
