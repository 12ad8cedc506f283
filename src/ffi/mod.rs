//! C ABI surface over one process-wide default engine.
//!
//! Initialization and cleanup take the state write lock; conversions hold
//! the read lock for their duration, so dictionary replacement blocks until
//! in-flight conversions finish. The last error message is per-thread.

use std::cell::RefCell;
use std::ffi::{c_char, c_int, CStr, CString};
use std::path::Path;
use std::ptr;
use std::slice;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::dict::{PhonemeDictionary, WordDictionary};
use crate::engine::Engine;
use crate::unicode;

struct FfiState {
    phonemes: Option<Arc<PhonemeDictionary>>,
    words: Option<Arc<WordDictionary>>,
    segmentation: bool,
}

static STATE: RwLock<FfiState> = RwLock::new(FfiState {
    phonemes: None,
    words: None,
    segmentation: true,
});

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

fn set_last_error(msg: impl Into<Vec<u8>>) {
    let cstring = CString::new(msg).unwrap_or_default();
    LAST_ERROR.with(|e| *e.borrow_mut() = cstring);
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = CString::default());
}

/// Safely convert a C string pointer to a `&str`.
/// Returns `None` if the pointer is null or contains invalid UTF-8.
unsafe fn cptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Validate a path argument, setting the last error and returning `$on_err`
/// from the calling function if the pointer is null or not UTF-8.
macro_rules! ffi_path {
    ($name:ident = $ptr:expr, $on_err:expr) => {
        let Some($name) = (unsafe { cptr_to_str($ptr) }) else {
            set_last_error("path argument is null or not valid UTF-8");
            return $on_err;
        };
    };
}

fn write_lock() -> Option<std::sync::RwLockWriteGuard<'static, FfiState>> {
    match STATE.write() {
        Ok(guard) => Some(guard),
        Err(_) => {
            set_last_error("engine state lock poisoned");
            None
        }
    }
}

/// Load the phoneme dictionary from a map file, preferring a compiled
/// sibling `.trie`. Returns 1 on success, 0 on failure.
#[no_mangle]
pub extern "C" fn hatsuon_init(dict_path: *const c_char) -> c_int {
    ffi_path!(path = dict_path, 0);
    let Some(mut state) = write_lock() else {
        return 0;
    };
    match PhonemeDictionary::load_auto(Path::new(path)) {
        Ok(dict) => {
            clear_last_error();
            state.phonemes = Some(Arc::new(dict));
            1
        }
        Err(e) => {
            set_last_error(e.to_string());
            state.phonemes = None;
            0
        }
    }
}

/// Load the phoneme dictionary from an in-memory JPHO image.
/// Returns 1 on success, 0 on failure.
#[no_mangle]
pub extern "C" fn hatsuon_init_from_memory(data: *const u8, len: c_int) -> c_int {
    if data.is_null() || len < 0 {
        set_last_error("dictionary buffer is null");
        return 0;
    }
    let bytes = unsafe { slice::from_raw_parts(data, len as usize) };
    let Some(mut state) = write_lock() else {
        return 0;
    };
    match PhonemeDictionary::from_binary_slice(bytes) {
        Ok(dict) => {
            clear_last_error();
            state.phonemes = Some(Arc::new(dict));
            1
        }
        Err(e) => {
            set_last_error(e.to_string());
            state.phonemes = None;
            0
        }
    }
}

/// Load the word list used for segmentation. Returns 1 on success.
#[no_mangle]
pub extern "C" fn hatsuon_init_word_dict(word_path: *const c_char) -> c_int {
    ffi_path!(path = word_path, 0);
    let Some(mut state) = write_lock() else {
        return 0;
    };
    match WordDictionary::from_list_file(Path::new(path)) {
        Ok(dict) => {
            clear_last_error();
            state.words = Some(Arc::new(dict));
            1
        }
        Err(e) => {
            set_last_error(e.to_string());
            state.words = None;
            0
        }
    }
}

#[no_mangle]
pub extern "C" fn hatsuon_set_segmentation(enabled: c_int) {
    if let Some(mut state) = write_lock() {
        state.segmentation = enabled != 0;
    }
}

#[no_mangle]
pub extern "C" fn hatsuon_get_segmentation() -> c_int {
    match STATE.read() {
        Ok(state) => c_int::from(state.segmentation),
        Err(_) => 0,
    }
}

/// Convert UTF-8 text into `out_buf`.
///
/// Returns the number of bytes written (excluding the NUL terminator), or
/// -1 on error with the message available via [`hatsuon_last_error`].
/// Malformed UTF-8 in the input is never an error; the bytes pass through.
/// `elapsed_us` may be null.
#[no_mangle]
pub extern "C" fn hatsuon_convert(
    text: *const c_char,
    out_buf: *mut u8,
    out_cap: c_int,
    elapsed_us: *mut i64,
) -> c_int {
    if text.is_null() || out_buf.is_null() || out_cap < 0 {
        set_last_error("null argument");
        return -1;
    }
    let bytes = unsafe { CStr::from_ptr(text) }.to_bytes();
    let input = unicode::sanitize(bytes);

    // Hold the read lock for the whole conversion so dictionary replacement
    // cannot race it.
    let Ok(state) = STATE.read() else {
        set_last_error("engine state lock poisoned");
        return -1;
    };
    let Some(phonemes) = state.phonemes.clone() else {
        set_last_error("converter not initialized; call hatsuon_init() first");
        return -1;
    };
    let engine = Engine::from_parts(phonemes, state.words.clone(), state.segmentation);

    let start = Instant::now();
    let result = engine.convert(&input);
    let micros = start.elapsed().as_micros() as i64;
    if !elapsed_us.is_null() {
        unsafe { *elapsed_us = micros };
    }

    let cap = out_cap as usize;
    if result.len() >= cap {
        set_last_error(format!(
            "output buffer too small: need {} bytes, have {}",
            result.len() + 1,
            cap
        ));
        return -1;
    }
    unsafe {
        ptr::copy_nonoverlapping(result.as_ptr(), out_buf, result.len());
        *out_buf.add(result.len()) = 0;
    }
    clear_last_error();
    result.len() as c_int
}

/// The last error message on this thread. Never null; empty when no error.
/// Valid until the next call that sets or clears the error on this thread.
#[no_mangle]
pub extern "C" fn hatsuon_last_error() -> *const c_char {
    LAST_ERROR.with(|e| e.borrow().as_ptr())
}

/// Number of phoneme entries loaded, or -1 when uninitialized.
#[no_mangle]
pub extern "C" fn hatsuon_entry_count() -> c_int {
    match STATE.read() {
        Ok(state) => state
            .phonemes
            .as_ref()
            .map_or(-1, |d| d.entry_count() as c_int),
        Err(_) => -1,
    }
}

/// Number of words loaded for segmentation, or -1 when no word list is
/// loaded.
#[no_mangle]
pub extern "C" fn hatsuon_word_count() -> c_int {
    match STATE.read() {
        Ok(state) => state
            .words
            .as_ref()
            .map_or(-1, |d| d.word_count() as c_int),
        Err(_) => -1,
    }
}

#[no_mangle]
pub extern "C" fn hatsuon_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}

/// Release all loaded dictionaries. Conversion requires a new
/// [`hatsuon_init`] afterwards.
#[no_mangle]
pub extern "C" fn hatsuon_cleanup() {
    if let Some(mut state) = write_lock() {
        state.phonemes = None;
        state.words = None;
        state.segmentation = true;
    }
    clear_last_error();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The FFI surface shares process-wide state; serialize tests touching it.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn init_sample() {
        let dict = PhonemeDictionary::from_entries([
            ("こんにちは", "koɴnitɕiwa"),
            ("私", "watasi"),
            ("は", "ha"),
            ("すき", "sɯki"),
        ]);
        let image = dict.to_bytes();
        assert_eq!(
            hatsuon_init_from_memory(image.as_ptr(), image.len() as c_int),
            1
        );
    }

    fn convert_str(text: &str) -> (c_int, String) {
        let text = CString::new(text).unwrap();
        let mut buf = [0u8; 256];
        let mut elapsed = 0i64;
        let written =
            hatsuon_convert(text.as_ptr(), buf.as_mut_ptr(), buf.len() as c_int, &mut elapsed);
        let out = if written >= 0 {
            String::from_utf8_lossy(&buf[..written as usize]).into_owned()
        } else {
            String::new()
        };
        (written, out)
    }

    fn last_error_string() -> String {
        unsafe { CStr::from_ptr(hatsuon_last_error()) }
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_ffi_convert_roundtrip() {
        let _guard = lock();
        init_sample();

        let (written, out) = convert_str("こんにちは");
        assert!(written > 0);
        assert_eq!(out, "koɴnitɕiwa");
        assert_eq!(hatsuon_entry_count(), 4);

        hatsuon_cleanup();
    }

    #[test]
    fn test_ffi_not_initialized() {
        let _guard = lock();
        hatsuon_cleanup();

        let (written, _) = convert_str("こんにちは");
        assert_eq!(written, -1);
        assert!(last_error_string().contains("not initialized"));
    }

    #[test]
    fn test_ffi_buffer_too_small() {
        let _guard = lock();
        init_sample();

        let text = CString::new("こんにちは").unwrap();
        let mut buf = [0u8; 4];
        let written =
            hatsuon_convert(text.as_ptr(), buf.as_mut_ptr(), buf.len() as c_int, ptr::null_mut());
        assert_eq!(written, -1);
        assert!(last_error_string().contains("too small"));

        hatsuon_cleanup();
    }

    #[test]
    fn test_ffi_null_safety() {
        let _guard = lock();
        init_sample();

        assert_eq!(hatsuon_init(ptr::null()), 0);
        assert_eq!(hatsuon_init_from_memory(ptr::null(), 4), 0);
        assert_eq!(hatsuon_init_word_dict(ptr::null()), 0);

        let mut buf = [0u8; 16];
        assert_eq!(
            hatsuon_convert(ptr::null(), buf.as_mut_ptr(), buf.len() as c_int, ptr::null_mut()),
            -1
        );
        let text = CString::new("は").unwrap();
        assert_eq!(
            hatsuon_convert(text.as_ptr(), ptr::null_mut(), 16, ptr::null_mut()),
            -1
        );

        hatsuon_cleanup();
    }

    #[test]
    fn test_ffi_init_rejects_bad_image() {
        let _guard = lock();
        hatsuon_cleanup();

        let image = b"XXXXnot a dictionary";
        assert_eq!(hatsuon_init_from_memory(image.as_ptr(), image.len() as c_int), 0);
        assert!(last_error_string().contains("magic"));
        assert_eq!(hatsuon_entry_count(), -1);
    }

    #[test]
    fn test_ffi_init_missing_file() {
        let _guard = lock();
        hatsuon_cleanup();

        let path = CString::new("/nonexistent/ja_phonemes.json").unwrap();
        assert_eq!(hatsuon_init(path.as_ptr()), 0);
        assert!(!last_error_string().is_empty());
    }

    #[test]
    fn test_ffi_word_dict_and_segmentation_flag() {
        let _guard = lock();
        init_sample();

        let dir = tempfile::tempdir().unwrap();
        let words_path = dir.path().join("ja_words.txt");
        std::fs::write(&words_path, "私\nすき\n").unwrap();
        let words_cstr = CString::new(words_path.to_str().unwrap()).unwrap();
        assert_eq!(hatsuon_init_word_dict(words_cstr.as_ptr()), 1);
        assert_eq!(hatsuon_word_count(), 2);

        assert_eq!(hatsuon_get_segmentation(), 1);
        let (_, out) = convert_str("私はすき");
        assert_eq!(out, "watasi wa sɯki");

        hatsuon_set_segmentation(0);
        assert_eq!(hatsuon_get_segmentation(), 0);
        let (_, out) = convert_str("私はすき");
        assert_eq!(out, "watasihasɯki");

        hatsuon_cleanup();
    }

    #[test]
    fn test_ffi_version() {
        let version = unsafe { CStr::from_ptr(hatsuon_version()) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
