//! Passkey substitution in raw torrent descriptors.
//!
//! Private-tracker descriptors ship with a placeholder token in their
//! announce URL; downloading requires swapping in the user's credential.
//! The descriptor is bencoded, so the announce URL is a length-prefixed
//! byte string: when the substitution changes the byte length, the declared
//! length must be rewritten by the same delta or the descriptor is corrupt.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;

/// Placeholder token embedded in tracker announce URLs.
pub const PASSKEY_PLACEHOLDER: &[u8] = b"{passkey}";

static PASSKEY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{8,64}$").unwrap());

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasskeyError {
    #[error("Credential does not match the required pattern")]
    InvalidCredential,

    #[error("Descriptor has no length prefix covering the substitution")]
    MalformedDescriptor,
}

/// Whether a credential matches the required pattern.
pub fn is_valid_passkey(passkey: &str) -> bool {
    PASSKEY_PATTERN.is_match(passkey)
}

/// Replace every placeholder occurrence in a descriptor with the user's
/// credential, repairing the enclosing bencoded string lengths.
///
/// Binary-safe: the descriptor is treated as raw bytes throughout.
pub fn substitute_passkey(descriptor: &[u8], passkey: &str) -> Result<Vec<u8>, PasskeyError> {
    if !is_valid_passkey(passkey) {
        return Err(PasskeyError::InvalidCredential);
    }

    let mut out = descriptor.to_vec();
    // A valid credential is alphanumeric, so it can never re-introduce the
    // placeholder; rescanning from the start after each splice terminates.
    while let Some(at) = find(&out, PASSKEY_PLACEHOLDER) {
        out = splice_one(out, at, passkey.as_bytes())?;
    }
    Ok(out)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Replace the placeholder at `at` and fix the enclosing length prefix.
fn splice_one(mut buf: Vec<u8>, at: usize, replacement: &[u8]) -> Result<Vec<u8>, PasskeyError> {
    let old_len = PASSKEY_PLACEHOLDER.len();
    let (digits_start, colon, declared) =
        enclosing_string_prefix(&buf, at, old_len).ok_or(PasskeyError::MalformedDescriptor)?;

    // Swap the placeholder bytes first; the prefix sits before `at`, so its
    // offsets are unaffected by this splice.
    buf.splice(at..at + old_len, replacement.iter().copied());

    let delta = replacement.len() as i64 - old_len as i64;
    if delta != 0 {
        let new_declared = declared as i64 + delta;
        let new_digits = new_declared.to_string().into_bytes();
        buf.splice(digits_start..colon, new_digits);
    }

    Ok(buf)
}

/// Locate the `NN:` prefix of the bencoded string containing the byte range
/// `[at, at + len)`. Returns (digits start, colon position, declared length).
fn enclosing_string_prefix(buf: &[u8], at: usize, len: usize) -> Option<(usize, usize, usize)> {
    // Walk back from the occurrence looking for the closest digits-colon
    // prefix whose declared span covers it.
    for colon in (1..=at).map(|i| at - i).filter(|&i| buf[i] == b':') {
        let mut digits_start = colon;
        while digits_start > 0 && buf[digits_start - 1].is_ascii_digit() {
            digits_start -= 1;
        }
        if digits_start == colon {
            continue;
        }
        let declared: usize = std::str::from_utf8(&buf[digits_start..colon])
            .ok()?
            .parse()
            .ok()?;
        let string_start = colon + 1;
        let string_end = string_start.checked_add(declared)?;
        if string_start <= at && string_end >= at + len && string_end <= buf.len() {
            return Some((digits_start, colon, declared));
        }
    }
    None
}

/// Read the declared length of the bencoded string starting at the prefix
/// found before `at`. Test helper for round-trip verification.
#[cfg(test)]
fn declared_length_covering(buf: &[u8], at: usize) -> Option<usize> {
    enclosing_string_prefix(buf, at, 1).map(|(_, _, declared)| declared)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A bencoded fragment with the placeholder inside the announce URL.
    fn descriptor() -> Vec<u8> {
        let announce = format!(
            "http://tracker.example/{}/announce",
            std::str::from_utf8(PASSKEY_PLACEHOLDER).unwrap()
        );
        let mut out = Vec::new();
        out.extend_from_slice(b"d8:announce");
        out.extend_from_slice(format!("{}:{}", announce.len(), announce).as_bytes());
        out.extend_from_slice(b"4:infod6:lengthi10e4:name4:f.ede");
        out
    }

    #[test]
    fn test_pattern() {
        assert!(is_valid_passkey("a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6"));
        assert!(is_valid_passkey("abcd1234")); // 8 chars, minimum
        assert!(!is_valid_passkey("short"));
        assert!(!is_valid_passkey("has spaces in it"));
        assert!(!is_valid_passkey("dash-not-allowed1"));
    }

    #[test]
    fn test_invalid_credential_rejected() {
        let result = substitute_passkey(&descriptor(), "bad key");
        assert_eq!(result.unwrap_err(), PasskeyError::InvalidCredential);
    }

    #[test]
    fn test_longer_credential_grows_length_field() {
        let passkey = "a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6"; // 32 bytes
        let input = descriptor();
        let output = substitute_passkey(&input, passkey).unwrap();

        let delta = passkey.len() as i64 - PASSKEY_PLACEHOLDER.len() as i64;
        assert_eq!(output.len() as i64, input.len() as i64 + delta);
        assert!(find(&output, PASSKEY_PLACEHOLDER).is_none());
        assert!(find(&output, passkey.as_bytes()).is_some());

        // Declared length equals the actual announce string length.
        let at = find(&output, passkey.as_bytes()).unwrap();
        let announce = format!("http://tracker.example/{}/announce", passkey);
        assert_eq!(declared_length_covering(&output, at), Some(announce.len()));
    }

    #[test]
    fn test_shorter_credential_shrinks_length_field() {
        let passkey = "abcd1234"; // 8 bytes, one shorter than the placeholder
        let input = descriptor();
        let output = substitute_passkey(&input, passkey).unwrap();

        assert_eq!(output.len(), input.len() - 1);
        let at = find(&output, passkey.as_bytes()).unwrap();
        let announce = format!("http://tracker.example/{}/announce", passkey);
        assert_eq!(declared_length_covering(&output, at), Some(announce.len()));
    }

    #[test]
    fn test_equal_length_credential_keeps_length_field() {
        let passkey = "abcdef123"; // exactly placeholder-sized
        assert_eq!(passkey.len(), PASSKEY_PLACEHOLDER.len());
        let input = descriptor();
        let output = substitute_passkey(&input, passkey).unwrap();
        assert_eq!(output.len(), input.len());
    }

    #[test]
    fn test_every_occurrence_replaced() {
        // Placeholder both in announce and in a second tracker string.
        let mut input = descriptor();
        let extra = format!(
            "13:announce-listll{}ee",
            {
                let url = format!(
                    "http://backup.example/{}/announce",
                    std::str::from_utf8(PASSKEY_PLACEHOLDER).unwrap()
                );
                format!("{}:{}", url.len(), url)
            }
        );
        input.extend_from_slice(extra.as_bytes());

        let passkey = "a1b2c3d4e5f6a7b8";
        let output = substitute_passkey(&input, passkey).unwrap();
        assert!(find(&output, PASSKEY_PLACEHOLDER).is_none());
        assert_eq!(
            output
                .windows(passkey.len())
                .filter(|w| *w == passkey.as_bytes())
                .count(),
            2
        );
    }

    #[test]
    fn test_placeholder_outside_any_string_is_malformed() {
        // No digits:colon prefix covering the occurrence.
        let input = b"xx{passkey}xx".to_vec();
        let result = substitute_passkey(&input, "a1b2c3d4e5f6a7b8");
        assert_eq!(result.unwrap_err(), PasskeyError::MalformedDescriptor);
    }

    #[test]
    fn test_descriptor_without_placeholder_unchanged() {
        let input = b"d8:announce20:http://t.example/anne".to_vec();
        let output = substitute_passkey(&input, "a1b2c3d4e5f6a7p8").unwrap();
        assert_eq!(output, input);
    }
}
