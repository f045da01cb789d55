//! Season-pack classification of release names.
//!
//! A pack bundles a full season (or several) rather than one episode. The
//! classification is a pure function over the lower-cased word tokens of the
//! release name, so it can be tested exhaustively.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::parse::tokenize;

static SEASON_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^s(\d{2})$").unwrap());

/// Whether a release name looks like a pack containing `season`.
///
/// Matches, in order:
/// - a literal "season N" for the requested season
/// - a zero-padded `sNN` token for the requested season
/// - an `sXX sYY` token pair whose inclusive range contains the season
/// - the word "complete" when no season token appears anywhere in the name
pub fn is_season_pack(name: &str, season: u32) -> bool {
    let tokens = tokenize(name);

    let mut season_numbers: Vec<u32> = Vec::new();
    let mut has_complete = false;
    let mut has_season_word_number = false;

    for (i, token) in tokens.iter().enumerate() {
        if let Some(caps) = SEASON_TOKEN.captures(token) {
            if let Ok(n) = caps[1].parse::<u32>() {
                season_numbers.push(n);
            }
        } else if token == "season" {
            if let Some(n) = tokens.get(i + 1).and_then(|t| t.parse::<u32>().ok()) {
                has_season_word_number = true;
                if n == season {
                    return true;
                }
            }
        } else if token == "complete" {
            has_complete = true;
        }
    }

    if season_numbers.contains(&season) {
        return true;
    }

    // Range form: adjacent sXX sYY tokens spanning the requested season.
    for pair in season_numbers.windows(2) {
        let (lo, hi) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
        if (lo..=hi).contains(&season) {
            return true;
        }
    }

    has_complete && season_numbers.is_empty() && !has_season_word_number
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_season_word() {
        assert!(is_season_pack("Show.Season 2.Complete.1080p", 2));
        assert!(!is_season_pack("Show.Season 2.Complete.1080p", 3));
    }

    #[test]
    fn test_episode_name_is_not_a_pack() {
        assert!(!is_season_pack("Show.S02E05.1080p", 2));
    }

    #[test]
    fn test_padded_season_token() {
        assert!(is_season_pack("Show.S02.1080p.WEB", 2));
        assert!(!is_season_pack("Show.S02.1080p.WEB", 1));
    }

    #[test]
    fn test_range_pair() {
        // Inside the inclusive range
        assert!(is_season_pack("Show.S01.S03.Complete", 1));
        assert!(is_season_pack("Show.S01.S03.Complete", 2));
        assert!(is_season_pack("Show.S01.S03.Complete", 3));
        // Outside it
        assert!(!is_season_pack("Show.S01.S03.Complete", 4));
    }

    #[test]
    fn test_complete_without_season_token() {
        assert!(is_season_pack("Show.COMPLETE.1080p", 1));
        assert!(is_season_pack("Show.COMPLETE.1080p", 7));
    }

    #[test]
    fn test_complete_with_other_season_token_does_not_match() {
        // "complete" alone would match any season, but an explicit season
        // token elsewhere pins the pack to that season.
        assert!(!is_season_pack("Show.S05.Complete.1080p", 2));
        assert!(is_season_pack("Show.S05.Complete.1080p", 5));
    }

    #[test]
    fn test_unpadded_single_digit_is_not_a_season_token() {
        assert!(!is_season_pack("Show.s2.1080p", 2));
    }
}
