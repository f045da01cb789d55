//! Filtering, sorting and priority reordering of search results.

use crate::config::{SortOrder, UserPreferences};
use crate::indexer::Torrent;
use crate::media::MediaRequest;

use super::parse::tokenize;

/// Rank position of a quality token; higher is better.
fn quality_rank(quality: &str) -> u8 {
    match quality {
        "2160p" => 4,
        "1080p" => 3,
        "720p" => 2,
        "480p" => 1,
        _ => 0,
    }
}

/// Whether a result passes the quality allow-list.
///
/// An empty allow-list allows everything; a result with no detected quality
/// is never excluded on quality alone.
fn quality_allowed(torrent: &Torrent, allowed: &[String]) -> bool {
    allowed.is_empty() || torrent.quality.is_empty() || allowed.contains(&torrent.quality)
}

/// Whether any excluded keyword appears as a whole token in the name.
fn has_excluded_keyword(torrent: &Torrent, excluded: &[String]) -> bool {
    if excluded.is_empty() {
        return false;
    }
    let tokens = tokenize(&torrent.name);
    excluded
        .iter()
        .any(|kw| tokens.iter().any(|t| t == &kw.to_lowercase()))
}

/// Whether a result matches the preferred-language set: it is multi-language
/// or lists any preferred language.
pub fn matches_priority_language(torrent: &Torrent, languages: &[String]) -> bool {
    torrent.languages.iter().any(|l| l == "multi")
        || torrent
            .languages
            .iter()
            .any(|l| languages.iter().any(|p| p == l))
}

/// Move up to `cap` language-matching results to the front, preserving the
/// original relative order of both the promoted and the remaining group.
pub fn priority_reorder(torrents: &mut Vec<Torrent>, languages: &[String], cap: usize) {
    if languages.is_empty() || cap == 0 {
        return;
    }

    let mut promoted = Vec::new();
    let mut rest = Vec::new();
    for torrent in torrents.drain(..) {
        if promoted.len() < cap && matches_priority_language(&torrent, languages) {
            promoted.push(torrent);
        } else {
            rest.push(torrent);
        }
    }
    promoted.extend(rest);
    *torrents = promoted;
}

/// Sort a result set in place by the configured order.
pub fn sort_torrents(torrents: &mut [Torrent], order: SortOrder) {
    match order {
        SortOrder::Seeders => torrents.sort_by(|a, b| b.seeders.cmp(&a.seeders)),
        SortOrder::Size => torrents.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes)),
        SortOrder::QualityThenSize => torrents.sort_by(|a, b| {
            quality_rank(&b.quality)
                .cmp(&quality_rank(&a.quality))
                .then(b.size_bytes.cmp(&a.size_bytes))
        }),
    }
}

/// The priority-language cap: a third of the result limit, at least one.
pub fn priority_cap(max_results: usize) -> usize {
    ((max_results as f64 * 0.33).round() as usize).max(1)
}

/// Filter, sort and prioritize raw search results, truncated to
/// `max_results + 2` (headroom for enrichment and dedup losses).
pub fn filter_and_rank(
    torrents: Vec<Torrent>,
    preferences: &UserPreferences,
    request: &MediaRequest,
) -> Vec<Torrent> {
    let mut kept: Vec<Torrent> = torrents
        .into_iter()
        .filter(|t| quality_allowed(t, &preferences.qualities))
        .filter(|t| !has_excluded_keyword(t, &preferences.excluded_keywords))
        .collect();

    // Soft year preference: only applied when it would not empty the set.
    if let Some(year) = request.year {
        if kept.iter().any(|t| t.year == Some(year)) {
            kept.retain(|t| t.year == Some(year));
        }
    }

    sort_torrents(&mut kept, SortOrder::Seeders);
    priority_reorder(
        &mut kept,
        &preferences.priority_languages,
        priority_cap(preferences.max_results),
    );

    let mut ranked = kept.clone();
    ranked.truncate(preferences.max_results + 2);

    // Series: guarantee pack representation when the user asked for it.
    if preferences.pack_priority > 0 && !ranked.iter().any(|t| t.from_pack) {
        let packs: Vec<Torrent> = kept
            .iter()
            .filter(|t| t.from_pack)
            .take(preferences.pack_priority)
            .cloned()
            .collect();
        if !packs.is_empty() {
            let drop = packs.len().min(ranked.len());
            ranked.truncate(ranked.len() - drop);
            ranked.extend(packs);
        }
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaType;
    use crate::testing::fixtures;

    fn request(year: Option<u32>) -> MediaRequest {
        MediaRequest {
            media_type: MediaType::Movie,
            external_id: "tt1".to_string(),
            title: "Test".to_string(),
            season: None,
            episode: None,
            year,
            language: "en".to_string(),
            episodes: vec![],
        }
    }

    fn prefs() -> UserPreferences {
        UserPreferences {
            qualities: vec![],
            ..UserPreferences::default()
        }
    }

    #[test]
    fn test_quality_filter() {
        let mut preferences = prefs();
        preferences.qualities = vec!["1080p".to_string()];

        let torrents = vec![
            fixtures::torrent("A.1080p", "x", 10),
            fixtures::torrent("B.720p", "x", 20),
            fixtures::torrent("C.unknown", "x", 5),
        ];
        let ranked = filter_and_rank(torrents, &preferences, &request(None));
        let names: Vec<_> = ranked.iter().map(|t| t.name.as_str()).collect();
        // 720p excluded, unknown quality kept
        assert_eq!(names, vec!["A.1080p", "C.unknown"]);
    }

    #[test]
    fn test_excluded_keyword_is_whole_token() {
        let mut preferences = prefs();
        preferences.excluded_keywords = vec!["cam".to_string()];

        let torrents = vec![
            fixtures::torrent("Movie.CAM.1080p", "x", 50),
            fixtures::torrent("Camera.Movie.1080p", "x", 10),
        ];
        let ranked = filter_and_rank(torrents, &preferences, &request(None));
        // "CAM" token excluded; "Camera" is a different token
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Camera.Movie.1080p");
    }

    #[test]
    fn test_year_filter_is_soft() {
        let mut with_year = fixtures::torrent("Movie.1999.1080p", "x", 5);
        with_year.year = Some(1999);
        let mut wrong_year = fixtures::torrent("Movie.2005.1080p", "x", 50);
        wrong_year.year = Some(2005);

        // A matching year exists: keep only matches
        let ranked = filter_and_rank(
            vec![with_year.clone(), wrong_year.clone()],
            &prefs(),
            &request(Some(1999)),
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].year, Some(1999));

        // No matching year: filter not applied
        let ranked = filter_and_rank(vec![wrong_year], &prefs(), &request(Some(1999)));
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_sorted_by_seeders_desc() {
        let torrents = vec![
            fixtures::torrent("low", "x", 5),
            fixtures::torrent("high", "x", 50),
            fixtures::torrent("mid", "x", 20),
        ];
        let ranked = filter_and_rank(torrents, &prefs(), &request(None));
        let seeders: Vec<_> = ranked.iter().map(|t| t.seeders).collect();
        assert_eq!(seeders, vec![50, 20, 5]);
    }

    #[test]
    fn test_priority_reorder_caps_promotions() {
        // 10 candidates sorted by seeders, 3 of them French.
        let mut torrents = Vec::new();
        for i in 0..10u32 {
            let mut t = fixtures::torrent(&format!("t{}", i), "x", 100 - i);
            if [3, 5, 8].contains(&i) {
                t.languages = vec!["fr".to_string()];
            }
            torrents.push(t);
        }

        priority_reorder(&mut torrents, &["fr".to_string()], 2);

        let names: Vec<_> = torrents.iter().map(|t| t.name.as_str()).collect();
        // Top 2 French candidates (t3, t5) move to the front in original
        // order; t8 stays in place among the remaining group.
        assert_eq!(
            names,
            vec!["t3", "t5", "t0", "t1", "t2", "t4", "t6", "t7", "t8", "t9"]
        );
    }

    #[test]
    fn test_multi_language_counts_as_match() {
        let mut t = fixtures::torrent("m", "x", 1);
        t.languages = vec!["multi".to_string()];
        assert!(matches_priority_language(&t, &["fr".to_string()]));
    }

    #[test]
    fn test_truncates_with_headroom() {
        let mut preferences = prefs();
        preferences.max_results = 3;
        let torrents = (0..10u32)
            .map(|i| fixtures::torrent(&format!("t{}", i), "x", i))
            .collect();
        let ranked = filter_and_rank(torrents, &preferences, &request(None));
        assert_eq!(ranked.len(), 5); // max_results + 2
    }

    #[test]
    fn test_pack_priority_splices_packs_at_tail() {
        let mut preferences = prefs();
        preferences.max_results = 3;
        preferences.pack_priority = 2;

        let mut torrents: Vec<Torrent> = (0..8u32)
            .map(|i| fixtures::torrent(&format!("ep{}", i), "x", 100 - i))
            .collect();
        let mut pack_a = fixtures::torrent("packA", "x", 2);
        pack_a.from_pack = true;
        let mut pack_b = fixtures::torrent("packB", "x", 1);
        pack_b.from_pack = true;
        torrents.push(pack_a);
        torrents.push(pack_b);

        let ranked = filter_and_rank(torrents, &preferences, &request(None));
        assert_eq!(ranked.len(), 5);
        let names: Vec<_> = ranked.iter().map(|t| t.name.as_str()).collect();
        // Lowest-ranked tail replaced by the top pack candidates
        assert_eq!(names, vec!["ep0", "ep1", "ep2", "packA", "packB"]);
    }

    #[test]
    fn test_pack_priority_noop_when_pack_already_present() {
        let mut preferences = prefs();
        preferences.max_results = 5;
        preferences.pack_priority = 2;

        let mut pack = fixtures::torrent("pack", "x", 90);
        pack.from_pack = true;
        let torrents = vec![fixtures::torrent("ep", "x", 100), pack];

        let ranked = filter_and_rank(torrents, &preferences, &request(None));
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_priority_cap() {
        assert_eq!(priority_cap(15), 5);
        assert_eq!(priority_cap(2), 1);
        assert_eq!(priority_cap(1), 1);
        assert_eq!(priority_cap(10), 3);
    }

    #[test]
    fn test_sort_quality_then_size() {
        let mut a = fixtures::torrent("a.720p.big", "x", 1);
        a.quality = "720p".to_string();
        a.size_bytes = 5_000;
        let mut b = fixtures::torrent("b.1080p.small", "x", 1);
        b.quality = "1080p".to_string();
        b.size_bytes = 1_000;
        let mut c = fixtures::torrent("c.1080p.big", "x", 1);
        c.quality = "1080p".to_string();
        c.size_bytes = 9_000;

        let mut torrents = vec![a, b, c];
        sort_torrents(&mut torrents, SortOrder::QualityThenSize);
        let names: Vec<_> = torrents.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["c.1080p.big", "b.1080p.small", "a.720p.big"]);
    }
}
