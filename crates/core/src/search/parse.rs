//! Pure helpers for reading release names.

/// Lower-cased word tokens of a release name.
pub fn tokenize(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Detect the quality token of a release name. Empty when unknown.
pub fn detect_quality(name: &str) -> String {
    for token in tokenize(name) {
        match token.as_str() {
            "2160p" | "4k" | "uhd" => return "2160p".to_string(),
            "1080p" => return "1080p".to_string(),
            "720p" => return "720p".to_string(),
            "480p" | "sd" => return "480p".to_string(),
            _ => {}
        }
    }
    String::new()
}

/// Detect language markers in a release name.
pub fn detect_languages(name: &str) -> Vec<String> {
    let mut languages = Vec::new();
    for token in tokenize(name) {
        let lang = match token.as_str() {
            "multi" => "multi",
            "english" | "eng" => "en",
            "french" | "vf" | "vff" | "truefrench" | "vostfr" => "fr",
            "german" => "de",
            "spanish" | "castellano" => "es",
            "italian" | "ita" => "it",
            _ => continue,
        };
        if !languages.iter().any(|l| l == lang) {
            languages.push(lang.to_string());
        }
    }
    languages
}

/// Detect a release year token (1900-2099).
pub fn detect_year(name: &str) -> Option<u32> {
    tokenize(name)
        .iter()
        .filter_map(|t| t.parse::<u32>().ok())
        .find(|y| (1900..=2099).contains(y))
}
