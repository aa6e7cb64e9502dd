//! Supported target languages and source script detection

use std::sync::OnceLock;

use regex::Regex;

use crate::shared::types::SupportedLanguage;

/// Target languages offered by the UI, in display order
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("it", "Italian"),
    ("ru", "Russian"),
    ("pt", "Portuguese"),
];

pub fn supported_languages() -> Vec<SupportedLanguage> {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, name)| SupportedLanguage {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Display name for a code, falling back to the code itself
pub fn language_name(code: &str) -> &str {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Guess the language of `text` from its script
///
/// Returns "ja", "zh", "ko", "en" or "unknown". Kana wins over Han so that
/// Japanese mixed with kanji is not reported as Chinese.
pub fn detect_language(text: &str) -> &'static str {
    static KANA: OnceLock<Regex> = OnceLock::new();
    static HAN: OnceLock<Regex> = OnceLock::new();
    static HANGUL: OnceLock<Regex> = OnceLock::new();
    static LATIN: OnceLock<Regex> = OnceLock::new();

    let kana = KANA.get_or_init(|| Regex::new(r"[\x{3040}-\x{30FF}]").expect("valid kana regex"));
    let han = HAN.get_or_init(|| Regex::new(r"[\x{4E00}-\x{9FA5}]").expect("valid han regex"));
    let hangul = HANGUL.get_or_init(|| Regex::new(r"[\x{AC00}-\x{D7AF}]").expect("valid hangul regex"));
    let latin = LATIN.get_or_init(|| Regex::new(r"^[a-zA-Z\s\d.,!?()\-]+$").expect("valid latin regex"));

    if kana.is_match(text) {
        "ja"
    } else if han.is_match(text) {
        "zh"
    } else if hangul.is_match(text) {
        "ko"
    } else if latin.is_match(text) {
        "en"
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_ten_languages() {
        let languages = supported_languages();
        assert_eq!(languages.len(), 10);
        assert_eq!(languages[0].code, "en");
        assert_eq!(languages[9].name, "Portuguese");
    }

    #[test]
    fn test_language_name_falls_back_to_code() {
        assert_eq!(language_name("JA"), "Japanese");
        assert_eq!(language_name("nl"), "nl");
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("点击确认"), "zh");
        assert_eq!(detect_language("こんにちは世界"), "ja");
        assert_eq!(detect_language("안녕하세요"), "ko");
        assert_eq!(detect_language("Sign in (2)"), "en");
        assert_eq!(detect_language("Привет"), "unknown");
    }
}
