//! Text cleanup for extracted PDF text before it is used for grounding.
//!
//! Every cleanup configuration is idempotent: running the pipeline on its
//! own output returns the same string.

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Which characters survive cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharPolicy {
    /// Keep all of Unicode, replace control characters with spaces.
    #[default]
    Unicode,
    /// Keep printable ASCII only; everything else becomes a space.
    Ascii,
}

/// Cleanup preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPreset {
    /// Control characters and whitespace only
    Minimal,
    /// Minimal + NFC normalization + ligature expansion
    #[default]
    Standard,
    /// Standard + removal of page-number and header/footer noise lines
    Aggressive,
}

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupOptions {
    /// Character filtering policy
    pub char_policy: CharPolicy,

    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Expand typographic ligatures (ﬁ, ﬂ, ...)
    pub fix_ligatures: bool,

    /// Drop "page N" lines, bare page numbers and very short lines
    pub filter_noise_lines: bool,
}

impl CleanupOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        match preset {
            CleanupPreset::Minimal => Self::minimal(),
            CleanupPreset::Standard => Self::standard(),
            CleanupPreset::Aggressive => Self::aggressive(),
        }
    }

    /// Minimal cleanup options.
    pub fn minimal() -> Self {
        Self {
            char_policy: CharPolicy::Unicode,
            normalize_unicode: false,
            fix_ligatures: false,
            filter_noise_lines: false,
        }
    }

    /// Standard cleanup options.
    pub fn standard() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            ..Self::minimal()
        }
    }

    /// Aggressive cleanup options.
    pub fn aggressive() -> Self {
        Self {
            filter_noise_lines: true,
            ..Self::standard()
        }
    }

    /// Set the character policy.
    pub fn with_char_policy(mut self, policy: CharPolicy) -> Self {
        self.char_policy = policy;
        self
    }

    /// Keep printable ASCII only.
    pub fn ascii_only(self) -> Self {
        self.with_char_policy(CharPolicy::Ascii)
    }

    /// Enable or disable the noise-line filter.
    pub fn with_noise_filter(mut self, enabled: bool) -> Self {
        self.filter_noise_lines = enabled;
        self
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Text cleanup pipeline.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    options: CleanupOptions,
    inline_whitespace: Regex,
    blank_runs: Regex,
    page_label: Regex,
    bare_page_number: Regex,
    ligature_map: Vec<(char, &'static str)>,
}

impl TextCleaner {
    /// Create a new cleaner with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        Self {
            options,
            inline_whitespace: Regex::new(r"[^\S\n]+").unwrap(),
            blank_runs: Regex::new(r"\n{3,}").unwrap(),
            page_label: Regex::new(r"^page\s+\d+(\s+of\s+\d+)?$").unwrap(),
            bare_page_number: Regex::new(r"^[-–—]?\s*\d{1,4}\s*[-–—]?$").unwrap(),
            ligature_map: vec![
                ('\u{FB00}', "ff"),  // ﬀ
                ('\u{FB01}', "fi"),  // ﬁ
                ('\u{FB02}', "fl"),  // ﬂ
                ('\u{FB03}', "ffi"), // ﬃ
                ('\u{FB04}', "ffl"), // ﬄ
                ('\u{FB05}', "st"),  // ﬅ
                ('\u{FB06}', "st"),  // ﬆ
            ],
        }
    }

    /// Create a cleaner from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        Self::new(CleanupOptions::from_preset(preset))
    }

    /// Options this cleaner was built with.
    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Clean raw extracted text.
    pub fn clean(&self, raw: &str) -> String {
        // Removal happens before normalization so that nothing removed later
        // can bring a base character next to a combining mark.
        let mut result: String = raw
            .chars()
            .filter(|c| *c != '\0' && *c != '\u{FFFD}')
            .collect();

        if self.options.fix_ligatures {
            for (ligature, replacement) in &self.ligature_map {
                if result.contains(*ligature) {
                    result = result.replace(*ligature, replacement);
                }
            }
        }

        if self.options.normalize_unicode {
            result = result.nfc().collect();
        }

        let result = result.replace("\r\n", "\n").replace('\r', "\n");
        let result = self.filter_chars(&result);

        let mut lines: Vec<String> = Vec::new();
        for line in result.split('\n') {
            let line = self.inline_whitespace.replace_all(line, " ");
            let line = line.trim();
            if !line.is_empty() && self.options.filter_noise_lines && self.is_noise_line(line) {
                continue;
            }
            lines.push(line.to_string());
        }

        let joined = lines.join("\n");
        self.blank_runs
            .replace_all(&joined, "\n\n")
            .trim()
            .to_string()
    }

    fn filter_chars(&self, text: &str) -> String {
        match self.options.char_policy {
            CharPolicy::Unicode => text
                .chars()
                .map(|c| if c.is_control() && c != '\n' { ' ' } else { c })
                .collect(),
            CharPolicy::Ascii => text
                .chars()
                .map(|c| {
                    if c == '\n' || (' '..='~').contains(&c) {
                        c
                    } else {
                        ' '
                    }
                })
                .collect(),
        }
    }

    /// Header/footer noise: page labels, bare page numbers, one- or
    /// two-character lines. References (URLs, DOIs) are always kept.
    fn is_noise_line(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        if self.page_label.is_match(&lower) {
            return true;
        }
        if lower.contains("http://") || lower.contains("https://") || lower.contains("doi:") {
            return false;
        }
        if self.bare_page_number.is_match(&lower) {
            return true;
        }
        line.chars().count() <= 2
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new(CleanupOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "\0\0\0",
        "Hello\u{0}World",
        "Line one\r\nLine two\rLine three",
        "a\n\n\n\n\nb",
        "  leading and trailing  \n\n",
        "tabs\tand\t\tspaces   here",
        "Page 3\nActual content line\nPage 4 of 12",
        "ok\nx\nhttp://a.b\n7\n- 12 -\ndoi:10.1/xyz",
        "café naïve Ελληνικά 日本語",
        "e\u{0}\u{301}",
        "\u{FB01}\u{301}nding \u{FB02}owers",
        "bell\u{7}\u{301} char",
        "--- Page 1 ---\nFundamental Rights\n\n--- Page 2 ---\n\n\n",
        "\u{85}next\u{2028}line\u{a0}nbsp",
        "\u{FFFD}replacement\u{FFFD}",
        "x\n \n \ny\n\n \n\nz",
    ];

    fn all_cleaners() -> Vec<TextCleaner> {
        let mut cleaners = Vec::new();
        for preset in [
            CleanupPreset::Minimal,
            CleanupPreset::Standard,
            CleanupPreset::Aggressive,
        ] {
            cleaners.push(TextCleaner::from_preset(preset));
            cleaners.push(TextCleaner::new(
                CleanupOptions::from_preset(preset).ascii_only(),
            ));
        }
        cleaners
    }

    #[test]
    fn test_clean_is_idempotent() {
        for cleaner in all_cleaners() {
            for sample in SAMPLES {
                let once = cleaner.clean(sample);
                let twice = cleaner.clean(&once);
                assert_eq!(
                    once,
                    twice,
                    "not idempotent for {:?} with {:?}",
                    sample,
                    cleaner.options()
                );
            }
        }
    }

    #[test]
    fn test_null_bytes_removed() {
        let cleaner = TextCleaner::default();
        assert_eq!(cleaner.clean("Hello\u{0}World"), "HelloWorld");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let cleaner = TextCleaner::default();
        assert_eq!(
            cleaner.clean("tabs\tand\t\tspaces   here"),
            "tabs and spaces here"
        );
    }

    #[test]
    fn test_blank_lines_collapsed() {
        let cleaner = TextCleaner::default();
        assert_eq!(cleaner.clean("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(cleaner.clean("x\n \n \ny"), "x\n\ny");
    }

    #[test]
    fn test_line_endings_normalized() {
        let cleaner = TextCleaner::default();
        assert_eq!(
            cleaner.clean("Line one\r\nLine two\rLine three"),
            "Line one\nLine two\nLine three"
        );
    }

    #[test]
    fn test_unicode_policy_preserves_text() {
        let cleaner = TextCleaner::default();
        assert_eq!(
            cleaner.clean("café naïve Ελληνικά 日本語"),
            "café naïve Ελληνικά 日本語"
        );
        assert_eq!(cleaner.clean("bell\u{7}ring"), "bell ring");
    }

    #[test]
    fn test_ascii_policy_strips_non_ascii() {
        let cleaner = TextCleaner::new(CleanupOptions::standard().ascii_only());
        assert_eq!(cleaner.clean("Article 21 — Right to Life"), "Article 21 Right to Life");
        assert_eq!(cleaner.clean("日本語"), "");
    }

    #[test]
    fn test_ligature_fix() {
        let cleaner = TextCleaner::from_preset(CleanupPreset::Standard);
        assert_eq!(cleaner.clean("ﬁnding ﬂowers"), "finding flowers");

        let minimal = TextCleaner::from_preset(CleanupPreset::Minimal);
        assert_eq!(minimal.clean("ﬁnding"), "ﬁnding");
    }

    #[test]
    fn test_noise_lines_removed() {
        let cleaner = TextCleaner::from_preset(CleanupPreset::Aggressive);
        let text = "Page 3\nThe Preamble declares India a republic.\nPAGE 4 OF 12\n- 12 -\nix\n42";
        assert_eq!(cleaner.clean(text), "The Preamble declares India a republic.");
    }

    #[test]
    fn test_references_always_kept() {
        let cleaner = TextCleaner::from_preset(CleanupPreset::Aggressive);
        let text = "Sources\nhttps://x.io\ndoi:1";
        assert_eq!(cleaner.clean(text), "Sources\nhttps://x.io\ndoi:1");
    }

    #[test]
    fn test_page_markers_survive_noise_filter() {
        let cleaner = TextCleaner::from_preset(CleanupPreset::Aggressive);
        let text = "--- Page 1 ---\nFundamental Rights are justiciable.\n\n";
        assert_eq!(
            cleaner.clean(text),
            "--- Page 1 ---\nFundamental Rights are justiciable."
        );
    }

    #[test]
    fn test_noise_filter_off_by_default() {
        let cleaner = TextCleaner::default();
        assert_eq!(cleaner.clean("Page 3\nok"), "Page 3\nok");
    }

    #[test]
    fn test_options_roundtrip_through_serde() {
        let options = CleanupOptions::aggressive().ascii_only();
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"char_policy\":\"ascii\""));
        let parsed: CleanupOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);
    }
}
