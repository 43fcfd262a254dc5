//! Voice trigger cache: holds the latest result and reads it aloud on a
//! recognized trigger phrase.

use std::sync::{Arc, OnceLock, RwLock};

use regex::Regex;

use crate::types::VoiceCacheEntry;

/// Phrases that request a readout, matched as case-insensitive substrings.
pub const TRIGGER_WORDS: &[&str] = &["чек", "посмотреть", "увидеть", "осмотр"];

/// Sample phrase for checking voice and rate settings.
pub const VOICE_TEST_PHRASE: &str = "Проверка голоса и скорости речи.";

/// Text-to-speech output.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str, rate: f32);
}

/// Whether an utterance contains any trigger phrase.
pub fn is_trigger(utterance: &str) -> bool {
    let heard = utterance.to_lowercase();
    TRIGGER_WORDS.iter().any(|w| heard.contains(w))
}

/// Remove ` — WxH px` size annotations from a line.
pub fn strip_size_annotations(line: &str) -> String {
    static SIZE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SIZE_RE.get_or_init(|| {
        Regex::new(r"(?:\u{00A0})?\s?[—–-]\s?\d+x\d+\s?px").expect("size annotation regex is valid")
    });
    re.replace_all(line, "").into_owned()
}

/// Spoken form of a cache entry: header and lines joined with `". "`.
pub fn render_readout(entry: &VoiceCacheEntry) -> String {
    let mut phrase = entry.header_text.clone();
    if !entry.finding_lines.is_empty() {
        let lines: Vec<String> = entry
            .finding_lines
            .iter()
            .map(|l| strip_size_annotations(l))
            .collect();
        phrase.push_str(". ");
        phrase.push_str(&lines.join(". "));
    }
    phrase
}

/// Single-slot cache of the latest rendered result. Entries are swapped
/// whole, never edited in place.
#[derive(Default)]
pub struct VoiceTriggerCache {
    entry: RwLock<Option<Arc<VoiceCacheEntry>>>,
}

impl VoiceTriggerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached entry.
    pub fn store(&self, entry: VoiceCacheEntry) {
        let entry = Arc::new(entry);
        *self.entry.write().unwrap_or_else(|p| p.into_inner()) = Some(entry);
    }

    pub fn latest(&self) -> Option<Arc<VoiceCacheEntry>> {
        self.entry.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Phrase to speak for `utterance`, if it is a trigger and a result is cached.
    pub fn on_utterance(&self, utterance: &str) -> Option<String> {
        if !is_trigger(utterance) {
            return None;
        }
        let entry = self.latest().filter(|e| !e.is_empty())?;
        Some(render_readout(&entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> VoiceCacheEntry {
        VoiceCacheEntry {
            header_text: "Объектов: 2".to_string(),
            finding_lines: vec![
                "- автомобиль: центр\u{00A0}— 640x480 px".to_string(),
                "- человек: левая".to_string(),
            ],
        }
    }

    #[test]
    fn test_strip_size_annotation() {
        assert_eq!(
            strip_size_annotations("- автомобиль: центр\u{00A0}— 640x480 px"),
            "- автомобиль: центр"
        );
        assert_eq!(strip_size_annotations("- cup: left - 10x20px"), "- cup: left");
        assert_eq!(strip_size_annotations("- человек: левая"), "- человек: левая");
    }

    #[test]
    fn test_readout_joins_header_and_lines() {
        assert_eq!(
            render_readout(&entry()),
            "Объектов: 2. - автомобиль: центр. - человек: левая"
        );
    }

    #[test]
    fn test_readout_header_only() {
        let e = VoiceCacheEntry {
            header_text: "Объектов: 0".to_string(),
            finding_lines: vec![],
        };
        assert_eq!(render_readout(&e), "Объектов: 0");
    }

    #[test]
    fn test_trigger_matching() {
        assert!(is_trigger("ЧЕК"));
        assert!(is_trigger("дай посмотреть пожалуйста"));
        assert!(is_trigger("Осмотр"));
        assert!(!is_trigger("привет"));
        assert!(!is_trigger(""));
    }

    #[test]
    fn test_empty_cache_is_noop() {
        let cache = VoiceTriggerCache::new();
        assert_eq!(cache.on_utterance("чек"), None);
    }

    #[test]
    fn test_non_trigger_is_ignored() {
        let cache = VoiceTriggerCache::new();
        cache.store(entry());
        assert_eq!(cache.on_utterance("как дела"), None);
    }

    #[test]
    fn test_store_overwrites() {
        let cache = VoiceTriggerCache::new();
        cache.store(entry());
        cache.store(VoiceCacheEntry {
            header_text: "Объектов: 1".to_string(),
            finding_lines: vec!["- кот: центр".to_string()],
        });
        assert_eq!(
            cache.on_utterance("чек").as_deref(),
            Some("Объектов: 1. - кот: центр")
        );
    }
}
