//! Language definitions and script-based language detection
//!
//! Replies are generated in Hindi, Marathi or English. Other detected
//! languages are reported back to the client but answered (and spoken) in
//! English.

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use whatlang::{Detector, Lang};

use crate::traits::LanguageDetector;
use crate::{Error, Result};

/// Latin-script languages told apart by the statistical detector
///
/// Entries are (detector language, ISO 639-1 code, name).
const LATIN_LANGUAGES: &[(Lang, &str, &str)] = &[
    (Lang::Eng, "en", "English"),
    (Lang::Fra, "fr", "French"),
    (Lang::Spa, "es", "Spanish"),
    (Lang::Por, "pt", "Portuguese"),
    (Lang::Ita, "it", "Italian"),
    (Lang::Deu, "de", "German"),
    (Lang::Nld, "nl", "Dutch"),
    (Lang::Pol, "pl", "Polish"),
    (Lang::Swe, "sv", "Swedish"),
    (Lang::Dan, "da", "Danish"),
    (Lang::Nob, "no", "Norwegian"),
    (Lang::Fin, "fi", "Finnish"),
    (Lang::Tur, "tr", "Turkish"),
    (Lang::Hun, "hu", "Hungarian"),
    (Lang::Ces, "cs", "Czech"),
    (Lang::Slk, "sk", "Slovak"),
    (Lang::Slv, "sl", "Slovenian"),
    (Lang::Hrv, "hr", "Croatian"),
    (Lang::Ron, "ro", "Romanian"),
    (Lang::Lit, "lt", "Lithuanian"),
    (Lang::Lav, "lv", "Latvian"),
    (Lang::Est, "et", "Estonian"),
    (Lang::Vie, "vi", "Vietnamese"),
    (Lang::Ind, "id", "Indonesian"),
    (Lang::Afr, "af", "Afrikaans"),
    (Lang::Aze, "az", "Azerbaijani"),
    (Lang::Uzb, "uz", "Uzbek"),
    (Lang::Zul, "zu", "Zulu"),
];

static LATIN_DETECTOR: Lazy<Detector> = Lazy::new(|| {
    Detector::with_allowlist(LATIN_LANGUAGES.iter().map(|(lang, _, _)| *lang).collect())
});

/// Languages the detector can recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Marathi,
    Bengali,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Gujarati,
    Punjabi,
    Odia,
    Urdu,
    /// Any other Latin-script language, by ISO 639-1 code
    Other(&'static str),
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Marathi => "mr",
            Self::Bengali => "bn",
            Self::Tamil => "ta",
            Self::Telugu => "te",
            Self::Kannada => "kn",
            Self::Malayalam => "ml",
            Self::Gujarati => "gu",
            Self::Punjabi => "pa",
            Self::Odia => "or",
            Self::Urdu => "ur",
            Self::Other(code) => *code,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Marathi => "Marathi",
            Self::Bengali => "Bengali",
            Self::Tamil => "Tamil",
            Self::Telugu => "Telugu",
            Self::Kannada => "Kannada",
            Self::Malayalam => "Malayalam",
            Self::Gujarati => "Gujarati",
            Self::Punjabi => "Punjabi",
            Self::Odia => "Odia",
            Self::Urdu => "Urdu",
            Self::Other(code) => LATIN_LANGUAGES
                .iter()
                .find(|(_, c, _)| c == code)
                .map(|(_, _, name)| *name)
                .unwrap_or(*code),
        }
    }

    /// Language the model is instructed to answer in
    pub fn response_language(&self) -> Language {
        match self {
            Self::Hindi | Self::Marathi => *self,
            _ => Self::English,
        }
    }

    /// Language tag handed to the speech synthesizer
    pub fn tts_code(&self) -> &'static str {
        self.response_language().code()
    }

    /// Parse from an ISO code or name (case-insensitive)
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "eng" | "english" => Some(Self::English),
            "hi" | "hin" | "hindi" => Some(Self::Hindi),
            "mr" | "mar" | "marathi" => Some(Self::Marathi),
            "bn" | "ben" | "bengali" | "bangla" => Some(Self::Bengali),
            "ta" | "tam" | "tamil" => Some(Self::Tamil),
            "te" | "tel" | "telugu" => Some(Self::Telugu),
            "kn" | "kan" | "kannada" => Some(Self::Kannada),
            "ml" | "mal" | "malayalam" => Some(Self::Malayalam),
            "gu" | "guj" | "gujarati" => Some(Self::Gujarati),
            "pa" | "pan" | "punjabi" => Some(Self::Punjabi),
            "or" | "ori" | "odia" | "oriya" => Some(Self::Odia),
            "ur" | "urd" | "urdu" => Some(Self::Urdu),
            other => LATIN_LANGUAGES
                .iter()
                .find(|(lang, code, name)| {
                    other == *code || other == lang.code() || other == name.to_lowercase()
                })
                .map(|(lang, _, _)| Self::from_detected(*lang)),
        }
    }

    fn from_detected(lang: Lang) -> Self {
        match LATIN_LANGUAGES.iter().find(|(l, _, _)| *l == lang) {
            Some((Lang::Eng, _, _)) | None => Self::English,
            Some((_, code, _)) => Self::Other(*code),
        }
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_str_loose(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown language: {}", raw)))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Writing systems distinguished by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Script {
    Latin,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Odia,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Arabic,
}

impl Script {
    const ALL: [Script; 11] = [
        Script::Latin,
        Script::Devanagari,
        Script::Bengali,
        Script::Gurmukhi,
        Script::Gujarati,
        Script::Odia,
        Script::Tamil,
        Script::Telugu,
        Script::Kannada,
        Script::Malayalam,
        Script::Arabic,
    ];

    /// Unicode block for this script (first block only)
    pub fn unicode_range(&self) -> (u32, u32) {
        match self {
            Self::Latin => (0x0041, 0x024F),
            Self::Devanagari => (0x0900, 0x097F),
            Self::Bengali => (0x0980, 0x09FF),
            Self::Gurmukhi => (0x0A00, 0x0A7F),
            Self::Gujarati => (0x0A80, 0x0AFF),
            Self::Odia => (0x0B00, 0x0B7F),
            Self::Tamil => (0x0B80, 0x0BFF),
            Self::Telugu => (0x0C00, 0x0C7F),
            Self::Kannada => (0x0C80, 0x0CFF),
            Self::Malayalam => (0x0D00, 0x0D7F),
            Self::Arabic => (0x0600, 0x06FF),
        }
    }

    /// Check if a character belongs to this script
    pub fn contains_char(&self, c: char) -> bool {
        if *self == Self::Latin && !c.is_alphabetic() {
            return false;
        }
        let code = c as u32;
        let (start, end) = self.unicode_range();
        code >= start && code <= end
    }

    /// Most frequent script among the letters of `text`
    pub fn detect(text: &str) -> Option<Self> {
        let mut counts = [0usize; Self::ALL.len()];
        for c in text.chars() {
            if let Some(idx) = Self::ALL.iter().position(|s| s.contains_char(c)) {
                counts[idx] += 1;
            }
        }

        counts
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .max_by_key(|(_, n)| **n)
            .map(|(idx, _)| Self::ALL[idx])
    }

    /// Default language written in this script
    fn primary_language(&self) -> Language {
        match self {
            Self::Latin => Language::English,
            Self::Devanagari => Language::Hindi,
            Self::Bengali => Language::Bengali,
            Self::Gurmukhi => Language::Punjabi,
            Self::Gujarati => Language::Gujarati,
            Self::Odia => Language::Odia,
            Self::Tamil => Language::Tamil,
            Self::Telugu => Language::Telugu,
            Self::Kannada => Language::Kannada,
            Self::Malayalam => Language::Malayalam,
            Self::Arabic => Language::Urdu,
        }
    }
}

/// Function words common in Marathi but not used in Hindi
const MARATHI_MARKERS: &[&str] = &[
    "आहे", "आहेत", "नाही", "मला", "तुम्ही", "काय", "आणि", "माझे", "माझा", "आम्ही", "तुमचे", "करतो",
];

/// Letter LLA, frequent in Marathi and essentially absent from Hindi
const MARATHI_LLA: char = 'ळ';

/// Detects language from the dominant Unicode script
///
/// Devanagari is split into Hindi and Marathi using a small marker lexicon.
/// Latin text goes through a trigram detector; unreliable guesses count as
/// English.
#[derive(Debug, Clone, Default)]
pub struct ScriptLanguageDetector;

impl ScriptLanguageDetector {
    pub fn new() -> Self {
        Self
    }

    fn is_marathi(text: &str) -> bool {
        if text.contains(MARATHI_LLA) {
            return true;
        }
        text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation() || c == '।')
            .any(|word| MARATHI_MARKERS.contains(&word))
    }

    fn detect_latin(text: &str) -> Language {
        match LATIN_DETECTOR.detect(text) {
            Some(info) if info.is_reliable() => Language::from_detected(info.lang()),
            _ => Language::English,
        }
    }
}

impl LanguageDetector for ScriptLanguageDetector {
    fn detect(&self, text: &str) -> Result<Language> {
        let script = Script::detect(text).ok_or_else(|| {
            Error::LanguageDetection("no alphabetic characters in input".to_string())
        })?;

        let language = match script {
            Script::Latin => Self::detect_latin(text),
            Script::Devanagari if Self::is_marathi(text) => Language::Marathi,
            other => other.primary_language(),
        };
        Ok(language)
    }

    fn name(&self) -> &str {
        "script"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_code() {
        assert_eq!(Language::Hindi.code(), "hi");
        assert_eq!(Language::Marathi.code(), "mr");
        assert_eq!(Language::English.code(), "en");
    }

    #[test]
    fn test_response_and_tts_mapping() {
        assert_eq!(Language::Hindi.response_language().name(), "Hindi");
        assert_eq!(Language::Marathi.response_language().name(), "Marathi");
        assert_eq!(Language::Tamil.response_language().name(), "English");
        assert_eq!(Language::Hindi.tts_code(), "hi");
        assert_eq!(Language::Marathi.tts_code(), "mr");
        assert_eq!(Language::Bengali.tts_code(), "en");
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!(Language::from_str_loose("hi"), Some(Language::Hindi));
        assert_eq!(Language::from_str_loose("Marathi"), Some(Language::Marathi));
        assert_eq!(Language::from_str_loose("fr"), Some(Language::Other("fr")));
        assert_eq!(Language::from_str_loose("German"), Some(Language::Other("de")));
        assert_eq!(Language::from_str_loose("spa"), Some(Language::Other("es")));
        assert_eq!(Language::from_str_loose("unknown"), None);
    }

    #[test]
    fn test_other_language_answers_in_english() {
        let french = Language::Other("fr");
        assert_eq!(french.code(), "fr");
        assert_eq!(french.name(), "French");
        assert_eq!(french.response_language(), Language::English);
        assert_eq!(french.tts_code(), "en");
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::Marathi).unwrap(), "\"mr\"");
        assert_eq!(serde_json::to_string(&Language::Other("de")).unwrap(), "\"de\"");
        let parsed: Language = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(parsed, Language::Other("fr"));
        assert!(serde_json::from_str::<Language>("\"xx\"").is_err());
    }

    #[test]
    fn test_script_detect() {
        assert_eq!(Script::detect("Hello world"), Some(Script::Latin));
        assert_eq!(Script::detect("नमस्ते"), Some(Script::Devanagari));
        assert_eq!(Script::detect("வணக்கம்"), Some(Script::Tamil));
        assert_eq!(Script::detect("12345 !?"), None);
    }

    #[test]
    fn test_detect_english() {
        let detector = ScriptLanguageDetector::new();
        assert_eq!(detector.detect("Hello, how are you?").unwrap(), Language::English);
    }

    #[test]
    fn test_detect_latin_languages() {
        let detector = ScriptLanguageDetector::new();
        let french = "Bonjour, je voudrais savoir pourquoi ma facture est beaucoup plus élevée \
                      que le mois dernier. Pouvez-vous m'aider, s'il vous plaît ?";
        assert_eq!(detector.detect(french).unwrap(), Language::Other("fr"));

        let spanish = "Hola, quiero saber por qué mi factura es mucho más alta este mes. \
                       ¿Me pueden ayudar con este problema, por favor?";
        assert_eq!(detector.detect(spanish).unwrap(), Language::Other("es"));

        let english = "Hello, I would like to know why my bill is so much higher than last \
                       month. Could you please help me with this problem?";
        assert_eq!(detector.detect(english).unwrap(), Language::English);
    }

    #[test]
    fn test_detect_hindi() {
        let detector = ScriptLanguageDetector::new();
        assert_eq!(detector.detect("नमस्ते, आप कैसे हैं?").unwrap(), Language::Hindi);
    }

    #[test]
    fn test_detect_marathi() {
        let detector = ScriptLanguageDetector::new();
        assert_eq!(detector.detect("मला मदत हवी आहे").unwrap(), Language::Marathi);
        assert_eq!(detector.detect("सकाळ").unwrap(), Language::Marathi);
    }

    #[test]
    fn test_detect_fails_without_letters() {
        let detector = ScriptLanguageDetector::new();
        assert!(detector.detect("1234 ...").is_err());
        assert_eq!(detector.detect_or_default("1234 ..."), Language::English);
    }
}
