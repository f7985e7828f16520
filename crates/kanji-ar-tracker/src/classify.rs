//! Glyph classification on canonical marker images.
//!
//! Recognition itself is delegated to a [`GlyphRecognizer`] (an OCR engine
//! in practice). This module restricts it to the dictionary's glyphs and maps
//! the recognized text back to a label id.

use kanji_ar_core::GrayImageView;
use serde::{Deserialize, Serialize};

use crate::dictionary::{LabelDictionary, LabelId};

#[derive(thiserror::Error, Debug)]
pub enum RecognizerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("recognizer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("recognizer output is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("{0}")]
    Backend(String),
}

/// Black-box character recognizer: image and allowed characters in, text out.
pub trait GlyphRecognizer {
    fn recognize(&self, image: &GrayImageView<'_>, whitelist: &str)
        -> Result<String, RecognizerError>;
}

impl<F> GlyphRecognizer for F
where
    F: Fn(&GrayImageView<'_>, &str) -> Result<String, RecognizerError>,
{
    fn recognize(
        &self,
        image: &GrayImageView<'_>,
        whitelist: &str,
    ) -> Result<String, RecognizerError> {
        self(image, whitelist)
    }
}

/// How recognized text is mapped to a dictionary entry.
///
/// Every glyph is tested, in dictionary order, for occurrence as a substring
/// of the recognized text.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// The last matching glyph wins.
    #[default]
    LastSubstring,
    /// The first matching glyph wins.
    FirstSubstring,
}

impl MatchPolicy {
    pub fn resolve(self, text: &str, dictionary: &LabelDictionary) -> Option<LabelId> {
        let mut hits = dictionary
            .glyphs()
            .iter()
            .filter(|g| !g.glyph.is_empty() && text.contains(g.glyph.as_str()))
            .map(|g| g.id);
        match self {
            MatchPolicy::LastSubstring => hits.last(),
            MatchPolicy::FirstSubstring => hits.next(),
        }
    }
}

/// Recognizer restricted to a dictionary's glyph set.
pub struct GlyphClassifier<R> {
    recognizer: R,
    dictionary: LabelDictionary,
    whitelist: String,
    policy: MatchPolicy,
}

impl<R: GlyphRecognizer> GlyphClassifier<R> {
    pub fn new(recognizer: R, dictionary: LabelDictionary, policy: MatchPolicy) -> Self {
        let whitelist = dictionary.whitelist();
        Self {
            recognizer,
            dictionary,
            whitelist,
            policy,
        }
    }

    pub fn dictionary(&self) -> &LabelDictionary {
        &self.dictionary
    }

    pub fn whitelist(&self) -> &str {
        &self.whitelist
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Classify a canonical dark-on-white marker image.
    ///
    /// Recognizer failures are logged and count as "no match".
    pub fn classify(&self, image: &GrayImageView<'_>) -> Option<LabelId> {
        let text = match self.recognizer.recognize(image, &self.whitelist) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("glyph recognizer failed: {err}");
                return None;
            }
        };
        let id = self.policy.resolve(&text, &self.dictionary);
        log::debug!("recognized {:?} -> {:?}", text.trim(), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::GlyphEntry;
    use kanji_ar_core::GrayImage;

    fn dictionary() -> LabelDictionary {
        LabelDictionary::new(vec![
            GlyphEntry::new(1, "日"),
            GlyphEntry::new(2, "本"),
            GlyphEntry::new(3, "日本"),
        ])
        .unwrap()
    }

    #[test]
    fn last_matching_glyph_wins_by_default() {
        let dict = dictionary();
        assert_eq!(MatchPolicy::LastSubstring.resolve("日本\n", &dict), Some(3));
        assert_eq!(MatchPolicy::FirstSubstring.resolve("日本\n", &dict), Some(1));
        assert_eq!(MatchPolicy::LastSubstring.resolve(" 本 ", &dict), Some(2));
        assert_eq!(MatchPolicy::LastSubstring.resolve("", &dict), None);
        assert_eq!(MatchPolicy::LastSubstring.resolve("月", &dict), None);
    }

    #[test]
    fn classifier_passes_the_whitelist_and_swallows_errors() {
        let img = GrayImage::filled(4, 4, 255);
        let ok = GlyphClassifier::new(
            |_: &GrayImageView<'_>, whitelist: &str| -> Result<String, RecognizerError> {
                assert_eq!(whitelist, "日本日本");
                Ok("本".to_string())
            },
            dictionary(),
            MatchPolicy::default(),
        );
        assert_eq!(ok.classify(&img.view()), Some(2));

        let failing = GlyphClassifier::new(
            |_: &GrayImageView<'_>, _: &str| -> Result<String, RecognizerError> {
                Err(RecognizerError::Backend("engine not initialised".into()))
            },
            dictionary(),
            MatchPolicy::default(),
        );
        assert_eq!(failing.classify(&img.view()), None);
    }
}
