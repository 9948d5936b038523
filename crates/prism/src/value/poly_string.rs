//! Dual-form strings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::NormalizerOptions;

/// Derives the comparison form of a string.
pub trait Normalizer: Send + Sync + fmt::Debug {
    fn normalize(&self, orig: &str) -> String;
}

/// A string carried as `orig` (verbatim) and `norm` (normalized).
///
/// `norm` is computed from `orig` by a [`Normalizer`] and is recomputed on
/// every [`PolyString::set_orig`]. There is no way to edit it directly.
///
/// ```
/// use prism::value::{DefaultNormalizer, PolyString};
///
/// let n = DefaultNormalizer::default();
/// let mut s = PolyString::new("Jack  Sparrow", &n);
/// assert_eq!(s.norm(), "jack sparrow");
/// s.set_orig("Élisabeth", &n);
/// assert_eq!(s.norm(), "elisabeth");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolyString {
    orig: String,
    norm: String,
}

impl PolyString {
    pub fn new(orig: impl Into<String>, normalizer: &dyn Normalizer) -> Self {
        let orig = orig.into();
        let norm = normalizer.normalize(&orig);
        Self { orig, norm }
    }

    /// Rebuilds a value whose `norm` was produced earlier, e.g. when decoding
    /// a stored document.
    pub fn from_parts(orig: impl Into<String>, norm: impl Into<String>) -> Self {
        Self {
            orig: orig.into(),
            norm: norm.into(),
        }
    }

    pub fn orig(&self) -> &str {
        &self.orig
    }

    pub fn norm(&self) -> &str {
        &self.norm
    }

    pub fn set_orig(&mut self, orig: impl Into<String>, normalizer: &dyn Normalizer) {
        self.orig = orig.into();
        self.norm = normalizer.normalize(&self.orig);
    }

    pub fn is_empty(&self) -> bool {
        self.orig.is_empty()
    }
}

impl fmt::Display for PolyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.orig)
    }
}

/// Accent folding, case folding, ASCII filtering and whitespace collapsing,
/// each switchable through [`NormalizerOptions`].
#[derive(Debug, Clone, Default)]
pub struct DefaultNormalizer {
    options: NormalizerOptions,
}

impl DefaultNormalizer {
    pub fn new(options: NormalizerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizerOptions {
        &self.options
    }
}

impl Normalizer for DefaultNormalizer {
    fn normalize(&self, orig: &str) -> String {
        let mut out = String::with_capacity(orig.len());
        for ch in orig.chars() {
            match fold_accent(ch) {
                Some(rep) if self.options.strip_accents => out.push_str(rep),
                _ => out.push(ch),
            }
        }
        if self.options.lowercase {
            out = out.to_lowercase();
        }
        if self.options.ascii_only {
            out.retain(|c| c.is_ascii());
        }
        if self.options.collapse_whitespace {
            out = out.split_whitespace().collect::<Vec<_>>().join(" ");
        }
        out
    }
}

fn fold_accent(ch: char) -> Option<&'static str> {
    Some(match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'ď' | 'đ' => "d",
        'Ď' | 'Đ' => "D",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => "E",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' => "I",
        'ľ' | 'ĺ' | 'ł' => "l",
        'Ľ' | 'Ĺ' | 'Ł' => "L",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ŕ' | 'ř' => "r",
        'Ŕ' | 'Ř' => "R",
        'ś' | 'š' => "s",
        'Ś' | 'Š' => "S",
        'ť' => "t",
        'Ť' => "T",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ź' | 'ż' | 'ž' => "z",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> String {
        DefaultNormalizer::default().normalize(s)
    }

    #[test]
    fn default_normalization() {
        assert_eq!(norm("Bar"), "bar");
        assert_eq!(norm("BAR"), "bar");
        assert_eq!(norm("  Jack \t Sparrow "), "jack sparrow");
        assert_eq!(norm("Šťastný Ďuro"), "stastny duro");
        assert_eq!(norm("Straße"), "strasse");
        assert_eq!(norm("日本 abc"), "abc");
    }

    #[test]
    fn options_switch_steps_off() {
        let n = DefaultNormalizer::new(NormalizerOptions {
            strip_accents: false,
            lowercase: true,
            ascii_only: false,
            collapse_whitespace: false,
        });
        assert_eq!(n.normalize("Čaj  X"), "čaj  x");
    }

    #[test]
    fn set_orig_recomputes_norm() {
        let n = DefaultNormalizer::default();
        let mut s = PolyString::new("Foo", &n);
        assert_eq!(s.norm(), "foo");
        s.set_orig("BÁR", &n);
        assert_eq!(s.orig(), "BÁR");
        assert_eq!(s.norm(), "bar");
    }

    #[test]
    fn from_parts_keeps_stored_norm() {
        let s = PolyString::from_parts("Bar", "barbar");
        assert_eq!(s.norm(), "barbar");
        assert_eq!(s.to_string(), "Bar");
    }
}
