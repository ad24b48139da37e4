use std::path::Path;

use serde::Deserialize;

use crate::error::{HrmError, Result};
use crate::number::{Rational, serde_rational};
use crate::time::Time;

/// Performance constants of the Hypothetical Render Model.
///
/// The defaults are the reference values; every field is overridable so a
/// deployment can check against a different decoder profile. Values are
/// exact: `0.6` in a config file is three fifths, not its nearest `f64`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HrmParameters {
    /// Inter-publication delay: longest time a decoder may be given for one
    /// snapshot transition, in seconds.
    #[serde(with = "serde_rational")]
    pub ipd: Rational,
    /// Normalized glyph buffer size.
    #[serde(with = "serde_rational")]
    pub ngbs: Rational,
    /// Background drawing performance factor.
    #[serde(with = "serde_rational")]
    pub bdraw: Rational,
    /// Glyph copy factor for Latin, Greek, Cyrillic, Hebrew and Common.
    #[serde(with = "serde_rational")]
    pub gcpy_base: Rational,
    #[serde(with = "serde_rational")]
    pub gcpy_other: Rational,
    /// Text rendering factor for Han, Katakana, Hiragana, Bopomofo and Hangul.
    #[serde(with = "serde_rational")]
    pub ren_g_cjk: Rational,
    #[serde(with = "serde_rational")]
    pub ren_g_other: Rational,
}

impl Default for HrmParameters {
    fn default() -> Self {
        HrmParameters {
            ipd: Rational::from_integer(1),
            ngbs: Rational::from_integer(1),
            bdraw: Rational::from_integer(12),
            gcpy_base: Rational::from_integer(12),
            gcpy_other: Rational::from_integer(3),
            ren_g_cjk: Rational::new(3, 5),
            ren_g_other: Rational::new(6, 5),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Slack allowed when stitching consecutive document intervals.
    pub tolerance: Time,
    pub parameters: HrmParameters,
}

impl ValidatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| HrmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
