use crate::core::record::Denomination;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MICRO_PLATFORM: &str = "Digital_Assets_Type_1";
pub const DEFAULT_NOMINAL_PLATFORM: &str = "Digital_Assets_Type_2";

/// Decides which denomination a raw row belongs to.
///
/// An explicit denomination tag on the row always wins. Without one, the
/// row's platform is looked up (exact, case-sensitive) in the configured
/// platform lists. A platform listed in both lists is classified as micro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classifier {
    pub micro_platforms: Vec<String>,
    pub nominal_platforms: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            micro_platforms: vec![DEFAULT_MICRO_PLATFORM.to_string()],
            nominal_platforms: vec![DEFAULT_NOMINAL_PLATFORM.to_string()],
        }
    }
}

impl Classifier {
    pub fn new(micro_platforms: Vec<String>, nominal_platforms: Vec<String>) -> Self {
        Self {
            micro_platforms,
            nominal_platforms,
        }
    }

    /// Classify a row from its platform and optional explicit tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use asset_settlement::core::record::Denomination;
    /// use asset_settlement::ingest::classifier::Classifier;
    ///
    /// let classifier = Classifier::default();
    /// assert_eq!(
    ///     classifier.classify(Some("Digital_Assets_Type_1"), None),
    ///     Some(Denomination::Micro)
    /// );
    /// assert_eq!(
    ///     classifier.classify(Some("Digital_Assets_Type_1"), Some("nominal")),
    ///     Some(Denomination::Nominal)
    /// );
    /// assert_eq!(classifier.classify(Some("Elsewhere"), None), None);
    /// ```
    pub fn classify(&self, platform: Option<&str>, tag: Option<&str>) -> Option<Denomination> {
        if let Some(denomination) = tag.and_then(Denomination::from_tag) {
            return Some(denomination);
        }
        let platform = platform?.trim();
        if self.micro_platforms.iter().any(|p| p == platform) {
            Some(Denomination::Micro)
        } else if self.nominal_platforms.iter().any(|p| p == platform) {
            Some(Denomination::Nominal)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_platforms() {
        let c = Classifier::default();
        assert_eq!(
            c.classify(Some(DEFAULT_MICRO_PLATFORM), None),
            Some(Denomination::Micro)
        );
        assert_eq!(
            c.classify(Some(DEFAULT_NOMINAL_PLATFORM), None),
            Some(Denomination::Nominal)
        );
    }

    #[test]
    fn test_platform_match_is_case_sensitive() {
        let c = Classifier::default();
        assert_eq!(c.classify(Some("digital_assets_type_1"), None), None);
    }

    #[test]
    fn test_platform_is_trimmed() {
        let c = Classifier::default();
        assert_eq!(
            c.classify(Some("  Digital_Assets_Type_2 "), None),
            Some(Denomination::Nominal)
        );
    }

    #[test]
    fn test_unrecognized_tag_falls_back_to_platform() {
        let c = Classifier::default();
        assert_eq!(
            c.classify(Some(DEFAULT_NOMINAL_PLATFORM), Some("???")),
            Some(Denomination::Nominal)
        );
    }

    #[test]
    fn test_tag_without_platform() {
        let c = Classifier::default();
        assert_eq!(c.classify(None, Some("points")), Some(Denomination::Micro));
        assert_eq!(c.classify(None, None), None);
    }

    #[test]
    fn test_custom_platforms() {
        let c = Classifier::new(vec!["Rewards".into()], vec!["Cash".into()]);
        assert_eq!(c.classify(Some("Rewards"), None), Some(Denomination::Micro));
        assert_eq!(c.classify(Some(DEFAULT_MICRO_PLATFORM), None), None);
    }
}
