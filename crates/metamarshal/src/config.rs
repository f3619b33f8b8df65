use serde::{Deserialize, Serialize};

/// Configuration for the generator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Maximum composite nesting. `None` means unlimited.
    ///
    /// Every value written consumes the remaining depth check, and each
    /// array or object lowers it by one for its children, so a limit of `0`
    /// rejects even a bare `nil`.
    #[serde(default)]
    pub depth_limit: Option<usize>,
}

impl GeneratorConfig {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_depth_limit(limit: usize) -> Self {
        Self {
            depth_limit: Some(limit),
        }
    }

    /// Build from the runtime's signed convention, where any negative
    /// limit means unlimited.
    pub fn from_signed_limit(limit: i64) -> Self {
        Self {
            depth_limit: usize::try_from(limit).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unlimited() {
        let c = GeneratorConfig::default();
        assert_eq!(c.depth_limit, None);
        assert_eq!(c, GeneratorConfig::unlimited());
    }

    #[test]
    fn signed_limits() {
        assert_eq!(GeneratorConfig::from_signed_limit(-1).depth_limit, None);
        assert_eq!(GeneratorConfig::from_signed_limit(0).depth_limit, Some(0));
        assert_eq!(GeneratorConfig::from_signed_limit(12).depth_limit, Some(12));
    }

    #[test]
    fn toml_roundtrip() {
        let c = GeneratorConfig::with_depth_limit(64);
        let text = toml::to_string(&c).unwrap();
        let back: GeneratorConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, c);

        let empty: GeneratorConfig = toml::from_str("").unwrap();
        assert_eq!(empty.depth_limit, None);
    }
}
