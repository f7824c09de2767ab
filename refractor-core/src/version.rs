//! Target PHP version handling.
//!
//! Versions order naturally, so rule bounds and level tags can use plain
//! comparisons (`Php56 <= Php74`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A PHP language version, as used for rule bounds and rule set tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PhpVersion {
    Php53,
    Php54,
    Php55,
    Php56,
    Php70,
    Php71,
    Php72,
    Php73,
    Php74,
    Php80,
    Php81,
    Php82,
    Php83,
    Php84,
}

impl PhpVersion {
    /// All known versions in ascending order.
    pub const ALL: &'static [PhpVersion] = &[
        PhpVersion::Php53,
        PhpVersion::Php54,
        PhpVersion::Php55,
        PhpVersion::Php56,
        PhpVersion::Php70,
        PhpVersion::Php71,
        PhpVersion::Php72,
        PhpVersion::Php73,
        PhpVersion::Php74,
        PhpVersion::Php80,
        PhpVersion::Php81,
        PhpVersion::Php82,
        PhpVersion::Php83,
        PhpVersion::Php84,
    ];

    /// Dotted form, e.g. `"7.4"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhpVersion::Php53 => "5.3",
            PhpVersion::Php54 => "5.4",
            PhpVersion::Php55 => "5.5",
            PhpVersion::Php56 => "5.6",
            PhpVersion::Php70 => "7.0",
            PhpVersion::Php71 => "7.1",
            PhpVersion::Php72 => "7.2",
            PhpVersion::Php73 => "7.3",
            PhpVersion::Php74 => "7.4",
            PhpVersion::Php80 => "8.0",
            PhpVersion::Php81 => "8.1",
            PhpVersion::Php82 => "8.2",
            PhpVersion::Php83 => "8.3",
            PhpVersion::Php84 => "8.4",
        }
    }

    /// Tag form used by rule set names, e.g. `"php74"`.
    pub fn tag(&self) -> &'static str {
        match self {
            PhpVersion::Php53 => "php53",
            PhpVersion::Php54 => "php54",
            PhpVersion::Php55 => "php55",
            PhpVersion::Php56 => "php56",
            PhpVersion::Php70 => "php70",
            PhpVersion::Php71 => "php71",
            PhpVersion::Php72 => "php72",
            PhpVersion::Php73 => "php73",
            PhpVersion::Php74 => "php74",
            PhpVersion::Php80 => "php80",
            PhpVersion::Php81 => "php81",
            PhpVersion::Php82 => "php82",
            PhpVersion::Php83 => "php83",
            PhpVersion::Php84 => "php84",
        }
    }
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhpVersion {
    type Err = String;

    /// Accepts the dotted form (`"7.4"`) and the tag form (`"php74"` / `"74"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let digits = normalized
            .strip_prefix("php")
            .unwrap_or(&normalized)
            .replace('.', "");
        for version in PhpVersion::ALL {
            if version.tag().strip_prefix("php") == Some(digits.as_str()) {
                return Ok(*version);
            }
        }
        Err(format!("unknown PHP version: {}", s))
    }
}

impl TryFrom<String> for PhpVersion {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PhpVersion> for String {
    fn from(v: PhpVersion) -> String {
        v.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_and_tag_forms() {
        assert_eq!("7.4".parse::<PhpVersion>().unwrap(), PhpVersion::Php74);
        assert_eq!("php80".parse::<PhpVersion>().unwrap(), PhpVersion::Php80);
        assert_eq!("PHP81".parse::<PhpVersion>().unwrap(), PhpVersion::Php81);
        assert_eq!("56".parse::<PhpVersion>().unwrap(), PhpVersion::Php56);
        assert!("9.9".parse::<PhpVersion>().is_err());
    }

    #[test]
    fn orders_across_major_versions() {
        assert!(PhpVersion::Php56 < PhpVersion::Php70);
        assert!(PhpVersion::Php74 < PhpVersion::Php80);
        assert!(PhpVersion::Php84 > PhpVersion::Php53);
    }

    #[test]
    fn displays_dotted_form() {
        assert_eq!(PhpVersion::Php70.to_string(), "7.0");
        assert_eq!(PhpVersion::Php84.as_str(), "8.4");
    }

    #[test]
    fn all_is_ascending_and_matches_tags() {
        for pair in PhpVersion::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for version in PhpVersion::ALL {
            assert_eq!(version.tag().parse::<PhpVersion>().unwrap(), *version);
        }
    }
}
