use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured server version (`major.minor.patch.build`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
}

impl ServerVersion {
    /// Sentinel used when the version probe fails: every version gate passes.
    pub const MAX: ServerVersion = ServerVersion {
        major: u32::MAX,
        minor: u32::MAX,
        patch: u32::MAX,
        build: u32::MAX,
    };

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build: 0,
        }
    }

    /// Parse the first dotted number found in a server's self-reported version.
    ///
    /// Accepts strings such as `16.0.1000.6`, `8.0.34-0ubuntu0.22.04.1`,
    /// `10.11.6-MariaDB-1:10.11.6+maria~ubu2204` and
    /// `15.3 (Debian 15.3-1.pgdg120+1)`.
    pub fn parse(text: &str) -> Option<Self> {
        let start = text.find(|c: char| c.is_ascii_digit())?;
        let token: &str = text[start..]
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or("");

        let mut parts = token
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u32>().ok());

        let major = parts.next().flatten()?;
        let minor = parts.next().flatten().unwrap_or(0);
        let patch = parts.next().flatten().unwrap_or(0);
        let build = parts.next().flatten().unwrap_or(0);

        Some(Self {
            major,
            minor,
            patch,
            build,
        })
    }

    pub fn is_max(&self) -> bool {
        *self == Self::MAX
    }

    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }
}

impl Default for ServerVersion {
    fn default() -> Self {
        Self::MAX
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_max() {
            return f.write_str("latest");
        }
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vendor_version_strings() {
        assert_eq!(
            ServerVersion::parse("16.0.1000.6"),
            Some(ServerVersion {
                major: 16,
                minor: 0,
                patch: 1000,
                build: 6
            })
        );
        assert_eq!(
            ServerVersion::parse("8.0.34-0ubuntu0.22.04.1"),
            Some(ServerVersion::new(8, 0, 34))
        );
        assert_eq!(
            ServerVersion::parse("10.11.6-MariaDB-1:10.11.6+maria~ubu2204"),
            Some(ServerVersion::new(10, 11, 6))
        );
        assert_eq!(
            ServerVersion::parse("15.3 (Debian 15.3-1.pgdg120+1)"),
            Some(ServerVersion::new(15, 3, 0))
        );
    }

    #[test]
    fn rejects_text_without_digits() {
        assert_eq!(ServerVersion::parse("unknown"), None);
        assert_eq!(ServerVersion::parse(""), None);
    }

    #[test]
    fn sentinel_passes_every_gate() {
        assert!(ServerVersion::MAX.at_least(99, 99));
        assert!(!ServerVersion::new(9, 6, 0).at_least(10, 0));
        assert!(ServerVersion::new(10, 2, 0).at_least(10, 2));
    }
}
