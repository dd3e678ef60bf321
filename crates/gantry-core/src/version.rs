//! Human-facing version string
//!
//! Pre-release builds are stamped with the build time and the user who
//! produced them so private builds can be told apart.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};

/// Version reported when the project never set one
pub const UNSPECIFIED_VERSION: &str = "unspecified";

/// Version substituted for [`UNSPECIFIED_VERSION`]
pub const FALLBACK_VERSION: &str = "1.0-SNAPSHOT";

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Renders display versions at a fixed instant for a fixed user
#[derive(Debug, Clone)]
pub struct DisplayVersion {
    now: DateTime<Utc>,
    username: String,
}

impl DisplayVersion {
    /// Create a renderer with an explicit clock reading and user
    pub fn new(now: DateTime<Utc>, username: impl Into<String>) -> Self {
        Self {
            now,
            username: username.into(),
        }
    }

    /// Renderer for the current time and the invoking user
    pub fn current() -> Self {
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        Self::new(Utc::now(), username)
    }

    /// Render the display form of `version`
    pub fn render(&self, version: &str) -> String {
        let mut output = if version == UNSPECIFIED_VERSION {
            FALLBACK_VERSION.to_string()
        } else {
            version.to_string()
        };

        if output.ends_with(SNAPSHOT_SUFFIX) {
            let stamp = self
                .now
                .with_nanosecond(0)
                .unwrap_or(self.now)
                .to_rfc3339_opts(SecondsFormat::Secs, true);
            output.push_str(&format!(" (private-{}-{})", stamp, self.username));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn renderer() -> DisplayVersion {
        let now = Utc.with_ymd_and_hms(2019, 11, 3, 14, 5, 9).unwrap()
            + chrono::Duration::milliseconds(734);
        DisplayVersion::new(now, "sghill")
    }

    #[test]
    fn test_release_version_unchanged() {
        assert_eq!(renderer().render("0.38.0"), "0.38.0");
    }

    #[test]
    fn test_snapshot_is_stamped() {
        assert_eq!(
            renderer().render("0.39.0-SNAPSHOT"),
            "0.39.0-SNAPSHOT (private-2019-11-03T14:05:09Z-sghill)"
        );
    }

    #[test]
    fn test_unspecified_becomes_fallback_snapshot() {
        assert_eq!(
            renderer().render(UNSPECIFIED_VERSION),
            "1.0-SNAPSHOT (private-2019-11-03T14:05:09Z-sghill)"
        );
    }

    #[test]
    fn test_bare_snapshot_word_is_not_stamped() {
        assert_eq!(renderer().render("1.0SNAPSHOT"), "1.0SNAPSHOT");
    }
}
