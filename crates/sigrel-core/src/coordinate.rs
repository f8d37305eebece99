//! # Publish Coordinates
//!
//! A [`Coordinate`] is the 4-tuple `(component, channel, os, arch)` that
//! identifies one independent publish lineage. A [`Version`] selects one
//! artifact inside a lineage. Both are built from validated segments, so
//! joining them onto a storage root can never escape it.
//!
//! ## Segment Rules
//!
//! - 1 to 128 bytes.
//! - Characters limited to ASCII alphanumerics and `.`, `_`, `-`, `+`.
//! - No leading `.` (rules out `.`, `..`, and hidden entries).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Reserved version alias resolving to the coordinate-level pointer.
pub const LATEST: &str = "latest";

/// Maximum length of a single path segment, in bytes.
pub const MAX_SEGMENT_LEN: usize = 128;

/// Names the storage layout writes itself. A version directory sits next to
/// the coordinate's `version.json`, so versions share this list.
const RESERVED_FILE_NAMES: &[&str] = &["version.json", "signature.der"];

fn validate_segment(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.len() > MAX_SEGMENT_LEN {
        return Err(ValidationError::TooLong {
            field,
            len: value.len(),
            max: MAX_SEGMENT_LEN,
        });
    }
    if let Some(ch) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+')))
    {
        return Err(ValidationError::InvalidCharacter {
            field,
            value: value.to_string(),
            ch,
        });
    }
    if value.starts_with('.') {
        return Err(ValidationError::UnsafeSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// One validated, path-safe segment of a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Segment(String);

impl Segment {
    /// Validate `value` as the coordinate field named `field`.
    pub fn new(field: &'static str, value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate_segment(field, &s)?;
        Ok(Self(s))
    }

    /// Access the segment string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `(component, channel, os, arch)` lineage identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    /// Software component name (e.g. `app`).
    pub component: Segment,
    /// Release channel (e.g. `stable`, `beta`).
    pub channel: Segment,
    /// Target operating system (e.g. `linux`).
    pub os: Segment,
    /// Target architecture (e.g. `x64`).
    pub arch: Segment,
}

impl Coordinate {
    /// Validate and assemble a coordinate from its four raw segments.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered, in field order.
    pub fn new(
        component: &str,
        channel: &str,
        os: &str,
        arch: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            component: Segment::new("component", component)?,
            channel: Segment::new("channel", channel)?,
            os: Segment::new("os", os)?,
            arch: Segment::new("arch", arch)?,
        })
    }

    /// The four segments in storage order.
    pub fn segments(&self) -> [&str; 4] {
        [
            self.component.as_str(),
            self.channel.as_str(),
            self.os.as_str(),
            self.arch.as_str(),
        ]
    }

    /// Slash-joined key, unique per lineage. Used for lock keys and logs.
    pub fn key(&self) -> String {
        self.segments().join("/")
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// A free-form, path-safe version string (e.g. `1.2.0`, `2024.06.01-rc1`).
///
/// `latest` is a reserved alias and cannot be published. Use
/// [`Version::parse_selector`] for read paths where `latest` is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    /// Validate a version that is about to be published.
    ///
    /// # Errors
    ///
    /// Fails on unsafe segments, on the reserved alias `latest`, and on
    /// names the storage layout uses for its own files.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate_segment("version", &s)?;
        if s.eq_ignore_ascii_case(LATEST)
            || RESERVED_FILE_NAMES
                .iter()
                .any(|r| s.eq_ignore_ascii_case(r))
        {
            return Err(ValidationError::Reserved {
                field: "version",
                value: s,
            });
        }
        Ok(Self(s))
    }

    /// Parse a read-side version selector: `None` for `latest`, otherwise a
    /// concrete version.
    pub fn parse_selector(value: &str) -> Result<Option<Self>, ValidationError> {
        if value == LATEST {
            return Ok(None);
        }
        Self::new(value).map(Some)
    }

    /// Access the version string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Version {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name under which an uploaded binary is stored in its version directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    /// Fallback name when the client supplies none.
    pub const DEFAULT: &'static str = "binary";

    /// Validate a stored file name.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate_segment("file name", &s)?;
        if RESERVED_FILE_NAMES.contains(&s.as_str()) {
            return Err(ValidationError::Reserved {
                field: "file name",
                value: s,
            });
        }
        Ok(Self(s))
    }

    /// Derive a stored name from a client-supplied upload name.
    ///
    /// Only the final path component is kept (both `/` and `\` count as
    /// separators). Returns an error when that component is unusable; a
    /// missing or blank name yields [`FileName::DEFAULT`].
    pub fn from_upload(raw: Option<&str>) -> Result<Self, ValidationError> {
        let base = raw
            .map(|r| r.rsplit(['/', '\\']).next().unwrap_or("").trim())
            .unwrap_or("");
        if base.is_empty() {
            return Ok(Self(Self::DEFAULT.to_string()));
        }
        Self::new(base)
    }

    /// Access the file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
