//! Hierarchical channel tags.
//!
//! A channel is a dot-separated path such as `Combat.Damage.Fire`. Listeners
//! registered with [`MatchRule::PartialMatch`](crate::MatchRule) on
//! `Combat.Damage` receive broadcasts on `Combat.Damage` and on every channel
//! below it; exact listeners only receive `Combat.Damage` itself.
//!
//! The empty tag is a valid value but never matches anything, on either side
//! of a comparison.

use crate::error::RouterError;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '.';

/// Name of the channel used by the "simple" register and broadcast helpers.
pub const DEFAULT_CHANNEL: &str = "Message";

/// A hierarchical, dot-separated channel name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelTag(CompactString);

impl ChannelTag {
    /// Creates a tag without validation.
    ///
    /// Use [`ChannelTag::parse`] for input that comes from configuration or
    /// scripts.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(CompactString::new(name.as_ref()))
    }

    /// The empty tag. Matches nothing.
    pub fn empty() -> Self {
        Self(CompactString::default())
    }

    /// The built-in default channel, `Message`.
    pub fn default_channel() -> Self {
        Self::new(DEFAULT_CHANNEL)
    }

    /// Parses and validates a tag.
    ///
    /// Every segment must be non-empty and consist of ASCII alphanumerics or
    /// underscores.
    pub fn parse(name: &str) -> Result<Self, RouterError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Self::empty());
        }

        for segment in name.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(RouterError::InvalidChannel(
                    name.to_string(),
                    "empty segment".to_string(),
                ));
            }
            if let Some(bad) = segment
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
            {
                return Err(RouterError::InvalidChannel(
                    name.to_string(),
                    format!("unexpected character '{bad}'"),
                ));
            }
        }

        Ok(Self::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of segments; `0` for the empty tag.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The enclosing channel, or `None` for a root or empty tag.
    pub fn parent(&self) -> Option<ChannelTag> {
        self.0
            .rfind(SEPARATOR)
            .map(|index| ChannelTag::new(&self.0[..index]))
    }

    /// Appends a segment, producing a child channel.
    pub fn child(&self, segment: &str) -> ChannelTag {
        if self.is_empty() {
            return ChannelTag::new(segment);
        }
        let mut name = self.0.clone();
        name.push(SEPARATOR);
        name.push_str(segment);
        ChannelTag(name)
    }

    /// True if both tags are non-empty and identical.
    pub fn matches_exact(&self, other: &ChannelTag) -> bool {
        !self.is_empty() && self == other
    }

    /// True if `self` equals `other` or is a descendant of it.
    ///
    /// `Combat.Damage.Fire` matches `Combat.Damage`; `Combat.DamageOverTime`
    /// does not.
    pub fn matches(&self, other: &ChannelTag) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let this = self.as_str();
        let ancestor = other.as_str();
        this == ancestor
            || (this.len() > ancestor.len()
                && this.starts_with(ancestor)
                && this[ancestor.len()..].starts_with(SEPARATOR))
    }
}

impl fmt::Display for ChannelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelTag {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for ChannelTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ChannelTag {
    fn from(name: String) -> Self {
        Self(CompactString::from(name))
    }
}

impl From<&ChannelTag> for ChannelTag {
    fn from(tag: &ChannelTag) -> Self {
        tag.clone()
    }
}
