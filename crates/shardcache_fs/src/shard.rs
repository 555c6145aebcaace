//! Mapping digests onto a bounded-depth directory tree.
//!
//! An entry for digest `d` lives in `<root>/<d[0..2]>/<d[2..4]>/.../<d>`, with
//! exactly `levels` directories between the root and the entry file. With a
//! uniformly distributed hash every directory holds a similar share of the
//! entries, so no single directory grows large enough to slow down lookups.

use std::fmt;
use std::path::PathBuf;

/// Segment used for levels the digest is too short to fill.
pub const FILLER: &str = "00";

/// Deepest shard tree a store may be opened with.
pub const MAX_LEVELS: u8 = 10;

/// Shard depth used when none is configured.
pub const DEFAULT_LEVELS: u8 = 2;

/// The ordered directory segments leading to an entry file.
///
/// Always holds exactly the configured number of segments, each two
/// characters long, whatever the length of the digest it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardPath {
    segments: Vec<String>,
}

impl ShardPath {
    /// Derives the shard path of `digest` for a tree `levels` deep.
    ///
    /// The digest is cut into consecutive two-character chunks and the first
    /// `levels` of them are kept. A trailing odd character is completed with
    /// `'0'`, and levels beyond the end of the digest become [`FILLER`].
    pub fn from_digest(digest: &str, levels: u8) -> Self {
        let levels = usize::from(levels);
        let chars: Vec<char> = digest.chars().take(levels * 2).collect();
        let mut segments: Vec<String> = chars
            .chunks(2)
            .map(|chunk| match chunk {
                [single] => format!("{single}0"),
                pair => pair.iter().collect(),
            })
            .collect();
        segments.resize(levels, FILLER.to_string());
        Self { segments }
    }

    /// The directory segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of directory levels.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for a zero-level tree, where entries sit in the root.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments joined with the platform directory separator.
    pub fn to_relative_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for ShardPath {
    /// Renders the segments as `aa/bb/`, with a trailing separator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}/")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::Path;

    #[test]
    fn takes_leading_chunks() {
        let p = ShardPath::from_digest("d41d8cd98f00b204e9800998ecf8427e", 2);
        assert_eq!(p.segments(), ["d4", "1d"]);
        assert_eq!(p.to_string(), "d4/1d/");
    }

    #[test]
    fn pads_short_digest_with_filler() {
        let p = ShardPath::from_digest("abcd", 4);
        assert_eq!(p.segments(), ["ab", "cd", "00", "00"]);
    }

    #[test]
    fn completes_odd_trailing_character() {
        let p = ShardPath::from_digest("abc", 3);
        assert_eq!(p.segments(), ["ab", "c0", "00"]);
    }

    #[test]
    fn empty_digest_is_all_filler() {
        let p = ShardPath::from_digest("", 2);
        assert_eq!(p.segments(), ["00", "00"]);
    }

    #[test]
    fn zero_levels_is_root() {
        let p = ShardPath::from_digest("abcdef", 0);
        assert!(p.is_empty());
        assert_eq!(p.to_string(), "");
        assert_eq!(p.to_relative_path(), PathBuf::new());
    }

    #[test]
    fn relative_path_uses_platform_separator() {
        let p = ShardPath::from_digest("0123456789", 3);
        assert_eq!(p.to_relative_path(), Path::new("01").join("23").join("45"));
    }

    #[test]
    fn max_depth_with_md5_digest() {
        let p = ShardPath::from_digest("900150983cd24fb0d6963f7d28e17f72", 10);
        assert_eq!(p.len(), 10);
        assert_eq!(p.segments()[9], "d6");
    }

    proptest! {
        #[test]
        fn always_exactly_levels_segments(digest in "[0-9a-f]{0,40}", levels in 0u8..=10) {
            let p = ShardPath::from_digest(&digest, levels);
            prop_assert_eq!(p.len(), usize::from(levels));
            for segment in p.segments() {
                prop_assert_eq!(segment.chars().count(), 2);
            }
        }

        #[test]
        fn is_a_prefix_of_the_digest(digest in "[0-9a-f]{20,40}", levels in 0u8..=10) {
            let p = ShardPath::from_digest(&digest, levels);
            let joined: String = p.segments().concat();
            prop_assert!(digest.starts_with(&joined));
        }
    }
}
