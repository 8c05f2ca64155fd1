use std::path::{Path, PathBuf};

/// Debugging knobs of an upload body.
///
/// A fixed boundary makes the produced bytes reproducible, a mirror file receives a copy of everything sent
/// (written to `<mirror_file>.fin`). Empty values are treated as unset.
///
/// # Examples
///
/// ```
/// use stream_upload::DebugOptions;
///
/// let options = DebugOptions::new().fixed_boundary("XYZ").mirror_file("/tmp/upload-dump");
///
/// assert_eq!(options.boundary(), Some("XYZ"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DebugOptions {
    pub(crate) fixed_boundary: Option<String>,
    pub(crate) mirror_file: Option<PathBuf>,
}

impl DebugOptions {
    pub fn new() -> DebugOptions {
        DebugOptions::default()
    }

    /// Uses `boundary` instead of a random one.
    pub fn fixed_boundary<B: Into<String>>(mut self, boundary: B) -> DebugOptions {
        self.fixed_boundary = Some(boundary.into());
        self
    }

    /// Mirrors the stream to `<path>.fin`.
    pub fn mirror_file<P: Into<PathBuf>>(mut self, path: P) -> DebugOptions {
        self.mirror_file = Some(path.into());
        self
    }

    /// The fixed boundary, if set.
    pub fn boundary(&self) -> Option<&str> {
        self.fixed_boundary.as_deref().filter(|b| !b.is_empty())
    }

    /// The mirror file base path, if set.
    pub fn mirror_base(&self) -> Option<&Path> {
        self.mirror_file.as_deref().filter(|p| !p.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_unset() {
        let options = DebugOptions::new().fixed_boundary("").mirror_file("");
        assert_eq!(options.boundary(), None);
        assert_eq!(options.mirror_base(), None);

        let options = DebugOptions::new().fixed_boundary("b").mirror_file("out");
        assert_eq!(options.boundary(), Some("b"));
        assert_eq!(options.mirror_base(), Some(Path::new("out")));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize() {
        let options: DebugOptions =
            serde_json::from_str(r#"{ "fixed_boundary": "XYZ", "mirror_file": "/tmp/dump" }"#).unwrap();
        assert_eq!(options, DebugOptions::new().fixed_boundary("XYZ").mirror_file("/tmp/dump"));

        let options: DebugOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, DebugOptions::default());
    }
}
