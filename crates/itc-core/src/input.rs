use std::path::PathBuf;

/// Where an input token lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Filesystem path.
    Local,
    /// `http://` or `https://` URL.
    Remote,
}

impl InputKind {
    /// Classify a token by its (case-insensitive) URL scheme.
    ///
    /// # Example
    /// ```
    /// use itc_core::input::InputKind;
    /// assert_eq!(InputKind::of("HTTPS://x.org/a.gif"), InputKind::Remote);
    /// assert_eq!(InputKind::of("httpd.png"), InputKind::Local);
    /// ```
    #[must_use]
    pub fn of(token: &str) -> Self {
        let head: String = token.chars().take(8).collect::<String>().to_ascii_lowercase();
        if head.starts_with("http://") || head.starts_with("https://") {
            Self::Remote
        } else {
            Self::Local
        }
    }
}

/// Input résolu, immuable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputSpec {
    /// Path or URL after glob expansion.
    pub token: String,
    /// Local or remote.
    pub kind: InputKind,
    /// Position in the resolved order, 0..N-1.
    pub index: usize,
}

impl InputSpec {
    /// Build a spec, classifying the token.
    #[must_use]
    pub fn new(token: impl Into<String>, index: usize) -> Self {
        let token = token.into();
        Self {
            kind: InputKind::of(&token),
            token,
            index,
        }
    }

    /// Last path segment of the token, without query or fragment.
    ///
    /// # Example
    /// ```
    /// use itc_core::input::InputSpec;
    /// let spec = InputSpec::new("https://x.org/img/cat.gif?size=2#top", 0);
    /// assert_eq!(spec.file_name(), "cat.gif");
    /// ```
    #[must_use]
    pub fn file_name(&self) -> &str {
        let trimmed = match self.kind {
            InputKind::Remote => self
                .token
                .split(['?', '#'])
                .next()
                .unwrap_or(&self.token),
            InputKind::Local => &self.token,
        };
        let name = trimmed
            .rsplit(['/', '\\'])
            .find(|segment| !segment.is_empty())
            .unwrap_or("");
        if name.is_empty() || name.contains(':') {
            "asset"
        } else {
            name
        }
    }
}

/// Copie locale d'un input dans la zone de staging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedAsset {
    /// Input this asset was acquired from. `origin.index` is the asset index.
    pub origin: InputSpec,
    /// Where the bytes were written.
    pub path: PathBuf,
    /// Number of bytes staged.
    pub len: u64,
}

impl StagedAsset {
    /// Asset index (same as the input index).
    #[must_use]
    pub fn index(&self) -> usize {
        self.origin.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_detection_is_case_insensitive() {
        assert_eq!(InputKind::of("http://a/b.png"), InputKind::Remote);
        assert_eq!(InputKind::of("HtTp://a/b.png"), InputKind::Remote);
        assert_eq!(InputKind::of("./http/b.png"), InputKind::Local);
        assert_eq!(InputKind::of("ftp://a/b.png"), InputKind::Local);
    }

    #[test]
    fn file_name_of_local_paths() {
        assert_eq!(InputSpec::new("dir/sub/a.png", 0).file_name(), "a.png");
        assert_eq!(InputSpec::new("a.png", 0).file_name(), "a.png");
        assert_eq!(InputSpec::new("dir/", 0).file_name(), "dir");
    }

    #[test]
    fn file_name_of_bare_host_falls_back() {
        assert_eq!(InputSpec::new("https://example.org", 0).file_name(), "example.org");
        assert_eq!(InputSpec::new("https://", 0).file_name(), "asset");
    }
}
