use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

//
// ─── ERRORS (domain validation) ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("Image reference cannot be empty.")]
    EmptyImageRef,

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
}

//
// ─── IMAGE REFERENCE ───────────────────────────────────────────────────────────
//

/// Reference to a stem or option image.
///
/// Question resources ship relative paths (resolved against the image base
/// directory) but may also point at absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageRef {
    FilePath(PathBuf),
    Url(Url),
}

impl ImageRef {
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ImageRefError> {
        let p = path.into();
        if p.as_os_str().is_empty() {
            return Err(ImageRefError::EmptyImageRef);
        }
        Ok(ImageRef::FilePath(p))
    }

    pub fn from_url(url: impl AsRef<str>) -> Result<Self, ImageRefError> {
        let s = url.as_ref().trim();
        if s.is_empty() {
            return Err(ImageRefError::EmptyImageRef);
        }
        let u = Url::parse(s).map_err(|_| ImageRefError::InvalidUrl(s.to_string()))?;
        Ok(ImageRef::Url(u))
    }

    /// Parses a raw reference string from a question resource.
    ///
    /// `http`/`https` references become URLs; everything else is treated as a
    /// relative file path.
    pub fn parse(raw: &str) -> Result<Self, ImageRefError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ImageRefError::EmptyImageRef);
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::from_url(trimmed)
        } else {
            Self::from_file(trimmed)
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ImageRef::FilePath(p) => Some(p.as_path()),
            _ => None,
        }
    }

    pub fn as_url(&self) -> Option<&Url> {
        match self {
            ImageRef::Url(u) => Some(u),
            _ => None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::FilePath(p) => write!(f, "{}", p.display()),
            ImageRef::Url(u) => write!(f, "{u}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_relative_path() {
        let image = ImageRef::parse("fold_1/circle_001.png").unwrap();
        assert_eq!(
            image.as_path(),
            Some(Path::new("fold_1/circle_001.png"))
        );
    }

    #[test]
    fn parse_http_url() {
        let image = ImageRef::parse("https://example.com/stems/a.png").unwrap();
        assert!(image.as_url().is_some());
        assert!(image.as_path().is_none());
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(ImageRef::parse("  "), Err(ImageRefError::EmptyImageRef));
    }
}
