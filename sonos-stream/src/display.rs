//! Output sink for album art
//!
//! The listener only ever renders an image or clears the output. Hardware
//! back ends implement [`Display`]; [`AbsentDisplay`] stands in when there is
//! nothing attached.

use bytes::Bytes;

/// Image bytes as served by the device, plus their declared media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumArt {
    pub bytes: Bytes,
    /// `Content-Type` header value, possibly with parameters
    pub content_type: String,
}

impl AlbumArt {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    /// Lower-cased media type without parameters, e.g. `image/jpeg`
    pub fn media_type(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}

/// Errors reported by a display back end
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    #[error("render failed: {0}")]
    Render(String),

    #[error("clear failed: {0}")]
    Clear(String),

    #[error("unsupported image type: {0}")]
    UnsupportedImage(String),
}

/// Something that can show album art.
pub trait Display {
    /// Show `art`, replacing whatever is currently shown
    fn render(&mut self, art: &AlbumArt) -> Result<(), DisplayError>;

    /// Blank the output
    fn clear(&mut self) -> Result<(), DisplayError>;
}

/// Display used when no hardware is attached; accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsentDisplay;

impl Display for AbsentDisplay {
    fn render(&mut self, _art: &AlbumArt) -> Result<(), DisplayError> {
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_strips_parameters() {
        let art = AlbumArt::new(vec![0xff, 0xd8], "Image/JPEG; charset=binary");
        assert_eq!(art.media_type(), "image/jpeg");

        let bare = AlbumArt::new(Bytes::new(), "");
        assert_eq!(bare.media_type(), "");
    }

    #[test]
    fn test_absent_display_accepts_everything() {
        let mut display: Box<dyn Display + Send> = Box::new(AbsentDisplay);
        assert!(display.render(&AlbumArt::new(vec![1, 2, 3], "image/png")).is_ok());
        assert!(display.clear().is_ok());
    }
}
