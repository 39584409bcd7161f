//! Ownership of the loaded bitmaps.
//!
//! The manager holds two RGBA buffers of identical size: `original`, the
//! pristine decode used as the blur source, and `working`, the buffer that is
//! displayed, edited and exported.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;

use crate::config::EditorConfig;
use crate::error::{ExportError, LoadError, LoadResult};

/// Raster encodings accepted on input.
pub const ACCEPTED_FORMATS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Jpeg];

/// Extensions offered by file pickers.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Bytes of a user-chosen file plus whatever type information came with it.
#[derive(Clone, Debug, Default)]
pub struct ImageSource {
    pub name: Option<String>,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: Some(name.into()),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Resolves the declared format: MIME type first, then the file
    /// extension, and content sniffing only when neither was supplied.
    fn declared_format(&self) -> LoadResult<ImageFormat> {
        let mime = self.mime.as_deref().filter(|m| !m.trim().is_empty());
        let ext = self
            .name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str());

        let (format, declared) = if let Some(mime) = mime {
            (ImageFormat::from_mime_type(mime), mime.to_string())
        } else if let Some(ext) = ext {
            (ImageFormat::from_extension(ext), ext.to_string())
        } else {
            (image::guess_format(&self.bytes).ok(), "unknown".to_string())
        };

        match format {
            Some(f) if ACCEPTED_FORMATS.contains(&f) => Ok(f),
            _ => Err(LoadError::UnsupportedFormat(declared)),
        }
    }
}

/// Describes the currently loaded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHandle {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

struct Bitmaps {
    original: RgbaImage,
    working: RgbaImage,
    handle: ImageHandle,
}

pub struct ImageBufferManager {
    max_file_bytes: u64,
    max_dimension: u32,
    bitmaps: Option<Bitmaps>,
    revision: u64,
}

impl ImageBufferManager {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
            max_dimension: config.max_dimension,
            bitmaps: None,
            revision: 0,
        }
    }

    /// Decodes `source` and installs it as both `original` and `working`.
    ///
    /// On failure nothing is installed and whatever was loaded before stays
    /// as it was.
    pub fn load(&mut self, source: &ImageSource) -> LoadResult<ImageHandle> {
        let format = source.declared_format()?;

        let size = source.bytes.len() as u64;
        self.check_size(size)?;

        // Check the header before decoding pixels so oversized images never
        // allocate a full frame.
        let (width, height) = reader(&source.bytes, format)
            .into_dimensions()
            .map_err(LoadError::DecodeError)?;
        self.check_dimensions(width, height)?;

        let decoded = reader(&source.bytes, format)
            .decode()
            .map_err(LoadError::DecodeError)?
            .to_rgba8();
        self.check_dimensions(decoded.width(), decoded.height())?;

        let handle = ImageHandle {
            width: decoded.width(),
            height: decoded.height(),
            format,
        };
        log::info!(
            "Loaded {:?} image {}x{} ({} bytes)",
            format,
            handle.width,
            handle.height,
            size
        );
        self.bitmaps = Some(Bitmaps {
            working: decoded.clone(),
            original: decoded,
            handle,
        });
        self.revision += 1;
        Ok(handle)
    }

    /// Reads and loads the file at `path`.
    ///
    /// The extension and the on-disk size are checked before any byte is
    /// read, so an oversized file is refused without being pulled into
    /// memory.
    pub fn load_path(&mut self, path: &Path) -> LoadResult<ImageHandle> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let header = ImageSource {
            name,
            ..Default::default()
        };
        // Without an extension the format is sniffed after reading.
        if path.extension().is_some() {
            header.declared_format()?;
        }
        self.check_size(std::fs::metadata(path)?.len())?;

        let source = ImageSource {
            bytes: std::fs::read(path)?,
            ..header
        };
        self.load(&source)
    }

    /// Drops both bitmaps. Calling it with nothing loaded does nothing.
    pub fn reset(&mut self) {
        if self.bitmaps.take().is_some() {
            log::debug!("Image buffers discarded");
            self.revision += 1;
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.bitmaps.is_some()
    }

    pub fn handle(&self) -> Option<ImageHandle> {
        self.bitmaps.as_ref().map(|b| b.handle)
    }

    pub fn original(&self) -> Option<&RgbaImage> {
        self.bitmaps.as_ref().map(|b| &b.original)
    }

    pub fn working(&self) -> Option<&RgbaImage> {
        self.bitmaps.as_ref().map(|b| &b.working)
    }

    /// Mutable `working` alongside the pristine `original`.
    ///
    /// Counts as a modification: the revision is bumped.
    pub fn edit(&mut self) -> Option<(&mut RgbaImage, &RgbaImage)> {
        let bitmaps = self.bitmaps.as_mut()?;
        self.revision += 1;
        Some((&mut bitmaps.working, &bitmaps.original))
    }

    /// Changes whenever the bitmaps are replaced, discarded or edited.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Encodes `working` as PNG, whatever format the input was.
    pub fn export_working(&self) -> Result<Vec<u8>, ExportError> {
        let working = self.working().ok_or(ExportError::NoImage)?;
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            working.as_raw(),
            working.width(),
            working.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(bytes)
    }

    fn check_size(&self, size: u64) -> LoadResult<()> {
        if size > self.max_file_bytes {
            return Err(LoadError::TooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }

    fn check_dimensions(&self, width: u32, height: u32) -> LoadResult<()> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(LoadError::DimensionTooLarge {
                width,
                height,
                limit: self.max_dimension,
            });
        }
        Ok(())
    }
}

fn reader(bytes: &[u8], format: ImageFormat) -> ImageReader<Cursor<&[u8]>> {
    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    // Size ceilings are enforced by the manager itself.
    reader.no_limits();
    reader
}
