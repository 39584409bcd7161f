//! Region blur editor core.
//!
//! Load an image, select rectangles by dragging over it, blur them, and export
//! the result as PNG. Everything here runs without a UI host; the desktop
//! front end lives in the binary.

pub mod buffer;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod input;
pub mod selection;
pub mod session;

pub use buffer::{ImageHandle, ImageSource};
pub use compositor::{BlurFilter, BlurOutcome, BoxBlur, GaussianBlur, IdentityBlur};
pub use config::EditorConfig;
pub use error::{ArmError, ConfigError, ExportError, LoadError};
pub use session::{EditorSession, SessionEvent};
