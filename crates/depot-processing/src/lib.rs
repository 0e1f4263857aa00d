//! Depot Processing Library
//!
//! Content inspection and derivative production:
//!
//! - [`sniff`]: MIME detection from magic bytes
//! - [`characterize`]: technical metadata extraction and content-kind classification
//! - [`dispatch`]: the content-kind to follow-on job table
//! - [`derivatives`]: thumbnails and transcodes via the `image` crate, `ffmpeg` and `pdftoppm`

pub mod characterize;
pub mod derivatives;
pub mod dispatch;
pub mod document;
pub mod probe;
pub mod sniff;
pub mod traits;

// Re-export commonly used types
pub use characterize::Characterizer;
pub use derivatives::{DerivativeError, MediaDerivativeGenerator};
pub use dispatch::derivative_jobs;
pub use probe::FfprobeProbe;
pub use sniff::sniff_mime;
pub use traits::{Derivative, DerivativeGenerator, MediaProbe, MediaProbeInfo};
