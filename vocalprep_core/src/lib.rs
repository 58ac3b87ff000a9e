pub mod audio;
pub mod error;
pub mod slicer;

pub use audio::{AudioBuffer, WavFormat};
pub use error::SlicerError;
pub use slicer::{Slicer, SlicerConfig};
