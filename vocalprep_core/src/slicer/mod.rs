//! Silence-based segmentation of long recordings into utterance-length chunks.
//!
//! The signal is analysed on a fixed hop grid: every hop gets one RMS value, frames below
//! the threshold are silent, and sufficiently long silent runs become cut regions. Chunks
//! are then copied out of the original (possibly multi-channel) buffer.

mod config;
mod rms;
mod segmenter;

pub use config::SlicerConfig;
pub use segmenter::Slicer;
