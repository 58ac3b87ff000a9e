pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod resample;

pub use buffer::AudioBuffer;
pub use decoder::{decode_file, probe_duration};
pub use encoder::{write_wav, WavFormat};
pub use resample::resample;
