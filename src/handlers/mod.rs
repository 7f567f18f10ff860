//! Handler implementations

pub mod file;
pub mod size_rotating;
pub mod stream;
pub mod time_rotating;

mod rotation;

pub use file::{FileHandler, FileSink};
pub use size_rotating::SizeRotateFileHandler;
pub use stream::StreamHandler;
pub use time_rotating::{RotateInterval, TimeRotateFileHandler};

pub use crate::core::Handler;
