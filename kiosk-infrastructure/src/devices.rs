pub mod ffmpeg_camera;
pub mod serial_link;

pub use ffmpeg_camera::*;
pub use serial_link::*;
