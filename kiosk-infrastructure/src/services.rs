pub mod gemini_classifier;
pub mod qr_renderer;

pub use gemini_classifier::*;
pub use qr_renderer::*;
