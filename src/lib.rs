//! # OCR Binarizer
//!
//! An HTTP service that turns images into black-and-white versions of
//! themselves and reads the text in them with Tesseract.

pub mod api;
pub mod codec;
pub mod config;
pub mod errors;
pub mod instance_manager;
pub mod observability;
pub mod observability_config;
pub mod ocr;
pub mod ocr_config;
pub mod ocr_engine;
pub mod ocr_errors;
pub mod preprocessing;

// Re-export types for easier access
pub use instance_manager::OcrInstanceManager;
pub use ocr_engine::{OcrEngine, TesseractEngine};
pub use ocr_errors::OcrError;
pub use preprocessing::{preprocess_image, Threshold};
