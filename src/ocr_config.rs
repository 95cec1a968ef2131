//! # OCR Configuration Module
//!
//! This module defines configuration structures for the OCR engine:
//! language models, Tesseract model flavour, page segmentation and the
//! per-request recognition deadline.

use std::env;

use crate::errors::{AppError, AppResult};

// Constants for OCR configuration
pub const DEFAULT_LANGUAGES: &str = "jpn+eng";
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;
pub const MAX_OPERATION_TIMEOUT_SECS: u64 = 300;

/// Page Segmentation Mode for Tesseract OCR
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSegMode {
    /// Automatic page segmentation with OSD
    AutoOsd = 1,
    /// Fully automatic page segmentation
    #[default]
    Auto = 3,
    /// Assume a single column of text
    SingleColumn = 4,
    /// Assume a single uniform block of vertically aligned text
    SingleBlockVert = 5,
    /// Assume a single uniform block of text
    SingleBlock = 6,
    /// Treat the image as a single text line
    SingleLine = 7,
    /// Treat the image as a single word
    SingleWord = 8,
    /// Find as much text as possible in no particular order
    SparseText = 11,
}

impl PageSegMode {
    /// Convert PSM mode to string value for Tesseract
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSegMode::AutoOsd => "1",
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlockVert => "5",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SingleLine => "7",
            PageSegMode::SingleWord => "8",
            PageSegMode::SparseText => "11",
        }
    }

    /// Parse the numeric Tesseract value, as accepted by `OCR_PSM`
    pub fn from_value(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(PageSegMode::AutoOsd),
            "3" => Some(PageSegMode::Auto),
            "4" => Some(PageSegMode::SingleColumn),
            "5" => Some(PageSegMode::SingleBlockVert),
            "6" => Some(PageSegMode::SingleBlock),
            "7" => Some(PageSegMode::SingleLine),
            "8" => Some(PageSegMode::SingleWord),
            "11" => Some(PageSegMode::SparseText),
            _ => None,
        }
    }
}

/// Tesseract model type for different accuracy/speed trade-offs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ModelType {
    /// Fast model (tessdata_fast) - faster processing, lower accuracy
    #[default]
    Fast,
    /// Best model (tessdata_best) - slower processing, higher accuracy
    Best,
}

impl ModelType {
    /// Get the tessdata directory name for this model type
    pub fn tessdata_dir(&self) -> &'static str {
        match self {
            ModelType::Fast => "tessdata_fast",
            ModelType::Best => "tessdata_best",
        }
    }

    /// Common installation directories for this model flavour, most specific first
    pub fn candidate_paths(&self) -> &'static [&'static str] {
        match self {
            ModelType::Fast => &[
                "/usr/share/tesseract-ocr/5/tessdata_fast",
                "/usr/share/tesseract-ocr/4.00/tessdata_fast",
                "/usr/share/tessdata_fast",
                "/usr/local/share/tessdata_fast",
            ],
            ModelType::Best => &[
                "/usr/share/tesseract-ocr/5/tessdata_best",
                "/usr/share/tesseract-ocr/4.00/tessdata_best",
                "/usr/share/tessdata_best",
                "/usr/local/share/tessdata_best",
            ],
        }
    }

    /// Parse `fast` / `best` (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "fast" => Some(ModelType::Fast),
            "best" => Some(ModelType::Best),
            _ => None,
        }
    }
}

/// Configuration structure for OCR processing
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// OCR language codes joined with `+` (e.g., "jpn+eng")
    pub languages: String,
    /// Tesseract model type (Fast vs Best accuracy)
    pub model_type: ModelType,
    /// Default page segmentation mode for OCR
    pub psm_mode: PageSegMode,
    /// Explicit tessdata directory; probed from `model_type` when unset
    pub tessdata_path: Option<String>,
    /// Deadline for a single recognition call in seconds
    pub operation_timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.to_string(),
            model_type: ModelType::default(),
            psm_mode: PageSegMode::default(),
            tessdata_path: None,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        }
    }
}

impl OcrConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(languages) = env::var("OCR_LANGUAGES") {
            config.languages = languages;
        }
        if let Ok(model) = env::var("OCR_MODEL_TYPE") {
            config.model_type = ModelType::from_name(&model).ok_or_else(|| {
                AppError::Config(format!("OCR_MODEL_TYPE must be 'fast' or 'best', got '{}'", model))
            })?;
        }
        if let Ok(psm) = env::var("OCR_PSM") {
            config.psm_mode = PageSegMode::from_value(&psm).ok_or_else(|| {
                AppError::Config(format!("OCR_PSM value '{}' is not a supported page segmentation mode", psm))
            })?;
        }
        config.tessdata_path = env::var("TESSDATA_PATH").ok().filter(|p| !p.trim().is_empty());
        config.operation_timeout_secs = env::var("OCR_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_OPERATION_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| AppError::Config("OCR_TIMEOUT_SECS must be a valid number of seconds".to_string()))?;

        Ok(config)
    }

    /// Individual language codes in configuration order
    pub fn language_list(&self) -> Vec<&str> {
        self.languages
            .split('+')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .collect()
    }

    /// Validate OCR configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(AppError::Config("languages cannot be empty".to_string()));
        }

        for code in self.languages.split('+') {
            let code = code.trim();
            if code.is_empty() {
                return Err(AppError::Config(format!(
                    "languages '{}' contains an empty language code",
                    self.languages
                )));
            }
            if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(AppError::Config(format!(
                    "language code '{}' must only contain ASCII letters, digits or '_'",
                    code
                )));
            }
        }

        if self.operation_timeout_secs == 0 {
            return Err(AppError::Config(
                "operation_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.operation_timeout_secs > MAX_OPERATION_TIMEOUT_SECS {
            return Err(AppError::Config(format!(
                "operation_timeout_secs cannot be greater than {} seconds",
                MAX_OPERATION_TIMEOUT_SECS
            )));
        }

        Ok(())
    }
}
