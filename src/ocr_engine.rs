//! # OCR Engine Adapter Module
//!
//! The boundary with the external recognition engine. The core only relies on
//! the [`OcrEngine`] trait; [`TesseractEngine`] is the production
//! implementation on top of `leptess`.
//!
//! Engines are stateful (an image is loaded, then text is extracted from it)
//! and are not assumed to be reentrant. Callers must serialize access; see
//! [`crate::instance_manager::OcrInstanceManager`].

use leptess::LepTess;
use tracing::{debug, info};

use crate::ocr_config::{ModelType, OcrConfig, PageSegMode};
use crate::ocr_errors::OcrError;

/// Capabilities the recognition pipeline needs from an OCR engine
pub trait OcrEngine: Send {
    /// Engine identifier used in logs
    fn name(&self) -> &'static str;

    /// Load the given language models; several may be active at once
    fn configure_languages(&mut self, languages: &[&str]) -> Result<(), OcrError>;

    /// Hand encoded image bytes to the engine
    fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), OcrError>;

    /// Recognize text in the most recently loaded image
    fn extract_text(&mut self) -> Result<String, OcrError>;

    /// Free the engine's native resources; later calls fail until reconfigured
    fn release(&mut self) -> Result<(), OcrError>;
}

/// Tesseract engine backed by `leptess`
pub struct TesseractEngine {
    tess: Option<LepTess>,
    tessdata_path: Option<String>,
    psm_mode: PageSegMode,
}

impl TesseractEngine {
    /// Create an engine and load the configured language models
    ///
    /// # Errors
    ///
    /// Returns `OcrError::Configuration` when Tesseract cannot be initialized
    /// with the requested languages (e.g., missing `jpn.traineddata`).
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let tessdata_path = config
            .tessdata_path
            .clone()
            .or_else(|| Self::find_tessdata_path(config.model_type));

        let mut engine = Self {
            tess: None,
            tessdata_path,
            psm_mode: config.psm_mode,
        };
        engine.configure_languages(&config.language_list())?;
        Ok(engine)
    }

    /// Attempts to find the tessdata directory for the specified model type.
    /// Falls back to Tesseract's compiled-in default when none exists.
    fn find_tessdata_path(model_type: ModelType) -> Option<String> {
        for path in model_type.candidate_paths() {
            if std::path::Path::new(path).exists() {
                info!("Using tessdata path: {}", path);
                return Some(path.to_string());
            }
        }

        info!(
            "No specific tessdata path found for model type {:?}, using default",
            model_type
        );
        None
    }

    fn tess_mut(&mut self) -> Result<&mut LepTess, OcrError> {
        self.tess.as_mut().ok_or_else(|| {
            OcrError::Recognition("no language models are configured".to_string())
        })
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn configure_languages(&mut self, languages: &[&str]) -> Result<(), OcrError> {
        if languages.is_empty() {
            return Err(OcrError::Configuration(
                "at least one language must be configured".to_string(),
            ));
        }
        let joined = languages.join("+");

        let mut tess = LepTess::new(self.tessdata_path.as_deref(), &joined).map_err(|e| {
            OcrError::Configuration(format!(
                "failed to initialize Tesseract with languages '{}': {}",
                joined, e
            ))
        })?;

        tess.set_variable(leptess::Variable::TesseditPagesegMode, self.psm_mode.as_str())
            .map_err(|e| OcrError::Configuration(format!("failed to set PSM mode: {}", e)))?;

        info!(
            languages = %joined,
            psm = self.psm_mode.as_str(),
            tessdata = ?self.tessdata_path,
            "Tesseract OCR initialized"
        );
        self.tess = Some(tess);
        Ok(())
    }

    fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), OcrError> {
        self.tess_mut()?.set_image_from_mem(bytes).map_err(|e| {
            OcrError::Recognition(format!("failed to load image for OCR: {}", e))
        })
    }

    fn extract_text(&mut self) -> Result<String, OcrError> {
        self.tess_mut()?.get_utf8_text().map_err(|e| {
            OcrError::Recognition(format!("failed to extract text from image: {}", e))
        })
    }

    fn release(&mut self) -> Result<(), OcrError> {
        if self.tess.take().is_some() {
            debug!("Tesseract instance dropped");
        }
        Ok(())
    }
}
