//! # OCR Instance Manager Module
//!
//! Owns the service's single OCR engine and serializes access to it.
//!
//! An engine keeps the last loaded image as internal state, so a load and the
//! extraction that follows must run as one critical section. Otherwise one
//! request's text could be recognized from another request's bytes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::ocr_config::OcrConfig;
use crate::ocr_engine::{OcrEngine, TesseractEngine};
use crate::ocr_errors::OcrError;

/// Thread-safe owner of the shared OCR engine
///
/// # Lifecycle
///
/// - Created once at service start with a configured engine
/// - Shared by reference (`Arc<OcrInstanceManager>`) into every request
/// - Released once at shutdown; further `release()` calls are no-ops and
///   further recognitions fail with `OcrError::Unavailable`
///
/// # Thread Safety
///
/// The engine sits behind a `parking_lot::Mutex` held across
/// `load_image_bytes` + `extract_text`. The lock is blocking, so callers on
/// an async runtime should go through `tokio::task::spawn_blocking`.
pub struct OcrInstanceManager {
    engine: Mutex<Option<Box<dyn OcrEngine>>>,
    engine_name: &'static str,
    in_flight: AtomicUsize,
    released: AtomicBool,
}

/// Decrements the in-flight counter even if the engine call panics
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl OcrInstanceManager {
    /// Wrap an already configured engine
    pub fn new(engine: Box<dyn OcrEngine>) -> Self {
        let engine_name = engine.name();
        Self {
            engine: Mutex::new(Some(engine)),
            engine_name,
            in_flight: AtomicUsize::new(0),
            released: AtomicBool::new(false),
        }
    }

    /// Build the production Tesseract engine for `config`
    ///
    /// # Errors
    ///
    /// Returns `OcrError::Configuration` if the engine or its language models
    /// fail to initialize. This is fatal for service start.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        info!(
            "Creating OCR instance for languages: {} with model: {}",
            config.languages,
            config.model_type.tessdata_dir()
        );
        let engine = TesseractEngine::new(config)?;
        Ok(Self::new(Box::new(engine)))
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine_name
    }

    /// Whether the engine can still accept work
    pub fn is_available(&self) -> bool {
        !self.released.load(Ordering::SeqCst)
    }

    /// Number of recognitions currently waiting for or holding the engine
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Load `bytes` and extract their text as one uninterrupted engine session
    ///
    /// Waits at most `lock_wait` while another recognition holds the engine
    /// and fails with `OcrError::Timeout` after that, so a caller that has
    /// already given up never queues engine work behind a slow holder.
    pub fn recognize_bytes(&self, bytes: &[u8], lock_wait: Duration) -> Result<String, OcrError> {
        let _guard = InFlightGuard::enter(&self.in_flight);

        if !self.is_available() {
            return Err(OcrError::Unavailable("OCR engine has been released".to_string()));
        }

        let mut slot = self.engine.try_lock_for(lock_wait).ok_or_else(|| {
            warn!(
                engine = self.engine_name,
                wait_ms = lock_wait.as_millis() as u64,
                "OCR engine busy past the request deadline"
            );
            OcrError::Timeout(format!(
                "OCR engine still busy after waiting {}ms",
                lock_wait.as_millis()
            ))
        })?;
        let engine = slot
            .as_mut()
            .ok_or_else(|| OcrError::Unavailable("OCR engine has been released".to_string()))?;

        engine.load_image_bytes(bytes)?;
        engine.extract_text()
    }

    /// Release the engine, waiting up to `wait` for the current holder
    ///
    /// Returns `Ok(true)` when this call released the engine and `Ok(false)`
    /// when it was already released or the lock could not be obtained in
    /// time (the engine is then abandoned; new work is still refused).
    pub fn release_within(&self, wait: Duration) -> Result<bool, OcrError> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        match self.engine.try_lock_for(wait) {
            Some(mut slot) => self.release_slot(&mut slot),
            None => {
                warn!(
                    engine = self.engine_name,
                    wait_ms = wait.as_millis() as u64,
                    "OCR engine still busy, abandoning release"
                );
                Ok(false)
            }
        }
    }

    /// Release the engine, waiting as long as the current holder needs
    pub fn release(&self) -> Result<bool, OcrError> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        let mut slot = self.engine.lock();
        self.release_slot(&mut slot)
    }

    fn release_slot(&self, slot: &mut Option<Box<dyn OcrEngine>>) -> Result<bool, OcrError> {
        match slot.take() {
            Some(mut engine) => {
                engine.release()?;
                info!(engine = self.engine_name, "OCR engine released");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Stop accepting work, wait for in-flight recognitions, then release
    ///
    /// Waits at most `drain_timeout` for the in-flight count to reach zero and
    /// at most the same again for the engine lock.
    pub async fn drain_and_release(self: Arc<Self>, drain_timeout: Duration) -> Result<bool, OcrError> {
        let deadline = tokio::time::Instant::now() + drain_timeout;

        while self.in_flight() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        let pending = self.in_flight();
        if pending > 0 {
            warn!(pending, "OCR recognitions still running at shutdown");
        }

        tokio::task::spawn_blocking(move || self.release_within(drain_timeout))
            .await
            .map_err(|e| OcrError::Recognition(format!("engine release task failed: {}", e)))?
    }
}
