use image::{DynamicImage, ImageFormat};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::{PlateError, Result};
use crate::models::Region;

/// A text recognition session. One checkout is used by one region at a time.
pub trait RecognitionEngine: Send {
    /// Read text from a PNG-encoded crop
    fn recognize(&mut self, encoded_png: &[u8]) -> Result<String>;
}

/// Creates recognition engines for the pool
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn RecognitionEngine>>;
}

/// Reusable engines, checked out per region and returned on drop
pub struct EnginePool {
    factory: Box<dyn EngineFactory>,
    idle: Mutex<Vec<Box<dyn RecognitionEngine>>>,
}

impl EnginePool {
    pub fn new(factory: Box<dyn EngineFactory>) -> Self {
        Self {
            factory,
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Take an idle engine, or create one if none is idle
    pub fn checkout(self: &Arc<Self>) -> Result<PooledEngine> {
        let idle = self
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop();

        let engine = match idle {
            Some(engine) => engine,
            None => {
                debug!("Creating recognition engine");
                self.factory.create()?
            }
        };

        Ok(PooledEngine {
            engine: Some(engine),
            pool: Arc::clone(self),
        })
    }

    pub fn idle_count(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn give_back(&self, engine: Box<dyn RecognitionEngine>) {
        self.idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(engine);
    }
}

/// Checked-out engine. Returns to its pool when dropped unless discarded.
pub struct PooledEngine {
    engine: Option<Box<dyn RecognitionEngine>>,
    pool: Arc<EnginePool>,
}

impl PooledEngine {
    pub fn recognize(&mut self, encoded_png: &[u8]) -> Result<String> {
        match self.engine.as_mut() {
            Some(engine) => engine.recognize(encoded_png),
            None => Err(PlateError::Recognition("engine was discarded".into())),
        }
    }

    /// Drop the engine instead of returning it to the pool
    pub fn discard(mut self) {
        self.engine = None;
    }
}

impl Drop for PooledEngine {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            self.pool.give_back(engine);
        }
    }
}

/// `ocrs` engine loaded with the Latin detection and recognition models
pub struct OcrsEngine {
    engine: OcrEngine,
}

impl RecognitionEngine for OcrsEngine {
    fn recognize(&mut self, encoded_png: &[u8]) -> Result<String> {
        let img = image::load_from_memory_with_format(encoded_png, ImageFormat::Png)
            .map_err(|e| PlateError::Recognition(format!("unreadable crop: {}", e)))?
            .into_rgb8();

        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| PlateError::Recognition(format!("{:?}", e)))?;
        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| PlateError::Recognition(e.to_string()))?;

        self.engine
            .get_text(&ocr_input)
            .map_err(|e| PlateError::Recognition(e.to_string()))
    }
}

/// Loads `ocrs` models from a model directory.
/// Without one, the standard `ocrs` cache is looked up when the first engine is created.
#[derive(Debug, Clone, Default)]
pub struct OcrsEngineFactory {
    pub models_dir: Option<PathBuf>,
}

impl OcrsEngineFactory {
    pub fn new<P: AsRef<Path>>(models_dir: P) -> Self {
        Self {
            models_dir: Some(models_dir.as_ref().to_path_buf()),
        }
    }

    /// Model directory to load from
    pub fn resolve_models_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.models_dir {
            return Ok(dir.clone());
        }
        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| PlateError::Recognition("cannot locate home directory for OCR models".into()))?;
        Ok(Path::new(&home_dir).join(".cache/ocrs"))
    }
}

impl EngineFactory for OcrsEngineFactory {
    fn create(&self) -> Result<Box<dyn RecognitionEngine>> {
        let models_dir = self.resolve_models_dir()?;
        let detection_model_path = models_dir.join("text-detection.rten");
        let recognition_model_path = models_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            return Err(PlateError::Recognition(format!(
                "OCR models not found. Expected:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            )));
        }

        let detection_model = Model::load_file(&detection_model_path)
            .map_err(|e| PlateError::Recognition(format!("detection model: {}", e)))?;
        let recognition_model = Model::load_file(&recognition_model_path)
            .map_err(|e| PlateError::Recognition(format!("recognition model: {}", e)))?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| PlateError::Recognition(e.to_string()))?;

        Ok(Box::new(OcrsEngine { engine }))
    }
}

/// Strip framing artifacts from an engine transcription: outer whitespace and
/// control characters go, interior line breaks become single spaces.
pub fn clean_transcription(raw: &str) -> String {
    raw.split(|c: char| c.is_control() || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Encode a crop as PNG bytes for the engine
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Reads the text inside one region of a source image
#[derive(Clone)]
pub struct PlateRecognizer {
    pool: Arc<EnginePool>,
}

impl PlateRecognizer {
    pub fn new(pool: Arc<EnginePool>) -> Self {
        Self { pool }
    }

    pub fn from_factory(factory: Box<dyn EngineFactory>) -> Self {
        Self::new(Arc::new(EnginePool::new(factory)))
    }

    pub fn pool(&self) -> &Arc<EnginePool> {
        &self.pool
    }

    /// Crop, encode and transcribe. Any failure is returned to the caller.
    pub fn try_recognize(&self, source: &DynamicImage, region: &Region) -> Result<String> {
        let crop = region.crop(source).ok_or_else(|| {
            PlateError::Recognition(format!(
                "region {:?} outside {}x{} image",
                region,
                source.width(),
                source.height()
            ))
        })?;
        let encoded = encode_png(&crop)?;

        let mut engine = self.pool.checkout()?;
        match engine.recognize(&encoded) {
            Ok(raw) => Ok(clean_transcription(&raw)),
            Err(e) => {
                // A failing session may be left in a bad state
                engine.discard();
                Err(e)
            }
        }
    }

    /// Best-effort transcription; failures yield an empty string
    pub fn recognize(&self, source: &DynamicImage, region: &Region) -> String {
        match self.try_recognize(source, region) {
            Ok(text) => text,
            Err(e) => {
                warn!(?region, error = %e, "Recognition failed");
                String::new()
            }
        }
    }
}
