use image::{DynamicImage, GrayImage};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Span};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::detection::candidates::CandidateDetector;
use crate::detection::ocr::{EngineFactory, OcrsEngineFactory, PlateRecognizer};
use crate::detection::preprocessing::Preprocessor;
use crate::detection::source;
use crate::error::Result;
use crate::models::{PipelineOutcome, RecognitionResult, Region};

/// Runs preprocessing, candidate detection and per-region recognition over one image
pub struct PlatePipeline {
    config: PipelineConfig,
    preprocessor: Preprocessor,
    detector: CandidateDetector,
    recognizer: PlateRecognizer,
}

impl PlatePipeline {
    pub fn new(config: PipelineConfig, factory: Box<dyn EngineFactory>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            preprocessor: Preprocessor::new(config.preprocess.clone()),
            detector: CandidateDetector::new(config.detector.clone()),
            recognizer: PlateRecognizer::from_factory(factory),
            config,
        })
    }

    /// Pipeline backed by `ocrs`, with models from `models_dir` or the default cache.
    /// Models are only loaded once a region needs recognizing.
    pub fn with_ocrs(config: PipelineConfig) -> Result<Self> {
        let factory = OcrsEngineFactory {
            models_dir: config.recognizer.models_dir.clone(),
        };
        Self::new(config, Box::new(factory))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn recognizer(&self) -> &PlateRecognizer {
        &self.recognizer
    }

    /// Load an image and run every stage on it.
    /// Load and preprocessing failures abort the run; region failures do not.
    pub fn run<P: AsRef<Path>>(&self, image_path: P) -> Result<PipelineOutcome> {
        let image_path = image_path.as_ref();
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id, path = %image_path.display());
        let _enter = span.enter();

        let img = source::load_path(image_path)?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        self.run_image(img)
    }

    /// Run every stage on an already decoded image
    pub fn run_image(&self, img: DynamicImage) -> Result<PipelineOutcome> {
        let edges = self.preprocessor.preprocess(&img)?;
        let regions = self.detector.detect(&edges);
        info!(candidates = regions.len(), "Candidates detected");

        if regions.is_empty() {
            return Ok(PipelineOutcome::default());
        }

        let source = Arc::new(img);
        let slots = self.recognize_all(&source, &regions);

        let mut outcome = PipelineOutcome::default();
        for (region, slot) in regions.into_iter().zip(slots) {
            let text = match slot {
                Some(text) => text,
                None => {
                    outcome.failed += 1;
                    String::new()
                }
            };
            outcome.results.push(RecognitionResult { region, text });
        }

        info!(
            results = outcome.results.len(),
            failed = outcome.failed,
            "Run complete"
        );
        Ok(outcome)
    }

    /// Edge map of an image file (for debugging)
    pub fn edge_map<P: AsRef<Path>>(&self, image_path: P) -> Result<GrayImage> {
        let img = source::load_path(image_path)?;
        self.preprocessor.preprocess(&img)
    }

    /// Candidate regions of an image file, without recognition (for debugging)
    pub fn candidates<P: AsRef<Path>>(&self, image_path: P) -> Result<Vec<Region>> {
        let edges = self.edge_map(image_path)?;
        Ok(self.detector.detect(&edges))
    }

    /// Recognize every region on a bounded worker pool.
    /// Slot `i` holds the text for `regions[i]`, or None if it failed or timed out.
    fn recognize_all(&self, source: &Arc<DynamicImage>, regions: &[Region]) -> Vec<Option<String>> {
        let workers = self.config.recognizer.worker_count().clamp(1, regions.len());
        let timeout = self.config.recognizer.region_timeout();
        debug!(workers, regions = regions.len(), "Recognizing regions");

        let (job_tx, job_rx) = mpsc::channel::<(usize, Region)>();
        for job in regions.iter().copied().enumerate() {
            // Receiver is alive until the end of this function
            let _ = job_tx.send(job);
        }
        drop(job_tx);
        let job_rx = Mutex::new(job_rx);

        let (result_tx, result_rx) = mpsc::channel::<(usize, Option<String>)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let result_tx = result_tx.clone();
                let job_rx = &job_rx;
                let span = Span::current();
                scope.spawn(move || {
                    let _enter = span.enter();
                    loop {
                        let job = job_rx
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .recv();
                        let Ok((index, region)) = job else { break };

                        let text = recognize_with_timeout(&self.recognizer, source, index, region, timeout);
                        if result_tx.send((index, text)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut slots = vec![None; regions.len()];
        for (index, text) in result_rx {
            slots[index] = text;
        }
        slots
    }
}

/// Recognize one region on its own thread, giving up after `timeout`.
/// A timed out call keeps running detached; its engine is returned to the pool when it ends.
fn recognize_with_timeout(
    recognizer: &PlateRecognizer,
    source: &Arc<DynamicImage>,
    index: usize,
    region: Region,
    timeout: Duration,
) -> Option<String> {
    let (tx, rx) = mpsc::channel();
    let recognizer = recognizer.clone();
    let source = Arc::clone(source);

    let spawned = thread::Builder::new()
        .name(format!("plate-ocr-{}", index))
        .spawn(move || {
            let _ = tx.send(recognizer.try_recognize(&source, &region));
        });
    if let Err(e) = spawned {
        warn!(index, error = %e, "Failed to spawn recognition thread");
        return None;
    }

    match rx.recv_timeout(timeout) {
        Ok(Ok(text)) => {
            debug!(index, ?region, %text, "Region recognized");
            Some(text)
        }
        Ok(Err(e)) => {
            warn!(index, ?region, error = %e, "Recognition failed");
            None
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!(index, ?region, timeout_ms = timeout.as_millis() as u64, "Recognition timed out");
            None
        }
        Err(RecvTimeoutError::Disconnected) => {
            warn!(index, ?region, "Recognition thread exited without a result");
            None
        }
    }
}
