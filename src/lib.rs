pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod toll;

pub use config::{DetectorConfig, PipelineConfig, PreprocessConfig, RecognizerConfig};
pub use detection::candidates::CandidateDetector;
pub use detection::ocr::{EngineFactory, EnginePool, OcrsEngineFactory, PlateRecognizer, RecognitionEngine};
pub use detection::preprocessing::Preprocessor;
pub use error::{PlateError, Result};
pub use models::{PipelineOutcome, RecognitionResult, Region};
pub use pipeline::PlatePipeline;
