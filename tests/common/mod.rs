mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from platescan for tests
pub use platescan::{
    EngineFactory, PipelineConfig, PipelineOutcome, PlateError, PlatePipeline, RecognitionEngine,
    Region,
};
