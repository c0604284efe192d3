pub mod config;
pub mod error;
pub mod estimator;
pub mod export;
pub mod mask;
pub mod optimizer;
pub mod preview;
pub mod sequence;
