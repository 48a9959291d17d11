//! Import pipeline and its result types.

pub mod aggregator;
pub mod classifier;
pub mod pipeline;
pub mod result;

pub use aggregator::Aggregator;
pub use classifier::{classify, Structure};
pub use pipeline::{CancelToken, Detection, Importer};
pub use result::{ImportError, ImportResult, ImportWarning};
