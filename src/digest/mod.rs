pub mod classifier;
pub mod enricher;
pub mod fetcher;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::{Classification, Classifier, DiscardReason};
pub use enricher::Enricher;
pub use fetcher::Fetcher;
pub use pipeline::{Pipeline, PipelineOutput, RunStats};
