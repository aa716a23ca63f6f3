use std::time::Duration;

/// Per-stage wall-clock durations for one `answer` call.
///
/// Stages that did not run stay `None`: an empty query records nothing, a
/// query without candidates records only retrieval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageTimings {
    pub retrieve: Option<Duration>,
    pub rerank: Option<Duration>,
    pub generate: Option<Duration>,
    pub num_candidates: Option<usize>,
    pub num_final_chunks: Option<usize>,
}

impl StageTimings {
    /// Retrieval plus re-ranking, once both have run.
    pub fn chunks_total(&self) -> Option<Duration> {
        Some(self.retrieve? + self.rerank?)
    }

    /// End to end, once the generator has run.
    pub fn total(&self) -> Option<Duration> {
        Some(self.chunks_total()? + self.generate?)
    }
}
