use serde::Serialize;

/// Size counters for a prepared index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub locations: usize,
    pub terms: usize,
    pub nodes: usize,
    pub max_depth: usize,
}

impl IndexStats {
    /// Emit the counters through the logging layer, one event per index.
    pub fn log(&self) {
        tracing::info!(
            documents = self.documents,
            locations = self.locations,
            terms = self.terms,
            nodes = self.nodes,
            max_depth = self.max_depth,
            "index statistics"
        );
    }
}
