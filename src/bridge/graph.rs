// ============================================================================
// spark-observables - Graph Instances
// ============================================================================

use std::rc::Rc;

use crate::observable::{create_graph, Graph, GraphOptions};

use super::adapter::SignalsAdapter;

/// A new graph over the signals adapter.
///
/// Graphs do not share administrations: an object wrapped by two graphs
/// notifies each graph's observers separately.
pub fn signals_graph(options: GraphOptions) -> Graph {
    create_graph(Rc::new(SignalsAdapter), options)
}

thread_local! {
    static DEFAULT_GRAPH: Graph = signals_graph(GraphOptions::default());
}

/// This thread's default graph, created on first use and never replaced.
pub fn graph() -> Graph {
    DEFAULT_GRAPH.with(Graph::clone)
}
