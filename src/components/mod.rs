pub mod pipeline_graph;
