mod catalog;
mod component;
mod layout;
mod picking;
mod render;
mod render3d;
mod scene;
mod state;
mod types;
mod viewport;

pub use component::{GraphSession, PipelineGraph};
pub use types::{RunRecord, StatusReport, ViewMode};
