pub mod classifier;
pub mod labels;
pub mod resources;
