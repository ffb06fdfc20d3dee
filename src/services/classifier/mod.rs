pub mod controller;
pub mod engine;
pub mod inference;
pub mod model_manager;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;
