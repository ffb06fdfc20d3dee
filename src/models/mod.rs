pub mod category;
pub mod classify_types;
