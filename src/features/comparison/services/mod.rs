mod comparison_service;
pub mod renderer;

pub use comparison_service::ComparisonService;
