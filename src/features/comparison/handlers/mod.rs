mod comparison_handler;

pub use comparison_handler::*;
