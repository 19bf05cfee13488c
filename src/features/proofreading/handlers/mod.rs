mod proofread_handler;

pub use proofread_handler::*;
