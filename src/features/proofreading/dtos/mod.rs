mod proofread_dto;

pub use proofread_dto::*;
