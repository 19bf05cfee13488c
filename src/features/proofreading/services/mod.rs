mod proofreading_service;

pub use proofreading_service::ProofreadingService;
