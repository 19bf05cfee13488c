pub mod clients;
pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use clients::{GrammarCheckClient, Proofreader};
pub use routes::routes;
pub use services::ProofreadingService;
