mod grammar_check_client;

pub use grammar_check_client::{GrammarCheckClient, ProofreadOutcome, Proofreader};
