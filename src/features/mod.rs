pub mod auth;
pub mod comparison;
pub mod proofreading;
pub mod uploads;
