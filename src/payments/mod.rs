pub mod backend;
pub mod confirmer;
pub mod confirmers;
pub mod error;
pub mod order;
pub mod registry;
pub mod types;
pub mod utils;
pub mod verifier;
