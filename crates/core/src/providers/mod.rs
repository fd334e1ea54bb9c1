pub mod registry;
pub mod traits;

// Source implementations
pub mod alphavantage;
pub mod frankfurter;
pub mod local_file;
pub mod yahoo_finance;
