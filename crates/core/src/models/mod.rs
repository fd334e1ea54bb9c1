pub mod dividend;
pub mod fx;
pub mod holding;
pub mod period;
pub mod projection;
pub mod report;
pub mod settings;
