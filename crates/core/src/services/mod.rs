pub mod aggregation_service;
pub mod currency_service;
pub mod portfolio_loader;
pub mod projection_service;
pub mod report_service;
