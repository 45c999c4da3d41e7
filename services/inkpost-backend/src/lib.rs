pub mod application;
pub mod authentication;
pub mod domain;
pub mod index;
pub mod review;
pub mod services;
pub mod telemetry;
