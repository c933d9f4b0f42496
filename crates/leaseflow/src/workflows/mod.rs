pub mod application;
pub mod contract;
pub mod platform;
