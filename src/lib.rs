pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod model;
pub mod session;
pub mod storage;
