#![forbid(unsafe_code)]

pub mod clock;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod exchange_service;
pub mod lifecycle;
pub mod models;
pub mod reading_service;
pub mod repository;
pub mod round_scheduler;
pub mod round_service;

#[cfg(test)]
pub(crate) mod testing;
