pub mod arrivals;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod models;
pub mod operators;
pub mod optimizer;
pub mod output;
pub mod placement;
pub mod queue;
pub mod rates;
pub mod state;
