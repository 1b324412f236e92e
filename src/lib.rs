pub mod chain;
pub mod checkpoint;
pub mod config;
pub mod enricher;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod holders;
pub mod models;
pub mod output_worker;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod reorg;
pub mod rpc;
pub mod scheduler;
