pub mod catalog;
pub mod config;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod runtime;
pub mod source;
pub mod store;
