pub mod checker;
pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod ids;
pub mod model;
pub mod pipeline;
pub mod resolver;
pub mod sink;
