pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod evaluation;
pub mod normalize;
pub mod pdf;
pub mod report;
pub mod service;
pub mod upload;
pub mod util;
