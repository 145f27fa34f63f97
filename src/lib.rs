pub mod app;
pub mod browser;
pub mod classifier;
pub mod components;
pub mod config;
pub mod error;
pub mod model;
pub mod pages;
pub mod presentation;
pub mod telemetry;
pub mod workflow;
