//! FRA atlas: a terminal map of India's tribal-welfare and forest-rights
//! data. The `engine` module is the framework-independent core; `app`,
//! `ui` and `map` are the terminal shell around it.

pub mod app;
pub mod braille;
pub mod data;
pub mod engine;
pub mod geo;
pub mod hash;
pub mod map;
pub mod ui;
