// src/lib.rs
pub mod classifier;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod images;
pub mod models;
pub mod repository;
pub mod store;
pub mod theme;
pub mod tui;
pub mod views;
