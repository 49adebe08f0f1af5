//! ColorMyPage - browse, favorite and share printable coloring pages
//!
//! This library provides the core functionality behind the ColorMyPage server.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod views;
