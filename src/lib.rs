//! Media ingestion service for property listings.
//!
//! Accepts images and videos over HTTP, names them with collision-resistant
//! keys, writes them to S3-compatible object storage with public visibility
//! and hands back stable public URLs (CDN-fronted when configured).

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
