pub mod access_tokens;
pub mod blob_store;
pub mod identity;
pub mod photo_client;
pub mod resolver;
pub mod s3_store;
pub mod upload_service;
