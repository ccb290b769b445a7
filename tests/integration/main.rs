//! Integration tests against a mock sandbox HTTP server

mod batch;
mod client;
mod mock_server;
