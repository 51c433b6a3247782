// Router web API client
//
// Hand-written client for the `/api/v1` JSON endpoints served by the
// router's management UI, wrapped in the `{ error, message, data }` envelope.

pub mod auth;
pub mod client;
pub mod hosts;
pub mod models;

pub use client::RouterClient;
