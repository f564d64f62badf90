//! actix-web integration.

pub mod dev;
