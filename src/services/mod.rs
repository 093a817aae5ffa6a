//! # Services
//!
//! Clients for the external systems the bot talks to.

pub mod n8n;
