//! Types shared by the registration server, its client and the CLIs.

pub mod domain;
pub mod error;
pub mod protocol;
pub mod registration;
