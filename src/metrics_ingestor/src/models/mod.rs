//! Provider-neutral shapes returned by the upstream clients.

pub mod radar;
pub mod registry;
