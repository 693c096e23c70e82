//! Request plumbing shared by the providers: retry with backoff and the
//! optional raw-response archive.

pub mod archive;
pub mod retry;
