//! Supabase remote store for check-ins.
//!
//! Applies queued check-in operations through the Supabase PostgREST API and
//! maps HTTP failures onto the outbox's retry classification.

mod client;
mod error;

pub use client::{classify_status, SupabaseCheckinStore, CHECKINS_TABLE};
pub use error::{SupabaseRemoteError, SupabaseRemoteResult};
