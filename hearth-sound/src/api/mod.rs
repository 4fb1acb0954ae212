//! HTTP control surface for the soundscape engine

pub mod handlers;
pub mod server;

pub use server::{build_router, completion_counter, AppContext};
