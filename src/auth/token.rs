//! Access/refresh token pair, its builder, and persistence through the shared cache.

pub mod cache;
pub mod info;
pub mod record;
pub mod secret;
