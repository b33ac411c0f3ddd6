//! Request handlers

pub mod cid;
pub mod health;
pub mod mock_insurer;
pub mod providers;
