//! Request and response bodies

pub mod cid;
