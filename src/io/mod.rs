//! CSV boundary: input series reading and result table export.

pub mod export;
pub mod input;
