//! Domain data types.

pub mod config;
pub mod page;
pub mod scholarship;
pub mod search;
pub mod structured;
