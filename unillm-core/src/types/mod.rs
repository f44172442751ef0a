//! Core types used throughout the Unillm library

pub mod message;
pub mod model;
pub mod request;
pub mod result;
