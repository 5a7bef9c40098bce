//! Infrastructure layer: wire format and transport implementations.

pub mod codec;
pub mod dto;
pub mod transport;
