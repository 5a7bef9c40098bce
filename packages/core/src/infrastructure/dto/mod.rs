//! Data Transfer Objects (DTOs) for the frame wire format.

pub mod conversion;
pub mod frame;
