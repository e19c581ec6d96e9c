//! Sonos API operations organized by service

pub mod av_transport;

pub use av_transport::{GetPositionInfoOperation, GetTransportInfoOperation};
