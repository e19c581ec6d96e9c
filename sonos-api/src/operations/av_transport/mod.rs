//! AVTransport service operations
//!
//! Read-only queries for the current track and transport state.

mod get_position_info;
mod get_transport_info;

pub use get_position_info::{GetPositionInfoOperation, GetPositionInfoRequest, GetPositionInfoResponse};
pub use get_transport_info::{GetTransportInfoOperation, GetTransportInfoRequest, GetTransportInfoResponse};
