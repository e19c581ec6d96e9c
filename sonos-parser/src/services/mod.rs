//! Service-specific decoders organized by UPnP service type
//!
//! - [`av_transport`]: AVTransport NOTIFY events

pub mod av_transport;
