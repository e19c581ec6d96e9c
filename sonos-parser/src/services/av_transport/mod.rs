//! AVTransport service decoding
//!
//! ```rust,ignore
//! use sonos_parser::services::av_transport::AVTransportEvent;
//!
//! let event = AVTransportEvent::from_xml(notify_body)?;
//! println!("{} {}", event.transport_state, event.track.title);
//! ```

pub mod event;

pub use event::AVTransportEvent;
