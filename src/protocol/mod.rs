//! # Line Protocol
//!
//! IRC-style records (`:prefix COMMAND param param :trailing`) and the
//! CRLF line codec that frames them on a socket.
//!
//! The rest of the crate only sees [`Message`] values: inbound tasks read
//! them through a `FramedRead`, connections write them through a
//! `FramedWrite`.

pub mod codec;
pub mod message;

pub use codec::{CodecError, LineCodec};
pub use message::{Command, Message, ParseError};
