//! Frame model and converter functions for the AMQP 0-9-1 wire protocol.
//!
//! All the data types live in the `frame` module, the `codec` module
//! implements the encoding and the decoding on top of `tokio-util`.
//! Malformed input surfaces as `std::io::Error` from the decoder, which
//! tears down the framed transport the way any other I/O failure would.
pub mod codec;
pub mod frame;


#[macro_use]
extern crate bitflags;
