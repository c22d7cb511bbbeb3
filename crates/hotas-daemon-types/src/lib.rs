//! Wire contract between `hotasd` and its clients.
//!
//! Every frame on the daemon socket is a single JSON document terminated by
//! a newline. After accepting a connection the daemon sends a [`Banner`];
//! afterwards each [`Request`] is answered by exactly one [`Response`], in
//! order. The [`ErrorCode`] names are the stable part of the contract that
//! client binaries match on.

pub mod client;
mod device;
mod frame;
mod protocol;
mod request;
mod response;

pub use device::{
    BrightnessTarget, ClockFormat, DateFormat, LedId, LedState, MAX_BRIGHTNESS, MFD_LINE_WIDTH,
    MFD_LINES, UnknownLed,
};
pub use frame::{FrameError, FrameReader, MAX_FRAME_BYTES, decode_frame, write_frame};
pub use protocol::{Banner, DAEMON_NAME, PROTOCOL_VERSION};
pub use request::{Request, commands};
pub use response::{ErrorCode, Response};
