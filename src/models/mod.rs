//! Plain data types passed between the parser, the blame adapter and the
//! renderer.
//!
//! - `frame`: StackFrame, FrameFormat
//! - `blame`: BlameLine for per-line author attribution

pub mod blame;
pub mod frame;

pub use blame::*;
pub use frame::*;
