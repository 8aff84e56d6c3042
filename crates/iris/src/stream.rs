//! The line-delimited event stream spoken between the relay and its clients
//!
//! Each frame is `data: <json>\n\n` carrying either a content delta or an error; a successful
//! stream ends with `data: [DONE]\n\n`. An error frame is always the last frame of its stream.
pub mod consumer;
pub mod frame;
pub mod line_buffer;

pub use consumer::{consume, ConsumerOutcome, StreamConsumer, TurnUpdate};
pub use frame::{parse_line, Frame, ParsedLine, StreamEvent, DATA_PREFIX, DONE_SENTINEL};
pub use line_buffer::LineBuffer;
