mod buffering;
mod decoder;

pub use buffering::CircularLineBuffer;
pub use decoder::{parse_chat_event_stream, ChatEventStream, SseFrame, SseFrameDecoder};
