mod memory;

pub use memory::{
    InMemoryBoardRepository, InMemoryPostRepository, RecordingNotificationSink,
    TracingNotificationSink,
};
