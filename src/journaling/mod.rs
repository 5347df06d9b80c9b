mod checkpoint;

pub use checkpoint::{CheckpointReason, CheckpointStatus, Checkpointer};
