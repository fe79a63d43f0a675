mod slot;

pub use slot::{TimerHandle, TimerSlot};
