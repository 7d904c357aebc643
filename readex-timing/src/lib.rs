pub mod clock;
pub mod frame;

pub use clock::{ManualClock, Timer, WallClock};
pub use frame::{FrameStats, FrameTimer};
