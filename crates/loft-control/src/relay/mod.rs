//! Live log relay.
//!
//! The build step publishes each output line to `logs:<project>` on the
//! bus; this module subscribes once with the pattern `logs:*` and fans each
//! line out to the observers registered for that exact topic. Delivery is
//! best-effort and at-most-once per observer: nothing is persisted, and an
//! observer joining after a line was published never sees it.

pub mod bus;
pub mod rooms;
pub mod ws;

pub use rooms::{FanOut, LogEvent, ObserverId, RoomGuard, Rooms};
