//! Shared injection points used by the promptweave router and evolution
//! engine: a monotonic `Clock`, a seedable `RandomSource`, deterministic id
//! generation, and a `CancellationToken` both components poll.
//!
//! Neither the router nor the evolution engine calls `Instant::now()`,
//! `rand::thread_rng()`, or `Uuid::new_v4()` directly; both take
//! `Arc<dyn Clock>` / `Arc<dyn RandomSource>` at construction and mint ids
//! through `new_id`, so a whole run can be replayed bit-for-bit from a
//! single seed.

mod cancellation;
mod clock;
mod ids;
mod random;

pub use cancellation::CancellationToken;
pub use clock::{Clock, FakeClock, SystemClock};
pub use ids::new_id;
pub use random::{RandomSource, SeededRandom};
