//! Free-Space Map Module
//!
//! Tracks which pages still have room and picks the destination of the
//! next insert.
//!
//! ## Responsibilities
//! - Remember `(page, remaining slots)` for every page that is not full
//! - Hand out the page closest to full first (best-fit packing)
//! - Forget a page the moment its last slot is reserved
//!
//! ## Data Structure Choice
//! An array-backed binary min-heap keyed on remaining slots:
//! ```text
//!                 [0] free=1
//!               /           \
//!        [1] free=3       [2] free=2
//!        /       \
//!  [3] free=7  [4] free=4
//! ```
//! `push` and `pop` are O(log n). The map is not synchronized; the owning
//! table serializes access through its lock.

mod map;

pub use map::{FreeSpaceMap, Reservation};
