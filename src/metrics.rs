//! Metric helpers for `wirepack`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking packages handled.
pub const PACKAGES_PROCESSED: &str = "wirepack_packages_processed_total";
/// Name of the counter tracking packages the reassembler refused.
pub const PACKAGES_REJECTED: &str = "wirepack_packages_rejected_total";
/// Name of the counter tracking fully reassembled transmissions.
pub const TRANSMISSIONS_COMPLETED: &str = "wirepack_transmissions_completed_total";

/// Direction of package processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Packages received from a transport.
    Inbound,
    /// Packages handed to a transport.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "used by metric labels"))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Why an inbound unit did not contribute to a transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The unit belongs to a different transmission.
    Foreign,
    /// A continuation arrived before any head and could not be held.
    Orphan,
    /// The unit could not be decoded or its sequence is out of range.
    Malformed,
    /// The rebuilt payload did not match the announced checksum.
    Integrity,
}

impl RejectReason {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "used by metric labels"))]
    fn as_str(self) -> &'static str {
        match self {
            RejectReason::Foreign => "foreign",
            RejectReason::Orphan => "orphan",
            RejectReason::Malformed => "malformed",
            RejectReason::Integrity => "integrity",
        }
    }
}

/// Record `count` packages processed in the given direction.
#[cfg(feature = "metrics")]
pub fn inc_packages(direction: Direction, count: u64) {
    counter!(PACKAGES_PROCESSED, "direction" => direction.as_str()).increment(count);
}

/// Record `count` packages processed in the given direction.
#[cfg(not(feature = "metrics"))]
pub fn inc_packages(_direction: Direction, _count: u64) {}

/// Record a rejected inbound unit.
#[cfg(feature = "metrics")]
pub fn inc_rejected(reason: RejectReason) {
    counter!(PACKAGES_REJECTED, "reason" => reason.as_str()).increment(1);
}

/// Record a rejected inbound unit.
#[cfg(not(feature = "metrics"))]
pub fn inc_rejected(_reason: RejectReason) {}

/// Record a transmission handed to the application.
#[cfg(feature = "metrics")]
pub fn inc_completed() { counter!(TRANSMISSIONS_COMPLETED).increment(1); }

/// Record a transmission handed to the application.
#[cfg(not(feature = "metrics"))]
pub fn inc_completed() {}
