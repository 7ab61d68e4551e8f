// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline-wide constants
//!
//! The gate-wait defaults reproduce the magnitudes of the reference
//! implementation. They are defaults only; all of them can be overridden
//! through [`crate::config::PipelineConfig`].

use std::time::Duration;

/// How long frame delivery waits for the exclusion gate before dropping
/// the frame (milliseconds). Favors never stalling the video pipeline.
pub const DEFAULT_FRAME_WAIT_MS: u64 = 500;

/// How long effect navigation waits for the gate before the request is
/// abandoned (milliseconds). The UI may simply re-issue it.
pub const DEFAULT_NAV_WAIT_MS: u64 = 500;

/// How long a tap-to-focus request waits for the gate (milliseconds).
pub const DEFAULT_FOCUS_WAIT_MS: u64 = 100;

/// Retry interval for teardown paths that must eventually acquire the
/// gate (milliseconds). Teardown never gives up.
pub const DEFAULT_TEARDOWN_RETRY_MS: u64 = 100;

/// How long the delivery loop blocks on the frame source per iteration.
/// Short enough that stop requests and focus calls are never starved.
pub const SOURCE_POLL: Duration = Duration::from_millis(10);

/// Frame cadence of the built-in synthetic test-pattern source.
pub const TEST_PATTERN_FPS: u32 = 30;
