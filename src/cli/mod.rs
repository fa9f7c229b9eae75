//! Command-line workflow
//!
//! `orchestration` holds the release pipeline; argument parsing lives in the binary.

pub mod orchestration;

pub use orchestration::{
    current_release, plan_release, preflight, run_release, CurrentRelease, ReleaseOptions,
    ReleaseOutcome, ReleasePlan,
};
