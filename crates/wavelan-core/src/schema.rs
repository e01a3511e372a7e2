//! Schema ID constants for JSON output contracts.
//!
//! JSON emitted by wavelan includes a `schema_id` field referencing the
//! corresponding schema, hosted under `schemas.3leaps.dev/wavelan/`.
//!
//! ## URI Structure
//!
//! ```text
//! https://schemas.3leaps.dev/<module>/<topic>/<version>/<filename>
//! ```
//!
//! Runtime validation is not performed; the constants exist so consumers can
//! detect the shape they are reading.

/// Schema ID for a single link query result (v1.0.0).
///
/// Emitted by `wavelan query --json` and each sample of `wavelan watch --json`.
pub const LINK_SNAPSHOT_V1: &str =
    "https://schemas.3leaps.dev/wavelan/link/v1.0.0/link-snapshot.schema.json";

/// Base URL for all wavelan schemas.
pub const SCHEMA_BASE: &str = "https://schemas.3leaps.dev/wavelan";
