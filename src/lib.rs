//! # tristack
//!
//! Engine for a triple-match tile puzzle: a multi-layer board of
//! overlapping tiles, a bounded dock, and the rule that three docked tiles
//! of one kind clear. The crate owns the two algorithmic pieces — level
//! generation and occlusion resolution — plus the session state every
//! mutation (click, undo, shuffle, remove power-up) flows through.
//!
//! It is used by two binaries:
//! - `human_player`: interactive play in the terminal.
//! - `difficulty_evaluator`: plays batches of generated levels with the
//!   autoplay strategies and reports clear rates, for tuning the tiers.
//!
//! ## Modules
//! - `engine`: tile data model (`Tile`, `TileKind`), the occlusion resolver
//!   (`resolve_clickable`), and the `Game` session with all mutation
//!   operations.
//! - `generator`: randomized level generation (five layout archetypes, a
//!   count-balanced kind pool, overflow handling).
//! - `heuristics`: autoplay strategies and the `autoplay` driver.
//! - `utils`: parsing tile collections from compact text specs, mainly for
//!   tests.
//!
//! All randomness is taken as a `&mut impl Rng` parameter, so callers (and
//! tests) control seeding.

pub mod engine;
pub mod generator;
pub mod heuristics;
pub mod utils;
