//! Command workflows behind the `cldr` subcommands
//!
//! Each workflow takes plain argument structs rather than clap types so it
//! can be driven from tests.

pub mod build;
pub mod info;
pub mod new;

pub use build::{run_build, BuildArgs, BuildOutcome};
pub use info::{collect_info, InfoReport};
pub use new::{run_new, NewBulletArgs, NewBulletOutcome};
