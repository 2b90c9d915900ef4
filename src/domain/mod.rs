//! Domain logic - bullet grammar, tags and release versions

pub mod bullet;
pub mod kind;
pub mod tag;
pub mod version;

pub use bullet::{Bullet, RenderContext, BULLET_EXPLANATION};
pub use kind::Kind;
pub use tag::{Tag, TagRegistry, TagType};
pub use version::{next_version, parse_version, VersionBump};
