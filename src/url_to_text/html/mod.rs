pub mod meta;

pub use meta::{MetaCandidate, MetaDocument};
