mod params;
pub(crate) mod trie;

pub use params::{Param, Params};
