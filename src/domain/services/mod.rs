mod resolution_chain;

pub use resolution_chain::{ChainBuilder, PositionFactory, Resolution, ResolutionChain};
