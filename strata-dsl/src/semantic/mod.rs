//! Semantic analysis: reference resolution, cycle detection, and temporal checks

pub mod graph;
pub mod suggest;
pub mod symbols;
pub mod temporal;

pub use graph::{Cycle, Edge, EdgeKind, EventGraph, EventNode, GraphError, GraphOptions};
pub use suggest::{edit_distance, suggest, SuggestOptions};
pub use symbols::{resolve, Resolution, ResolveError, Symbol, SymbolTable};
pub use temporal::{check, TemporalError};
