//! Extension points consumed by the engine core.

pub mod traits;

pub use traits::{
    Processor, ProcessorBinding, ProcessorMatch, ProcessorResolver, ProcessorResult,
};
