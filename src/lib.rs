#![forbid(unsafe_code)]

pub mod brush;
pub mod builder;
#[cfg(feature = "parallel")]
pub mod builder_parallel;
pub mod chop;
pub mod compiler;
pub mod contents;
pub mod errors;
pub mod float_types;
pub mod options;
pub mod plane;
pub mod plane_table;
pub mod split;
pub mod tree;
pub mod winding;

pub use brush::{Brush, Side};
pub use builder::BspStats;
pub use compiler::Compiler;
pub use contents::Contents;
pub use options::Options;
pub use tree::{Node, Tree};

#[cfg(any(
    all(feature = "f64", feature = "f32"),
    not(any(feature = "f64", feature = "f32"))
))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");
