//! Compile-lifetime context.

use crate::options::Options;
use crate::plane_table::PlaneTable;

/// Everything a compile shares across its tasks: the configuration and the
/// plane registry. There are no hidden globals; a `Compiler` is handed
/// explicitly to every core call and dropped when the compile ends.
#[derive(Debug, Default)]
pub struct Compiler {
    pub options: Options,
    pub planes: PlaneTable,
}

impl Compiler {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            planes: PlaneTable::new(),
        }
    }
}
