//! Compile-time selection between full and tactical-only generation.

pub(crate) trait GenType {
    /// Skip quiet moves and underpromotions.
    const TACTICAL: bool;
}

/// Every legal move.
pub(crate) struct All;
impl GenType for All {
    const TACTICAL: bool = false;
}

/// Captures and queen promotions, for quiescence search.
pub(crate) struct Tactical;
impl GenType for Tactical {
    const TACTICAL: bool = true;
}
