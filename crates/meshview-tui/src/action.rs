//! UI actions. Key presses map to actions; actions are the only way the
//! surface changes its own state or asks the engine for a layout change.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Move focus to the next table.
    FocusNext,
    ZoomIn,
    ZoomOut,
    RestartLayout,
}
