/// Danger evaluation.
///
/// Submodules:
/// - `danger`: susceptibility × rainfall threshold matrix and area-of-risk
///   selection.

pub mod danger;
