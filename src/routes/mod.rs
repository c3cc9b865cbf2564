/// Router Module Index
///
/// Routes are split by how the admission gate treats them.

/// Probe routes mounted outside the gate, plus the public pages the gate lets through.
pub mod public;

/// Portal pages that require a session and pass the full gate.
pub mod portal;
