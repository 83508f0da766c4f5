// Handlers by security tier:
// public (no auth) → protected (bearer token, workspace routes also gated on
// membership) → elevated (super admin).

pub mod elevated;
pub mod protected;
pub mod public;
