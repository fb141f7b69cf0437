pub mod applier;

pub use applier::{apply_plan, AppliedAction, ApplyReport, Outcome};
