mod diagnostics;
mod resolver;

pub use diagnostics::BinaryDiagnostic;
pub use resolver::{diagnose_binary, resolve_binary_detailed};
