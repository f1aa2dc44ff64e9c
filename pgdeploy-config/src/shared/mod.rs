mod retry;
mod sentry;

pub use retry::*;
pub use sentry::*;
