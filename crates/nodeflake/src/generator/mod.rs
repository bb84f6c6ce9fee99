mod allocator;
mod backoff;
mod status;

pub use allocator::*;
pub use backoff::*;
pub use status::*;
