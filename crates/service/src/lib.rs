//! Service layer providing the product catalog operations on top of models.
//! - Every operation returns an `Outcome` instead of surfacing collaborator faults.
//! - Cache, repository and validators are traits with swappable adapters.
//! - Cancellation travels as a `CancellationToken` and is reported apart from failures.

pub mod errors;
pub mod outcome;
pub mod cancel;
pub mod cache;
pub mod product;
#[cfg(test)]
pub mod test_support;

pub use errors::{Cancelled, ErrorCode, ServiceCall, ServiceError};
pub use outcome::{Failure, Outcome};
