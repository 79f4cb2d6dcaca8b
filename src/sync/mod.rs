//! Thread-safe primitives: striped segments, the semaphore used as a stripe,
//! the admission-controlled queue and its memory sampler.

pub mod admission;
pub mod index;
mod lazy;
pub mod memory;
pub mod semaphore;
pub mod striped;

pub use admission::{AdmissionPolicy, AdmissionQueue, AdmitAll, MemoryFloor};
pub use index::{smear, StripeIndexer, ALL_SET, MAX_POWER_OF_TWO};
pub use memory::{
    available_memory, MemorySampler, MemorySource, SamplerConfig, DEFAULT_SAMPLE_INTERVAL,
};
pub use semaphore::{ArcSemaphorePermit, Semaphore, SemaphorePermit};
pub use striped::Striped;
