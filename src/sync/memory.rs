//! Periodically refreshed "available memory" signal.
//!
//! A [`MemorySampler`] owns one background thread that calls a memory source
//! every `interval` and publishes the result through an `AtomicU64`. Readers
//! pay a single relaxed load, so the cost of the source (a `/proc` read on
//! Linux) never lands on an enqueue hot path.
//!
//! ```text
//!   sampler thread                        readers (any thread)
//!   ──────────────                        ────────────────────
//!   loop {                                available() ─► AtomicU64::load
//!     sleep(interval)
//!     upgrade Weak ─► gone? exit
//!     store(source())
//!   }
//! ```
//!
//! ## Lifetimes
//!
//! - [`MemorySampler::global`] starts a process-wide sampler on first call and
//!   keeps it for the life of the process. Rust threads never keep a process
//!   alive once `main` returns, so it needs no teardown.
//! - [`MemorySampler::start`] returns an owned sampler; its thread holds only
//!   a `Weak` and exits on the first tick after the last `Arc` is dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use std::time::Duration;

/// Default refresh interval.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

/// Function returning currently available memory in bytes.
pub type MemorySource = fn() -> u64;

static GLOBAL: OnceLock<Arc<MemorySampler>> = OnceLock::new();
static READ_FAILURE_LOGGED: AtomicBool = AtomicBool::new(false);

/// Sampler settings.
#[derive(Clone, Copy)]
pub struct SamplerConfig {
    pub interval: Duration,
    pub source: MemorySource,
}

impl SamplerConfig {
    pub fn new(interval: Duration, source: MemorySource) -> Self {
        Self { interval, source }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLE_INTERVAL,
            source: available_memory,
        }
    }
}

impl fmt::Debug for SamplerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerConfig")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// One shared memory signal refreshed by a background thread.
pub struct MemorySampler {
    available: AtomicU64,
    source: MemorySource,
    interval: Duration,
}

impl MemorySampler {
    /// The process-wide sampler, started with default settings on first use.
    pub fn global() -> Arc<MemorySampler> {
        Arc::clone(GLOBAL.get_or_init(|| Self::start(SamplerConfig::default())))
    }

    /// Starts a sampler owned by the caller.
    ///
    /// The first sample is taken before returning, so [`available`]
    /// (Self::available) is meaningful immediately.
    pub fn start(config: SamplerConfig) -> Arc<MemorySampler> {
        let sampler = Arc::new(Self {
            available: AtomicU64::new((config.source)()),
            source: config.source,
            interval: config.interval,
        });
        let weak = Arc::downgrade(&sampler);
        let spawned = thread::Builder::new()
            .name("memory-sampler".into())
            .spawn(move || run(weak, config.interval));
        match spawned {
            Ok(_) => tracing::debug!(interval = ?config.interval, "memory sampler started"),
            Err(err) => tracing::warn!(
                error = %err,
                "failed to spawn memory sampler thread; signal will only refresh via sample_now"
            ),
        }
        sampler
    }

    /// Most recent sample, in bytes.
    #[inline]
    pub fn available(&self) -> u64 {
        self.available.load(Ordering::Relaxed)
    }

    /// Refreshes the signal immediately and returns the new value.
    pub fn sample_now(&self) -> u64 {
        let value = (self.source)();
        self.available.store(value, Ordering::Relaxed);
        value
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl fmt::Debug for MemorySampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySampler")
            .field("available", &self.available())
            .field("interval", &self.interval)
            .finish()
    }
}

fn run(sampler: Weak<MemorySampler>, interval: Duration) {
    loop {
        thread::sleep(interval);
        match sampler.upgrade() {
            Some(sampler) => {
                sampler.sample_now();
            },
            None => break,
        }
    }
    tracing::debug!("memory sampler stopped");
}

/// Available system memory in bytes.
///
/// Reads `MemAvailable` from `/proc/meminfo` on Linux. Elsewhere, or when the
/// read fails, returns `u64::MAX` so a missing signal never blocks admission.
pub fn available_memory() -> u64 {
    match read_available_memory() {
        Some(bytes) => bytes,
        None => {
            if !READ_FAILURE_LOGGED.swap(true, Ordering::Relaxed) {
                tracing::warn!("available memory unreadable; treating it as unlimited");
            }
            u64::MAX
        },
    }
}

#[cfg(target_os = "linux")]
fn read_available_memory() -> Option<u64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    parse_mem_available(&meminfo)
}

#[cfg(not(target_os = "linux"))]
fn read_available_memory() -> Option<u64> {
    None
}

/// Extracts `MemAvailable` (reported in kB) from `/proc/meminfo` text.
fn parse_mem_available(meminfo: &str) -> Option<u64> {
    let line = meminfo
        .lines()
        .find(|line| line.starts_with("MemAvailable:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    kib.checked_mul(1024)
}
