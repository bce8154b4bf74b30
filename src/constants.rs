//! Shared constants for the ocean mesh pipeline
//!
//! Single source of truth for defaults and validation limits.

/// Adjacency sizing
pub mod adjacency {
    /// Per-vertex triangle slots reserved by default.
    /// A regular grid triangulation never exceeds this fan-out.
    pub const DEFAULT_CAPACITY: usize = 6;

    /// Largest capacity accepted by config validation
    pub const MAX_CAPACITY: usize = 64;
}

/// Job scheduling
pub mod scheduling {
    /// Minimum number of elements handed to a worker per parallel chunk
    pub const DEFAULT_BATCH_SIZE: usize = 64;

    /// Largest worker pool accepted by config validation
    pub const MAX_WORKER_THREADS: usize = 256;

    /// Prefix for worker thread names
    pub const WORKER_THREAD_PREFIX: &str = "ocean-worker";
}

/// Wave parameter defaults
pub mod waves {
    pub const DEFAULT_PERLIN_STRENGTH: f32 = 0.25;
    pub const DEFAULT_RIPPLE_STRENGTH: f32 = 0.25;
    pub const DEFAULT_TIME_MULTIPLIER: f32 = 1.0;
    pub const DEFAULT_SCALE: f32 = 1.0;
}

/// Classic gradient noise constants
pub mod classic_noise {
    /// Permutation polynomial modulus
    pub const MODULUS: f32 = 289.0;

    /// Output scale bringing the result close to [-1, 1]
    pub const OUTPUT_SCALE: f32 = 2.3;

    /// Taylor approximation of 1/sqrt(r) around r = 0.7
    pub const INV_SQRT_A: f32 = 1.792_842_9;
    pub const INV_SQRT_B: f32 = 0.853_734_7;
}
