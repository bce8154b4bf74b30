/// Job System Module - Data-Oriented Programming (DOP) style
///
/// - thread_pool_data.rs: Pool, handles and completion slots
/// - thread_pool_operations.rs: Scheduling, dependencies, completion

pub mod thread_pool_data;
pub mod thread_pool_operations;

pub use thread_pool_data::{JobHandle, JobSystemData};

pub use thread_pool_operations::{
    complete, create_job_system, in_flight, is_completed, run_immediate, schedule, schedule_after,
};
