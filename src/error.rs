//! Error handling for the ocean mesh pipeline
//!
//! One crate-wide error type. Configuration and mesh problems are detected
//! once at initialization; kernels themselves have no error path.

use std::error::Error as StdError;
use std::fmt;

/// Mesh validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("Mesh has no vertices or no triangles")]
    EmptyMesh,

    #[error("Index buffer length {len} is not a multiple of 3")]
    MalformedIndexBuffer { len: usize },

    #[error("Triangle {triangle} references vertex {index}, mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Main error type for the pipeline
#[derive(Debug)]
pub enum OceanError {
    // Configuration Errors
    AdjacencyCapacityExceeded {
        vertex: usize,
        fan_out: usize,
        capacity: usize,
    },
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },
    ConfigParse {
        context: String,
        error: String,
    },
    IoError {
        path: String,
        error: String,
    },

    // Mesh Errors
    Mesh(MeshError),

    // Buffer Errors
    BufferSizeMismatch {
        buffer: String,
        expected: usize,
        found: usize,
    },

    // Lifecycle Errors
    StateError {
        expected: String,
        actual: String,
    },

    // Threading Errors
    ThreadPoolBuild(String),
    TaskJoinError {
        task: String,
    },
}

impl fmt::Display for OceanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OceanError::AdjacencyCapacityExceeded {
                vertex,
                fan_out,
                capacity,
            } => write!(
                f,
                "Vertex {} is shared by {} triangles, adjacency capacity is {}",
                vertex, fan_out, capacity
            ),
            OceanError::InvalidConfig {
                field,
                value,
                reason,
            } => write!(f, "Invalid config: {} = {} ({})", field, value, reason),
            OceanError::ConfigParse { context, error } => {
                write!(f, "Config parse error in {}: {}", context, error)
            }
            OceanError::IoError { path, error } => write!(f, "IO error for {}: {}", path, error),

            OceanError::Mesh(err) => write!(f, "Invalid mesh: {}", err),

            OceanError::BufferSizeMismatch {
                buffer,
                expected,
                found,
            } => write!(
                f,
                "Buffer size mismatch for {}: expected {}, found {}",
                buffer, expected, found
            ),

            OceanError::StateError { expected, actual } => {
                write!(f, "State error: expected {}, actual {}", expected, actual)
            }

            OceanError::ThreadPoolBuild(msg) => write!(f, "Failed to build thread pool: {}", msg),
            OceanError::TaskJoinError { task } => write!(f, "Task join error: {}", task),
        }
    }
}

impl StdError for OceanError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            OceanError::Mesh(err) => Some(err),
            _ => None,
        }
    }
}

/// Type alias for Results in this crate
pub type OceanResult<T> = Result<T, OceanError>;

impl From<MeshError> for OceanError {
    fn from(error: MeshError) -> Self {
        OceanError::Mesh(error)
    }
}

impl From<std::io::Error> for OceanError {
    fn from(error: std::io::Error) -> Self {
        OceanError::IoError {
            path: String::new(),
            error: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for OceanError {
    fn from(error: toml::de::Error) -> Self {
        OceanError::ConfigParse {
            context: "toml".to_string(),
            error: error.to_string(),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for OceanError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        OceanError::ThreadPoolBuild(error.to_string())
    }
}

/// Convert Option to Result with context
pub trait OptionExt<T> {
    fn ok_or_ocean<F>(self, f: F) -> OceanResult<T>
    where
        F: FnOnce() -> OceanError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_ocean<F>(self, f: F) -> OceanResult<T>
    where
        F: FnOnce() -> OceanError,
    {
        self.ok_or_else(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_names_vertex() {
        let err = OceanError::AdjacencyCapacityExceeded {
            vertex: 42,
            fan_out: 8,
            capacity: 6,
        };
        assert_eq!(
            err.to_string(),
            "Vertex 42 is shared by 8 triangles, adjacency capacity is 6"
        );
    }

    #[test]
    fn test_mesh_error_source() {
        let err: OceanError = MeshError::MalformedIndexBuffer { len: 7 }.into();
        assert_eq!(
            err.to_string(),
            "Invalid mesh: Index buffer length 7 is not a multiple of 3"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_ocean(|| OceanError::TaskJoinError {
            task: "test".to_string(),
        });
        assert!(matches!(result, Err(OceanError::TaskJoinError { .. })));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parsed: Result<toml::Value, toml::de::Error> = toml::from_str("= broken");
        let err: OceanError = match parsed {
            Ok(_) => panic!("expected parse failure"),
            Err(e) => e.into(),
        };
        assert!(matches!(err, OceanError::ConfigParse { .. }));
    }
}
