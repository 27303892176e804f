pub mod cli_engine;
pub mod engine;
pub mod types;

pub use cli_engine::{detect_runtime, CliEngine};
pub use engine::{ContainerEngine, RuntimeError, RuntimeResult};
pub use types::{
    ContainerSpec, ContainerState, ExecOutput, PortMapping, RuntimeKind, VolumeMount,
};

pub mod prelude {
    pub use crate::cli_engine::*;
    pub use crate::engine::*;
    pub use crate::types::*;
}
