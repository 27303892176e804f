pub mod config;
pub mod provision;
pub mod readiness;
pub mod report;

pub use config::{ConfigError, ProvisionConfig};
pub use provision::{ProvisionError, ProvisionResult, Provisioner};
pub use readiness::{HttpProber, ReqwestProber};
pub use report::{InstallReport, Warning};
