pub mod discovery;
pub mod opener;
pub mod resolver;

pub use crate::domain::model::{Interface, LaunchRequest, ServerInfo, Target, TargetKind};
pub use crate::domain::ports::{Browser, ConfigProvider, ServerLauncher, ServerProbe, ServerRegistry};
pub use crate::utils::error::Result;
