//! 命令声明、元数据合并与发现

pub mod definition;
pub mod discovery;
pub mod error;
pub mod metadata;

pub use definition::{
    Command, CommandDeclaration, CommandDefinition, CommandFactory, CommandModule, DispatchPolicy,
    GroupDeclaration,
};
pub use discovery::{discover, discover_with_report, Discovery};
pub use error::DiscoveryError;
pub use metadata::{resolve, EffectiveMetadata, MetadataEntry, Presence};
