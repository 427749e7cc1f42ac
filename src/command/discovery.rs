use std::collections::HashSet;

use tracing::{debug, warn};

use crate::command::definition::{CommandDefinition, CommandModule};
use crate::command::error::DiscoveryError;

/// 一次发现的结果
#[derive(Debug, Default)]
pub struct Discovery {
    pub definitions: Vec<CommandDefinition>,
    pub skipped: Vec<DiscoveryError>,
}

/// 校验模块声明的命令并按优先级稳定排序
///
/// 格式错误的声明会被跳过并记录告警，不影响其余命令。
pub fn discover(module: &CommandModule) -> Vec<CommandDefinition> {
    discover_with_report(module).definitions
}

pub fn discover_with_report(module: &CommandModule) -> Discovery {
    let mut seen = HashSet::new();
    let mut report = Discovery::default();

    for (index, declaration) in module.declarations().iter().enumerate() {
        let key = declaration.key.trim();
        let skipped = if key.is_empty() {
            Some(DiscoveryError::EmptyKey {
                module: module.name().to_string(),
                index,
            })
        } else if !seen.insert(key.to_string()) {
            Some(DiscoveryError::DuplicateKey {
                module: module.name().to_string(),
                key: key.to_string(),
            })
        } else {
            None
        };

        if let Some(err) = skipped {
            warn!("跳过命令声明: {}", err);
            report.skipped.push(err);
            continue;
        }

        let Some(factory) = declaration.factory.clone() else {
            let err = DiscoveryError::MissingFactory {
                module: module.name().to_string(),
                key: key.to_string(),
            };
            warn!("跳过命令声明: {}", err);
            report.skipped.push(err);
            continue;
        };

        report.definitions.push(CommandDefinition {
            key: key.to_string(),
            entries: declaration.entries.clone(),
            priority: declaration.priority,
            factory,
        });
    }

    // sort_by_key 是稳定排序，同优先级保持声明顺序
    report.definitions.sort_by_key(|d| d.priority);

    debug!(
        "模块 {} 发现 {} 个命令，跳过 {} 个",
        module.name(),
        report.definitions.len(),
        report.skipped.len()
    );
    report
}
