//! 按钮外观参数

use tracing::debug;

use crate::command::{EffectiveMetadata, MetadataEntry, Presence};
use crate::registry::host::{ItemHandle, ItemProperty, RibbonHost};

/// 按钮或按钮组的外观属性
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonParam {
    pub image: String,
    pub large_image: String,
    pub help_url: String,
    pub tooltip: String,
    pub long_description: String,
    pub tooltip_image: String,
}

/// 外观属性的应用结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<ItemProperty>,
    pub failed: Vec<ItemProperty>,
}

impl ButtonParam {
    pub fn from_metadata(metadata: &EffectiveMetadata) -> Self {
        Self {
            image: metadata.image.clone(),
            large_image: metadata.large_image.clone(),
            help_url: metadata.url.clone(),
            tooltip: metadata.tooltip.clone(),
            long_description: metadata.long_description.clone(),
            tooltip_image: metadata.tooltip_image.clone(),
        }
    }

    pub fn from_entry(entry: &MetadataEntry) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            image: text(&entry.image),
            large_image: text(&entry.large_image),
            help_url: text(&entry.url),
            tooltip: text(&entry.tooltip),
            long_description: text(&entry.long_description),
            tooltip_image: text(&entry.tooltip_image),
        }
    }

    /// 按应用顺序列出非空属性
    pub fn properties(&self) -> Vec<(ItemProperty, &str)> {
        [
            (ItemProperty::Image, self.image.as_str()),
            (ItemProperty::LargeImage, self.large_image.as_str()),
            (ItemProperty::HelpUrl, self.help_url.as_str()),
            (ItemProperty::Tooltip, self.tooltip.as_str()),
            (ItemProperty::LongDescription, self.long_description.as_str()),
            (ItemProperty::TooltipImage, self.tooltip_image.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_present())
        .collect()
    }

    /// 逐项设置外观属性
    ///
    /// 每项单独调用宿主，失败只记录日志，不影响其他属性。资源路径加上 `resource_root` 前缀。
    pub fn apply(
        &self,
        host: &mut dyn RibbonHost,
        item: ItemHandle,
        resource_root: &str,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (property, value) in self.properties() {
            let value = if property.is_resource() {
                resource_path(resource_root, value)
            } else {
                value.to_string()
            };

            match host.set_property(item, property, &value) {
                Ok(()) => report.applied.push(property),
                Err(e) => {
                    debug!("设置 {:?} 失败，已忽略: {}", property, e);
                    report.failed.push(property);
                }
            }
        }

        report
    }
}

/// 拼接模块资源路径，已是绝对地址的路径保持不变
pub fn resource_path(resource_root: &str, path: &str) -> String {
    if path.contains("://") || path.starts_with(resource_root) {
        path.to_string()
    } else {
        format!("{}{}", resource_root, path.trim_start_matches('/'))
    }
}
