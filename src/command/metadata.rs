//! 命令元数据与合并规则
//!
//! 一个命令可以声明多条元数据，按声明顺序合并：每个字段取第一条“存在”的值，
//! 全部缺失时使用默认值。

/// 判断字段值是否“存在”
///
/// 所有字段共用同一条规则：`None` 缺失；`Some(v)` 在 `v.is_present()` 为
/// false 时同样视为缺失。字符串以空串为缺失。
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

/// 按声明顺序返回第一个存在的值，否则返回默认值
pub fn resolve<T, F>(entries: &[MetadataEntry], selector: F, default: T) -> T
where
    T: Presence + Clone,
    F: Fn(&MetadataEntry) -> Option<&T>,
{
    entries
        .iter()
        .filter_map(|entry| selector(entry))
        .find(|value| value.is_present())
        .cloned()
        .unwrap_or(default)
}

/// 单条元数据声明
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataEntry {
    /// 按钮显示名
    pub name: Option<String>,
    /// 所属面板
    pub panel: Option<String>,
    /// 所属下拉按钮组
    pub pulldown: Option<String>,
    /// 小图标
    pub image: Option<String>,
    /// 大图标
    pub large_image: Option<String>,
    /// F1 帮助链接
    pub url: Option<String>,
    /// 提示文字
    pub tooltip: Option<String>,
    /// 提示图片
    pub tooltip_image: Option<String>,
    /// 长描述
    pub long_description: Option<String>,
}

impl MetadataEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn panel(mut self, value: impl Into<String>) -> Self {
        self.panel = Some(value.into());
        self
    }

    pub fn pulldown(mut self, value: impl Into<String>) -> Self {
        self.pulldown = Some(value.into());
        self
    }

    pub fn image(mut self, value: impl Into<String>) -> Self {
        self.image = Some(value.into());
        self
    }

    pub fn large_image(mut self, value: impl Into<String>) -> Self {
        self.large_image = Some(value.into());
        self
    }

    pub fn url(mut self, value: impl Into<String>) -> Self {
        self.url = Some(value.into());
        self
    }

    pub fn tooltip(mut self, value: impl Into<String>) -> Self {
        self.tooltip = Some(value.into());
        self
    }

    pub fn tooltip_image(mut self, value: impl Into<String>) -> Self {
        self.tooltip_image = Some(value.into());
        self
    }

    pub fn long_description(mut self, value: impl Into<String>) -> Self {
        self.long_description = Some(value.into());
        self
    }

    /// 所有字段均缺失
    pub fn is_blank(&self) -> bool {
        [
            &self.name,
            &self.panel,
            &self.pulldown,
            &self.image,
            &self.large_image,
            &self.url,
            &self.tooltip,
            &self.tooltip_image,
            &self.long_description,
        ]
        .iter()
        .all(|field| !field.as_ref().is_some_and(|v| v.is_present()))
    }
}

/// 合并后的有效元数据，空串表示缺失
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveMetadata {
    pub name: String,
    pub panel: String,
    pub pulldown: String,
    pub image: String,
    pub large_image: String,
    pub url: String,
    pub tooltip: String,
    pub tooltip_image: String,
    pub long_description: String,
}

impl EffectiveMetadata {
    /// 合并一个命令的全部元数据
    ///
    /// 显示名缺省为命令键，面板缺省为 `default_panel`。
    pub fn resolve(key: &str, entries: &[MetadataEntry], default_panel: &str) -> Self {
        let text = |select: fn(&MetadataEntry) -> Option<&String>| {
            resolve(entries, select, String::new())
        };

        Self {
            name: resolve(entries, |e| e.name.as_ref(), key.to_string()),
            panel: resolve(entries, |e| e.panel.as_ref(), default_panel.to_string()),
            pulldown: text(|e| e.pulldown.as_ref()),
            image: text(|e| e.image.as_ref()),
            large_image: text(|e| e.large_image.as_ref()),
            url: text(|e| e.url.as_ref()),
            tooltip: text(|e| e.tooltip.as_ref()),
            tooltip_image: text(|e| e.tooltip_image.as_ref()),
            long_description: text(|e| e.long_description.as_ref()),
        }
    }

    /// 下拉按钮组名（缺失时为 None）
    pub fn pulldown_group(&self) -> Option<&str> {
        Some(self.pulldown.as_str()).filter(|g| g.is_present())
    }
}
