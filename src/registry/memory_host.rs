//! 内存中的功能区实现
//!
//! 记录所有创建的面板、按钮组、按钮及其外观属性，并支持注入失败。
//! 用于测试和演示程序。

use std::collections::HashSet;

use crate::registry::host::{
    ButtonHandle, ButtonParent, GroupHandle, HostCommandId, HostError, HostResult, ItemHandle,
    ItemProperty, PanelHandle, RibbonHost,
};

/// 可注入失败的宿主操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    CreatePanel,
    AddGroup,
    AddButton,
    CommandId,
    Property(ItemProperty),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRecord {
    pub handle: PanelHandle,
    pub tab: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub handle: GroupHandle,
    pub panel: PanelHandle,
    pub key: String,
    pub display_name: String,
    pub properties: Vec<(ItemProperty, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonRecord {
    pub handle: ButtonHandle,
    pub parent: ButtonParent,
    pub key: String,
    pub display_name: String,
    pub command_id: HostCommandId,
    pub properties: Vec<(ItemProperty, String)>,
}

impl ButtonRecord {
    pub fn property(&self, property: ItemProperty) -> Option<&str> {
        find_property(&self.properties, property)
    }
}

impl GroupRecord {
    pub fn property(&self, property: ItemProperty) -> Option<&str> {
        find_property(&self.properties, property)
    }
}

fn find_property(properties: &[(ItemProperty, String)], property: ItemProperty) -> Option<&str> {
    properties
        .iter()
        .rev()
        .find(|(p, _)| *p == property)
        .map(|(_, v)| v.as_str())
}

#[derive(Debug, Default)]
pub struct InMemoryRibbon {
    next_handle: u64,
    panels: Vec<PanelRecord>,
    groups: Vec<GroupRecord>,
    buttons: Vec<ButtonRecord>,
    failures: HashSet<FailurePoint>,
}

impl InMemoryRibbon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject_failure(&mut self, point: FailurePoint) {
        self.failures.insert(point);
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    pub fn panels(&self) -> &[PanelRecord] {
        &self.panels
    }

    pub fn groups(&self) -> &[GroupRecord] {
        &self.groups
    }

    /// 按创建顺序
    pub fn buttons(&self) -> &[ButtonRecord] {
        &self.buttons
    }

    pub fn button(&self, key: &str) -> Option<&ButtonRecord> {
        self.buttons.iter().find(|b| b.key == key)
    }

    pub fn group(&self, key: &str) -> Option<&GroupRecord> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn panel_named(&self, name: &str) -> Option<&PanelRecord> {
        self.panels.iter().find(|p| p.name == name)
    }

    /// 直接放在指定面板上的按钮，按创建顺序
    pub fn panel_buttons(&self, panel: &str) -> Vec<&ButtonRecord> {
        let Some(panel) = self.panel_named(panel) else {
            return Vec::new();
        };
        self.buttons
            .iter()
            .filter(|b| b.parent == ButtonParent::Panel(panel.handle))
            .collect()
    }

    pub fn group_buttons(&self, group_key: &str) -> Vec<&ButtonRecord> {
        let Some(group) = self.group(group_key) else {
            return Vec::new();
        };
        self.buttons
            .iter()
            .filter(|b| b.parent == ButtonParent::Group(group.handle))
            .collect()
    }

    fn check(&self, point: FailurePoint, operation: &str) -> HostResult<()> {
        if self.failures.contains(&point) {
            Err(HostError::new(operation, "injected failure"))
        } else {
            Ok(())
        }
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn panel(&self, handle: PanelHandle) -> HostResult<&PanelRecord> {
        self.panels
            .iter()
            .find(|p| p.handle == handle)
            .ok_or_else(|| HostError::new("lookup panel", format!("{:?} not found", handle)))
    }

    fn group_by_handle(&self, handle: GroupHandle) -> HostResult<&GroupRecord> {
        self.groups
            .iter()
            .find(|g| g.handle == handle)
            .ok_or_else(|| HostError::new("lookup group", format!("{:?} not found", handle)))
    }

    fn panel_of(&self, parent: ButtonParent) -> HostResult<&PanelRecord> {
        match parent {
            ButtonParent::Panel(panel) => self.panel(panel),
            ButtonParent::Group(group) => self.panel(self.group_by_handle(group)?.panel),
        }
    }
}

impl RibbonHost for InMemoryRibbon {
    fn create_panel(&mut self, tab: &str, panel: &str) -> HostResult<PanelHandle> {
        self.check(FailurePoint::CreatePanel, "create_panel")?;

        if let Some(existing) = self.panels.iter().find(|p| p.tab == tab && p.name == panel) {
            return Ok(existing.handle);
        }

        let handle = PanelHandle(self.allocate());
        self.panels.push(PanelRecord {
            handle,
            tab: tab.to_string(),
            name: panel.to_string(),
        });
        Ok(handle)
    }

    fn add_or_get_group(
        &mut self,
        panel: PanelHandle,
        key: &str,
        display_name: &str,
    ) -> HostResult<(GroupHandle, bool)> {
        self.check(FailurePoint::AddGroup, "add_or_get_group")?;
        self.panel(panel)?;

        if let Some(existing) = self.groups.iter().find(|g| g.panel == panel && g.key == key) {
            return Ok((existing.handle, false));
        }

        let handle = GroupHandle(self.allocate());
        self.groups.push(GroupRecord {
            handle,
            panel,
            key: key.to_string(),
            display_name: display_name.to_string(),
            properties: Vec::new(),
        });
        Ok((handle, true))
    }

    fn add_button(
        &mut self,
        parent: ButtonParent,
        key: &str,
        display_name: &str,
    ) -> HostResult<ButtonHandle> {
        self.check(FailurePoint::AddButton, "add_button")?;

        if self.buttons.iter().any(|b| b.key == key) {
            return Err(HostError::new(
                "add_button",
                format!("button '{}' already exists", key),
            ));
        }

        let panel = self.panel_of(parent)?;
        let command_id = HostCommandId(format!(
            "CustomCtrl_%CustomCtrl_%{}%{}%{}",
            panel.tab, panel.name, key
        ));

        let handle = ButtonHandle(self.allocate());
        self.buttons.push(ButtonRecord {
            handle,
            parent,
            key: key.to_string(),
            display_name: display_name.to_string(),
            command_id,
            properties: Vec::new(),
        });
        Ok(handle)
    }

    fn command_id(&self, button: ButtonHandle) -> HostResult<HostCommandId> {
        self.check(FailurePoint::CommandId, "command_id")?;
        self.buttons
            .iter()
            .find(|b| b.handle == button)
            .map(|b| b.command_id.clone())
            .ok_or_else(|| HostError::new("command_id", format!("{:?} not found", button)))
    }

    fn set_property(&mut self, item: ItemHandle, property: ItemProperty, value: &str) -> HostResult<()> {
        self.check(FailurePoint::Property(property), "set_property")?;

        let properties = match item {
            ItemHandle::Button(handle) => self
                .buttons
                .iter_mut()
                .find(|b| b.handle == handle)
                .map(|b| &mut b.properties),
            ItemHandle::Group(handle) => self
                .groups
                .iter_mut()
                .find(|g| g.handle == handle)
                .map(|g| &mut g.properties),
        }
        .ok_or_else(|| HostError::new("set_property", format!("{:?} not found", item)))?;

        properties.push((property, value.to_string()));
        Ok(())
    }
}
