//! 命令注册测试
//!
//! 覆盖优先级顺序、元数据合并、按钮组归并、外观属性容错与命令表发布

#[cfg(test)]
mod registry_tests {
    use ribbonkit::command::{
        Command, CommandDeclaration, CommandModule, GroupDeclaration, MetadataEntry,
    };
    use ribbonkit::config::RibbonConfig;
    use ribbonkit::registry::{
        group_key, store, ButtonParent, CommandRegistry, FailurePoint, InMemoryRibbon,
        ItemProperty, RegistryError, RibbonHost,
    };
    use ribbonkit::{AppResult, ExecutionContext};
    use serial_test::serial;

    struct Noop;

    impl Command for Noop {
        fn execute_main(&mut self, _ctx: &mut ExecutionContext) -> AppResult<()> {
            Ok(())
        }
    }

    fn registry() -> CommandRegistry {
        CommandRegistry::new(RibbonConfig::default())
    }

    #[test]
    fn test_priority_order_on_default_panel() {
        let module = CommandModule::new("Tests")
            .command(CommandDeclaration::new("Late", || Noop).priority(5))
            .command(CommandDeclaration::new("Early", || Noop).priority(1));

        let mut host = InMemoryRibbon::new();
        let mut registry = registry();
        let entries = registry.register_module(&mut host, &module).unwrap();

        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Early", "Late"]);

        let on_panel: Vec<_> = host
            .panel_buttons("Default")
            .into_iter()
            .map(|b| b.key.as_str())
            .collect();
        assert_eq!(on_panel, vec!["Early", "Late"]);
        assert!(entries.iter().all(|e| e.panel == "Default" && e.group.is_none()));
        assert_eq!(host.panels().len(), 1);
        assert_eq!(host.panels()[0].tab, "Tests");
    }

    #[test]
    fn test_panel_resolves_past_null_and_empty_entries() {
        let module = CommandModule::new("Tests").command(
            CommandDeclaration::new("CommandEasy", || Noop)
                .metadata(MetadataEntry::default())
                .metadata(MetadataEntry::new().panel(""))
                .metadata(MetadataEntry::new().panel("Commands")),
        );

        let mut host = InMemoryRibbon::new();
        let entries = registry().register_module(&mut host, &module).unwrap();

        assert_eq!(entries[0].panel, "Commands");
        assert_eq!(entries[0].display_name, "CommandEasy");
        assert_eq!(host.panel_buttons("Commands").len(), 1);
        assert!(host.panel_named("Default").is_none());
    }

    #[test]
    fn test_pulldown_group_is_shared_and_decorated_once() {
        let module = CommandModule::new("Tests")
            .command(
                CommandDeclaration::new("First", || Noop)
                    .metadata(MetadataEntry::new().panel("Batch").pulldown("Walls")),
            )
            .command(
                CommandDeclaration::new("Second", || Noop)
                    .metadata(MetadataEntry::new().panel("Batch").pulldown("Walls")),
            )
            .group(GroupDeclaration::new(
                "Walls",
                MetadataEntry::new()
                    .image("Icons/walls16.png")
                    .tooltip("墙体工具"),
            ));

        let mut host = InMemoryRibbon::new();
        let entries = registry().register_module(&mut host, &module).unwrap();

        let key = group_key("Tests", "Walls");
        assert_eq!(key, "Tests:Walls");
        assert_eq!(host.groups().len(), 1);
        assert!(entries.iter().all(|e| e.group.as_deref() == Some(key.as_str())));

        let group = host.group(&key).unwrap();
        assert_eq!(group.display_name, "Walls");
        assert_eq!(group.properties.len(), 2);
        assert_eq!(
            group.property(ItemProperty::Image),
            Some("/Tests;component/Icons/walls16.png")
        );
        assert_eq!(group.property(ItemProperty::Tooltip), Some("墙体工具"));

        let in_group: Vec<_> = host
            .group_buttons(&key)
            .into_iter()
            .map(|b| b.key.as_str())
            .collect();
        assert_eq!(in_group, vec!["First", "Second"]);
        assert!(host.panel_buttons("Batch").is_empty());
    }

    #[test]
    fn test_existing_group_is_not_redecorated() {
        let module = CommandModule::new("Tests")
            .command(
                CommandDeclaration::new("First", || Noop)
                    .metadata(MetadataEntry::new().pulldown("Walls")),
            )
            .group(GroupDeclaration::new(
                "Walls",
                MetadataEntry::new().tooltip("墙体工具"),
            ));

        let mut host = InMemoryRibbon::new();
        let panel = host.create_panel("Tests", "Default").unwrap();
        let (_, created) = host
            .add_or_get_group(panel, &group_key("Tests", "Walls"), "Walls")
            .unwrap();
        assert!(created);

        registry().register_module(&mut host, &module).unwrap();

        let group = host.group("Tests:Walls").unwrap();
        assert!(group.properties.is_empty());
        assert_eq!(host.group_buttons("Tests:Walls").len(), 1);
    }

    #[test]
    fn test_cosmetics_are_applied_in_order_with_resource_root() {
        let module = CommandModule::new("Tests").command(
            CommandDeclaration::new("CommandNormal", || Noop)
                .metadata(MetadataEntry::new().name("Normal One"))
                .metadata(MetadataEntry::new().image("Resources/Icons/RibbonIcon16.png"))
                .metadata(MetadataEntry::new().large_image("Resources/Icons/RibbonIcon32.png"))
                .metadata(MetadataEntry::new().url("https://help.example.com/normal"))
                .metadata(MetadataEntry::new().tooltip("普通命令"))
                .metadata(MetadataEntry::new().panel("Commands")),
        );

        let mut host = InMemoryRibbon::new();
        registry().register_module(&mut host, &module).unwrap();

        let button = host.button("CommandNormal").unwrap();
        assert_eq!(button.display_name, "Normal One");
        let kinds: Vec<_> = button.properties.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                ItemProperty::Image,
                ItemProperty::LargeImage,
                ItemProperty::HelpUrl,
                ItemProperty::Tooltip,
            ]
        );
        assert_eq!(
            button.property(ItemProperty::LargeImage),
            Some("/Tests;component/Resources/Icons/RibbonIcon32.png")
        );
        assert_eq!(
            button.property(ItemProperty::HelpUrl),
            Some("https://help.example.com/normal")
        );
    }

    #[test]
    fn test_cosmetic_failure_is_absorbed() {
        let module = CommandModule::new("Tests").command(
            CommandDeclaration::new("Cmd", || Noop).metadata(
                MetadataEntry::new()
                    .image("a.png")
                    .tooltip("提示")
                    .long_description("长描述"),
            ),
        );

        let mut host = InMemoryRibbon::new();
        host.inject_failure(FailurePoint::Property(ItemProperty::Tooltip));
        let entries = registry().register_module(&mut host, &module).unwrap();

        assert_eq!(entries.len(), 1);
        let button = host.button("Cmd").unwrap();
        assert!(button.property(ItemProperty::Tooltip).is_none());
        assert_eq!(button.property(ItemProperty::Image), Some("/Tests;component/a.png"));
        assert_eq!(button.property(ItemProperty::LongDescription), Some("长描述"));
    }

    #[test]
    fn test_structural_failure_aborts_module() {
        for point in [
            FailurePoint::CreatePanel,
            FailurePoint::AddButton,
            FailurePoint::CommandId,
        ] {
            let module =
                CommandModule::new("Tests").command(CommandDeclaration::new("Cmd", || Noop));
            let mut host = InMemoryRibbon::new();
            host.inject_failure(point);

            let err = registry().register_module(&mut host, &module).unwrap_err();
            assert!(err.is_structural(), "{:?} should be structural", point);
            assert!(matches!(err, RegistryError::Structural { ref key, .. } if key == "Cmd"));
        }

        let module = CommandModule::new("Tests").command(
            CommandDeclaration::new("Cmd", || Noop).metadata(MetadataEntry::new().pulldown("G")),
        );
        let mut host = InMemoryRibbon::new();
        host.inject_failure(FailurePoint::AddGroup);
        assert!(registry().register_module(&mut host, &module).is_err());
    }

    #[test]
    fn test_host_ids_map_keys() {
        let module = CommandModule::new("Tests")
            .command(CommandDeclaration::new("A", || Noop))
            .command(CommandDeclaration::new("", || Noop))
            .command(CommandDeclaration::new("B", || Noop).metadata(MetadataEntry::new().panel("P")));

        let mut host = InMemoryRibbon::new();
        let mut registry = registry();
        registry.register_module(&mut host, &module).unwrap();
        let table = registry.into_table();

        assert_eq!(table.len(), 2);
        for key in ["A", "B"] {
            let button = host.button(key).unwrap();
            assert_eq!(table.lookup(key), Some(&button.command_id));
            assert_eq!(
                table.by_host_id(&button.command_id).map(|e| e.key.as_str()),
                Some(key)
            );
        }
        assert!(matches!(
            host.button("B").unwrap().parent,
            ButtonParent::Panel(_)
        ));
    }

    #[test]
    #[serial]
    fn test_store_is_write_once_per_module() {
        let module = CommandModule::new("Tests").command(CommandDeclaration::new("A", || Noop));
        let mut host = InMemoryRibbon::new();
        let mut registry = registry();
        registry.register_module(&mut host, &module).unwrap();
        let expected = host.button("A").unwrap().command_id.clone();

        let table = store::publish("Tests", registry.into_table()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(store::is_published("Tests"));
        assert!(!store::is_published("Other"));
        assert_eq!(store::lookup("A"), Some(expected.clone()));
        assert_eq!(store::lookup("missing"), None);

        let (found, entry) = store::find_by_host_id(&expected).unwrap();
        assert_eq!(entry.key, "A");
        assert_eq!(found.len(), 1);

        let again = store::publish("Tests", Default::default());
        assert_eq!(
            again.unwrap_err(),
            RegistryError::AlreadyPublished {
                module: "Tests".to_string()
            }
        );
        assert_eq!(store::commands("Tests").map(|t| t.len()), Some(1));
    }
}
