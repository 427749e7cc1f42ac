//! 模块启动集成测试
//!
//! 覆盖标记文件清理、结构性失败中止启动以及命令表的一次性发布

#[cfg(test)]
mod startup_tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ribbonkit::command::{Command, CommandDeclaration, CommandModule, MetadataEntry};
    use ribbonkit::registry::{store, FailurePoint, RegistryError};
    use ribbonkit::{
        AppResult, ExecutionBridge, ExecutionContext, FrameworkConfig, InMemoryRibbon, PluginApp,
        SetupError,
    };
    use serial_test::serial;
    use tempfile::TempDir;

    static INVOKED: AtomicUsize = AtomicUsize::new(0);

    struct Count;

    impl Command for Count {
        fn execute_main(&mut self, _ctx: &mut ExecutionContext) -> AppResult<()> {
            INVOKED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn module() -> CommandModule {
        CommandModule::new("StartupDemo")
            .command(
                CommandDeclaration::new("Count", || Count)
                    .metadata(MetadataEntry::new().panel("Commands").name("Count")),
            )
            .command(CommandDeclaration::new("Other", || Count).priority(2))
    }

    fn app_in(dir: &TempDir, clear_marker_file: bool) -> PluginApp {
        let mut config = FrameworkConfig::default();
        config.startup.data_dir = Some(dir.path().to_path_buf());
        config.startup.clear_marker_file = clear_marker_file;
        PluginApp::new(module(), config)
    }

    #[test]
    fn test_marker_file_is_removed_on_startup() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir, true);
        let marker = app.marker_file().unwrap();
        assert_eq!(marker, dir.path().join("StartupDemo.txt"));
        fs::write(&marker, "first run").unwrap();

        let mut host = InMemoryRibbon::new();
        let table = app.on_startup(&mut host).unwrap();

        assert_eq!(table.len(), 2);
        assert!(!marker.exists());
    }

    #[test]
    fn test_missing_marker_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir, true);

        assert!(!app.clear_marker_file());
        let mut host = InMemoryRibbon::new();
        assert!(app.on_startup(&mut host).is_ok());
    }

    #[test]
    fn test_marker_file_kept_when_disabled() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir, false);
        let marker = app.marker_file().unwrap();
        fs::write(&marker, "keep").unwrap();

        let mut host = InMemoryRibbon::new();
        app.on_startup(&mut host).unwrap();
        assert!(marker.exists());

        assert!(app.clear_marker_file());
        assert!(!marker.exists());
    }

    #[test]
    fn test_structural_failure_aborts_startup() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir, true);
        let marker = app.marker_file().unwrap();
        fs::write(&marker, "untouched").unwrap();

        let mut host = InMemoryRibbon::new();
        host.inject_failure(FailurePoint::AddButton);
        let err = app.on_startup(&mut host).unwrap_err();

        assert!(matches!(
            err,
            SetupError::Registration(RegistryError::Structural { .. })
        ));
        // 启动中止时不清理标记文件
        assert!(marker.exists());
    }

    #[test]
    fn test_invalid_config_aborts_startup() {
        let dir = TempDir::new().unwrap();
        let mut config = FrameworkConfig::default();
        config.startup.data_dir = Some(dir.path().to_path_buf());
        config.ribbon.default_panel = "  ".to_string();
        let app = PluginApp::new(module(), config);

        let mut host = InMemoryRibbon::new();
        let err = app.on_startup(&mut host).unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
        assert!(host.panels().is_empty());
    }

    #[test]
    #[serial]
    fn test_start_publishes_once_and_invokes() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir, true);
        let mut host = InMemoryRibbon::new();

        let table = app.start(&mut host).unwrap();
        assert!(store::is_published("StartupDemo"));
        assert_eq!(store::lookup("Count"), table.lookup("Count").cloned());

        let id = table.lookup("Count").cloned().unwrap();
        let entry = table.by_host_id(&id).unwrap();
        assert_eq!(entry.panel, "Commands");
        assert_eq!(entry.module, "StartupDemo");

        let bridge = ExecutionBridge::new(app.config());
        let before = INVOKED.load(Ordering::SeqCst);
        table.invoke(&id, &bridge).unwrap();
        assert_eq!(INVOKED.load(Ordering::SeqCst), before + 1);
        bridge.shutdown();

        let buttons = host.buttons().len();
        let again = app.start(&mut host).unwrap_err();
        assert!(matches!(
            again,
            SetupError::Registration(RegistryError::AlreadyPublished { ref module })
                if module == "StartupDemo"
        ));
        // 重复启动不会再次创建按钮
        assert_eq!(host.buttons().len(), buttons);
    }

    #[test]
    #[serial]
    fn test_two_modules_start_in_one_process() {
        let dir = TempDir::new().unwrap();
        let mut config = FrameworkConfig::default();
        config.startup.data_dir = Some(dir.path().to_path_buf());

        let walls = CommandModule::new("WallTools")
            .command(CommandDeclaration::new("OffsetWalls", || Count));
        let sheets = CommandModule::new("SheetTools")
            .command(CommandDeclaration::new("RenumberSheets", || Count))
            .command(CommandDeclaration::new("PrintSheets", || Count));

        let mut host = InMemoryRibbon::new();
        let first = PluginApp::new(walls, config.clone()).start(&mut host).unwrap();
        let second = PluginApp::new(sheets, config).start(&mut host).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);

        let modules = store::modules();
        assert!(modules.contains(&"WallTools".to_string()));
        assert!(modules.contains(&"SheetTools".to_string()));

        let walls_id = store::lookup("OffsetWalls").unwrap();
        let sheets_id = store::lookup("RenumberSheets").unwrap();
        assert_ne!(walls_id, sheets_id);

        let (table, entry) = store::find_by_host_id(&sheets_id).unwrap();
        assert_eq!(entry.module, "SheetTools");
        assert_eq!(table.len(), 2);

        let bridge = ExecutionBridge::new(&FrameworkConfig::default());
        let before = INVOKED.load(Ordering::SeqCst);
        table.invoke(&sheets_id, &bridge).unwrap();
        assert_eq!(INVOKED.load(Ordering::SeqCst), before + 1);
    }
}
