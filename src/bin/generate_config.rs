//! 配置文件生成工具
//!
//! 把默认配置写入命令行指定的路径，未指定时写入用户配置目录。

use std::path::PathBuf;

use ribbonkit::config::{CONFIG_FILE_NAME, USER_CONFIG_DIR};
use ribbonkit::FrameworkConfig;

fn default_target() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_CONFIG_DIR).join(CONFIG_FILE_NAME))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let default_config = FrameworkConfig::default();
    default_config.validate()?;

    let toml_content = toml::to_string_pretty(&default_config)?;
    println!("=== 默认配置文件内容 ===");
    println!("{}", toml_content);

    let config_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => default_target().ok_or("无法获取配置目录")?,
    };

    if let Some(parent) = config_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&config_path, toml_content).await?;

    println!("\n=== 配置文件已保存到: {:?} ===", config_path);
    Ok(())
}
