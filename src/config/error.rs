use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件失败 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("序列化配置失败: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("配置验证失败: {field} - {message}")]
    Validation { field: String, message: String },
    #[error("配置管理器已经初始化")]
    AlreadyInitialized,
}

impl ConfigError {
    pub fn validation<S1: Into<String>, S2: Into<String>>(field: S1, message: S2) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
