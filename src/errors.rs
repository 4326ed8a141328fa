use std::fmt;

#[derive(Debug, Clone)]
pub enum ReferralError {
    Config(String),
    ProfileBackend(String),
    MalformedProfile(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    Clipboard(String),
    Share(String),
    QrCode(String),
}

impl ReferralError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ReferralError::Config(_) => "E001",
            ReferralError::ProfileBackend(_) => "E002",
            ReferralError::MalformedProfile(_) => "E003",
            ReferralError::FileOperation(_) => "E004",
            ReferralError::Validation(_) => "E005",
            ReferralError::NotFound(_) => "E006",
            ReferralError::Serialization(_) => "E007",
            ReferralError::Clipboard(_) => "E008",
            ReferralError::Share(_) => "E009",
            ReferralError::QrCode(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ReferralError::Config(_) => "Configuration Error",
            ReferralError::ProfileBackend(_) => "Profile Backend Error",
            ReferralError::MalformedProfile(_) => "Malformed Profile",
            ReferralError::FileOperation(_) => "File Operation Error",
            ReferralError::Validation(_) => "Validation Error",
            ReferralError::NotFound(_) => "Resource Not Found",
            ReferralError::Serialization(_) => "Serialization Error",
            ReferralError::Clipboard(_) => "Clipboard Error",
            ReferralError::Share(_) => "Share Error",
            ReferralError::QrCode(_) => "QR Code Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ReferralError::Config(msg)
            | ReferralError::ProfileBackend(msg)
            | ReferralError::MalformedProfile(msg)
            | ReferralError::FileOperation(msg)
            | ReferralError::Validation(msg)
            | ReferralError::NotFound(msg)
            | ReferralError::Serialization(msg)
            | ReferralError::Clipboard(msg)
            | ReferralError::Share(msg)
            | ReferralError::QrCode(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 serve 模式启动失败）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 子命令）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ReferralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ReferralError {}

// 便捷的构造函数
impl ReferralError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        ReferralError::Config(msg.into())
    }

    pub fn profile_backend<T: Into<String>>(msg: T) -> Self {
        ReferralError::ProfileBackend(msg.into())
    }

    pub fn malformed_profile<T: Into<String>>(msg: T) -> Self {
        ReferralError::MalformedProfile(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ReferralError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ReferralError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ReferralError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ReferralError::Serialization(msg.into())
    }

    pub fn clipboard<T: Into<String>>(msg: T) -> Self {
        ReferralError::Clipboard(msg.into())
    }

    pub fn share<T: Into<String>>(msg: T) -> Self {
        ReferralError::Share(msg.into())
    }

    pub fn qr_code<T: Into<String>>(msg: T) -> Self {
        ReferralError::QrCode(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for ReferralError {
    fn from(err: std::io::Error) -> Self {
        ReferralError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ReferralError {
    fn from(err: serde_json::Error) -> Self {
        ReferralError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for ReferralError {
    fn from(err: toml::ser::Error) -> Self {
        ReferralError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ReferralError {
    fn from(err: config::ConfigError) -> Self {
        ReferralError::Config(err.to_string())
    }
}

impl From<url::ParseError> for ReferralError {
    fn from(err: url::ParseError) -> Self {
        ReferralError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReferralError>;
