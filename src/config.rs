use crate::error::ConfigError;

/// 未替换的 .env 模板占位值
const API_KEY_PLACEHOLDER: &str = "your_openai_api_key_here";

/// 选项数量不符时的处理策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptionStrictness {
    /// 补齐占位选项或截断多余选项
    #[default]
    Lenient,
    /// 选项数量不符的题目直接丢弃
    Strict,
}

impl OptionStrictness {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "lenient" => Some(OptionStrictness::Lenient),
            "strict" => Some(OptionStrictness::Strict),
            _ => None,
        }
    }
}

/// 程序配置
///
/// 每次请求开始时重新读取，以便 API Key 轮换后立即生效
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    // --- 图片生成配置 ---
    pub image_model: String,
    pub image_size: String,
    pub image_quality: String,
    /// 课程子技能 JSON 文件（不设置则使用内置表）
    pub curriculum_file: Option<String>,
    pub option_strictness: OptionStrictness,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_quality: "standard".to_string(),
            curriculum_file: None,
            option_strictness: OptionStrictness::Lenient,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("OPENAI_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("OPENAI_API_BASE").unwrap_or(default.llm_api_base_url),
            image_model: std::env::var("IMAGE_MODEL").unwrap_or(default.image_model),
            image_size: std::env::var("IMAGE_SIZE").unwrap_or(default.image_size),
            image_quality: std::env::var("IMAGE_QUALITY").unwrap_or(default.image_quality),
            curriculum_file: std::env::var("CURRICULUM_FILE").ok().filter(|v| !v.trim().is_empty()),
            option_strictness: std::env::var("OPTION_STRICTNESS").ok().and_then(|v| OptionStrictness::parse(&v)).unwrap_or(default.option_strictness),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 重新加载 .env 后读取环境变量（.env 中的值覆盖已有值）
    pub fn reload() -> Self {
        if let Err(e) = dotenvy::dotenv_override() {
            tracing::debug!("未加载 .env 文件: {}", e);
        }
        Self::from_env()
    }

    /// 获取可用的 API Key
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        let key = self.llm_api_key.trim();
        if key.is_empty() || key == API_KEY_PLACEHOLDER {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(key)
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            llm_api_key: "sk-test".to_string(),
            llm_api_base_url: "http://127.0.0.1:9/v1".to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_placeholder() {
        let mut config = Config::test_config();
        assert_eq!(config.api_key().unwrap(), "sk-test");

        config.llm_api_key = API_KEY_PLACEHOLDER.to_string();
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey)));

        config.llm_api_key = "   ".to_string();
        assert!(config.api_key().is_err());
    }

    #[test]
    fn test_option_strictness_parse() {
        assert_eq!(OptionStrictness::parse("Strict"), Some(OptionStrictness::Strict));
        assert_eq!(OptionStrictness::parse(" lenient "), Some(OptionStrictness::Lenient));
        assert_eq!(OptionStrictness::parse("loose"), None);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.image_model, "dall-e-3");
        assert_eq!(config.image_size, "1024x1024");
        assert_eq!(config.option_strictness, OptionStrictness::Lenient);
        assert!(config.curriculum_file.is_none());
    }
}
