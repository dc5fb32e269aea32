use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main harvest configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct HarvestConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Title/link pairing configuration
    #[serde(default)]
    pub pairer: PairerConfig,
    /// Description segmentation configuration
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    /// Image cache configuration
    #[serde(default)]
    pub images: ImagesConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            pairer: PairerConfig::default(),
            segmenter: SegmenterConfig::default(),
            images: ImagesConfig::default(),
        }
    }
}

/// Configuration for reading title/link pairs out of the PDF
#[derive(Debug, Deserialize, Clone)]
pub struct PairerConfig {
    /// Running header/footer labels (compared lower-cased)
    #[serde(default = "default_footer_labels")]
    pub footer_labels: Vec<String>,
}

impl Default for PairerConfig {
    fn default() -> Self {
        Self {
            footer_labels: default_footer_labels(),
        }
    }
}

/// Configuration for splitting descriptions into ingredients and steps
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SegmenterConfig {
    /// Upper bound on a step's length when unmarked lines are merged into it.
    /// Unset means unbounded.
    #[serde(default)]
    pub max_continuation_chars: Option<usize>,
}

/// Configuration for the local image cache
#[derive(Debug, Deserialize, Clone)]
pub struct ImagesConfig {
    /// Directory cached images are written to
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
    /// Directory served as the site root; files below it get root-relative URLs
    #[serde(default = "default_public_root")]
    pub public_root: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            public_root: default_public_root(),
        }
    }
}

// Default value functions
fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0 Safari/537.36"
        .to_string()
}

fn default_footer_labels() -> Vec<String> {
    vec!["recipes".to_string(), "recipies".to_string()]
}

fn default_image_dir() -> String {
    "public/images/recipes".to_string()
}

fn default_public_root() -> String {
    "public".to_string()
}

impl HarvestConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_HARVEST__ prefix
    /// 2. harvest.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_HARVEST__SEGMENTER__MAX_CONTINUATION_CHARS
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Load configuration from file and environment variables
///
/// See [`HarvestConfig::load`] for the layering order.
pub fn load_config() -> Result<HarvestConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("harvest").required(false))
        // Use double underscore for nested: RECIPE_HARVEST__IMAGES__IMAGE_DIR
        .add_source(
            Environment::with_prefix("RECIPE_HARVEST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
