use crate::config::ImagesConfig;
use crate::error::HarvestError;
use crate::model::RecipeDraft;
use crate::url_to_text::fetchers::Fetcher;
use crate::url_to_text::html::meta::PREVIEW_IMAGE_CANDIDATES;
use crate::url_to_text::html::MetaDocument;
use log::{debug, info, warn};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

pub const DEFAULT_EXTENSION: &str = ".jpg";
const SLUG_MAX_CHARS: usize = 60;

const URL_EXTENSIONS: [(&str, &str); 6] = [
    ("jpg", ".jpg"),
    ("jpeg", ".jpg"),
    ("png", ".png"),
    ("gif", ".gif"),
    ("webp", ".webp"),
    ("avif", ".avif"),
];

const MIME_EXTENSIONS: [(&str, &str); 11] = [
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/pjpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/avif", ".avif"),
    ("image/svg+xml", ".svg"),
    ("image/bmp", ".bmp"),
    ("image/tiff", ".tiff"),
    ("image/x-icon", ".ico"),
];

/// Pick a file extension for an image.
///
/// A known image suffix on the URL path wins, then the MIME type, then `.jpg`.
pub fn classify_extension(url: &str, content_type: Option<&str>) -> &'static str {
    let from_url = url_path(url)
        .and_then(|path| {
            Path::new(&path)
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
        })
        .and_then(|ext| {
            URL_EXTENSIONS
                .iter()
                .find(|(suffix, _)| *suffix == ext)
                .map(|(_, extension)| *extension)
        });
    if let Some(extension) = from_url {
        return extension;
    }

    content_type
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().to_lowercase())
        .and_then(|mime| {
            MIME_EXTENSIONS
                .iter()
                .find(|(known, _)| *known == mime)
                .map(|(_, extension)| *extension)
        })
        .unwrap_or(DEFAULT_EXTENSION)
}

fn url_path(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed.path().to_string()),
        Err(_) => url.split(['?', '#']).next().map(String::from),
    }
}

/// File-name-safe slug for a recipe title.
///
/// Titles with no usable characters get a stable hash-based name.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let replaced = NON_SLUG_CHARS.replace_all(&lower, "-");
    let slug = replaced.trim_matches('-');

    if slug.is_empty() {
        let digest = Sha256::digest(title.as_bytes());
        let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
        return format!("recipe-{}", &hex[..10]);
    }
    slug.chars().take(SLUG_MAX_CHARS).collect()
}

/// Hands out unique slugs within one run: the n-th repeat of a slug gets `-n`.
#[derive(Debug, Default)]
pub struct SlugAllocator {
    counts: HashMap<String, usize>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, slug: &str) -> String {
        let count = self.counts.entry(slug.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            slug.to_string()
        } else {
            format!("{slug}-{count}")
        }
    }
}

/// Root-relative URL for a file below the public root, e.g. `/images/recipes/soup.jpg`.
pub fn public_path(path: &Path, public_root: &Path) -> Option<String> {
    let relative = path.strip_prefix(public_root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(format!("/{}", parts.join("/")))
}

/// Where cached images come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Download each record's current `imageUrl`
    #[default]
    Direct,
    /// Resolve a preview image from each record's `sourceUrl` page
    Preview,
}

#[derive(Debug, Clone)]
pub struct ImageCacheOptions {
    pub image_dir: PathBuf,
    pub public_root: PathBuf,
    pub mode: CacheMode,
    /// Reuse target files that already exist
    pub skip_existing: bool,
    /// Only log what would be downloaded
    pub dry_run: bool,
}

impl ImageCacheOptions {
    pub fn from_config(config: &ImagesConfig) -> Self {
        Self {
            image_dir: PathBuf::from(&config.image_dir),
            public_root: PathBuf::from(&config.public_root),
            mode: CacheMode::default(),
            skip_existing: false,
            dry_run: false,
        }
    }
}

/// Result of placing one image in the cache.
enum Stored {
    /// The target file was already there
    Existing(PathBuf),
    /// Dry run; nothing was written
    Planned,
    Downloaded(PathBuf),
}

/// Downloads recipe images into a local directory and points the records at
/// the local copies.
pub struct ImageCache<F: Fetcher> {
    fetcher: F,
    options: ImageCacheOptions,
}

impl<F: Fetcher> ImageCache<F> {
    pub fn new(fetcher: F, options: ImageCacheOptions) -> Self {
        Self { fetcher, options }
    }

    /// Cache images for every record.
    ///
    /// Returns whether any record changed. Per-record problems are logged and
    /// skipped; only failing to create the image directory is an error.
    pub async fn cache(&self, recipes: &mut [RecipeDraft]) -> Result<bool, HarvestError> {
        if !self.options.dry_run {
            tokio::fs::create_dir_all(&self.options.image_dir).await?;
        }

        let mut slugs = SlugAllocator::new();
        let mut changed = false;
        for recipe in recipes.iter_mut() {
            changed |= match self.options.mode {
                CacheMode::Direct => self.cache_direct(recipe, &mut slugs).await,
                CacheMode::Preview => self.cache_preview(recipe, &mut slugs).await,
            };
        }

        Ok(changed)
    }

    async fn cache_direct(&self, recipe: &mut RecipeDraft, slugs: &mut SlugAllocator) -> bool {
        let image_url = recipe.image_url.trim().to_string();
        if !is_remote(&image_url) {
            return false;
        }
        let slug = slugs.allocate(&slugify(slug_source(&recipe.title)));

        match self.store(&slug, &image_url, None).await {
            Ok(Stored::Existing(path)) | Ok(Stored::Downloaded(path)) => self.rewrite(recipe, &path),
            Ok(Stored::Planned) => false,
            Err(err) => {
                warn!("Failed to cache {}: {}", image_url, err);
                false
            }
        }
    }

    async fn cache_preview(&self, recipe: &mut RecipeDraft, slugs: &mut SlugAllocator) -> bool {
        let source_url = recipe.source_url.trim().to_string();
        if source_url.is_empty() {
            return false;
        }
        let slug = slugs.allocate(&slugify(slug_source(&recipe.title)));

        if self.options.skip_existing && recipe.image_url.trim().starts_with('/') {
            debug!("'{}' already has a local image", recipe.title);
            return false;
        }

        let fallback = recipe.image_url.trim().to_string();
        let (candidate, referer, label) = match self.resolve_preview(&source_url).await {
            Some((preview, page_url)) => (preview, page_url, "preview"),
            None if is_remote(&fallback) => (fallback, source_url.clone(), "fallback imageUrl"),
            None => {
                warn!("No image candidate for {}", source_url);
                return false;
            }
        };

        debug!("Using {} image {} for '{}'", label, candidate, recipe.title);
        match self.store(&slug, &candidate, Some(&referer)).await {
            Ok(Stored::Existing(path)) | Ok(Stored::Downloaded(path)) => self.rewrite(recipe, &path),
            Ok(Stored::Planned) => false,
            Err(err) => {
                warn!("No image cached for {} ({} {}): {}", source_url, label, candidate, err);
                false
            }
        }
    }

    /// Preview image URL and the final page URL it was resolved against.
    async fn resolve_preview(&self, source_url: &str) -> Option<(String, String)> {
        let page = match self.fetcher.fetch_text(source_url).await {
            Ok(page) => page,
            Err(err) => {
                warn!("Failed to fetch {}: {}", source_url, err);
                return None;
            }
        };

        let preview = MetaDocument::parse(&page.body, page.url.as_str())
            .image_url(PREVIEW_IMAGE_CANDIDATES)?;
        Some((preview, page.url))
    }

    async fn store(&self, slug: &str, url: &str, referer: Option<&str>) -> Result<Stored, HarvestError> {
        let target = self.target_path(slug, classify_extension(url, None));

        if self.options.skip_existing && tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!("Reusing {}", target.display());
            return Ok(Stored::Existing(target));
        }
        if self.options.dry_run {
            info!("[dry-run] Would download {} -> {}", url, target.display());
            return Ok(Stored::Planned);
        }

        let fetched = self.fetcher.fetch_bytes(url, referer).await?;
        let target = self.target_path(slug, classify_extension(url, fetched.content_type.as_deref()));
        tokio::fs::write(&target, &fetched.bytes).await?;

        info!("Downloaded {} -> {}", url, target.display());
        Ok(Stored::Downloaded(target))
    }

    fn target_path(&self, slug: &str, extension: &str) -> PathBuf {
        self.options.image_dir.join(format!("{slug}{extension}"))
    }

    fn rewrite(&self, recipe: &mut RecipeDraft, path: &Path) -> bool {
        let new_url = public_path(path, &self.options.public_root)
            .unwrap_or_else(|| path.to_string_lossy().replace('\\', "/"));
        if recipe.image_url == new_url {
            return false;
        }
        recipe.image_url = new_url;
        true
    }
}

fn slug_source(title: &str) -> &str {
    let title = title.trim();
    if title.is_empty() {
        "recipe"
    } else {
        title
    }
}

/// Anything but empty, inline `data:` and already local `/` URLs.
fn is_remote(url: &str) -> bool {
    !url.is_empty() && !url.starts_with("data:") && !url.starts_with('/')
}
