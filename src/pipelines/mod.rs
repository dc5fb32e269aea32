pub mod harvest;
pub mod images;

pub use harvest::{canonicalize_source_url, HarvestReport, Harvester};
pub use images::{
    classify_extension, slugify, CacheMode, ImageCache, ImageCacheOptions, SlugAllocator,
};
