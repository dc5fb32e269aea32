use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use recipe_harvest::output::{self, RecipeDataset};
use recipe_harvest::pipelines::{CacheMode, ImageCache, ImageCacheOptions};
use recipe_harvest::{harvest_pdf, HarvestConfig, RequestFetcher};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recipe-harvest")]
#[command(about = "Harvest recipe records from a PDF of recipe links", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract recipes from the links listed in a PDF
    Extract {
        /// PDF export of the recipe link list
        pdf: PathBuf,
        /// Where to write the recipe dataset
        #[arg(short, long, default_value = "recipes_from_pdf.json")]
        output: PathBuf,
    },
    /// Download recipe images and point the dataset at the local copies
    CacheImages {
        /// Recipe dataset to read
        #[arg(long, default_value = "recipes.json")]
        recipes_file: PathBuf,
        /// Where to write the updated dataset (default: overwrite the recipes file)
        #[arg(long)]
        output_file: Option<PathBuf>,
        /// Directory for cached images (default: from configuration)
        #[arg(long)]
        image_dir: Option<PathBuf>,
        /// Resolve preview images from each recipe's source page
        #[arg(long)]
        from_source: bool,
        /// Reuse images that are already cached
        #[arg(long)]
        skip_existing: bool,
        /// Report planned downloads without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = HarvestConfig::load()?;

    match cli.command {
        Commands::Extract { pdf, output } => {
            let mut report = harvest_pdf(&pdf, &config).await?;
            let failures = std::mem::take(&mut report.failures);
            let dataset = RecipeDataset::from_report(&pdf.to_string_lossy(), report);

            if let Some(path) = output::write_documents(&dataset, failures, &output)? {
                warn!("Some items failed, see {}", path.display());
            }
        }
        Commands::CacheImages {
            recipes_file,
            output_file,
            image_dir,
            from_source,
            skip_existing,
            dry_run,
        } => {
            let mut options = ImageCacheOptions::from_config(&config.images);
            if let Some(image_dir) = image_dir {
                options.image_dir = image_dir;
            }
            options.mode = if from_source {
                CacheMode::Preview
            } else {
                CacheMode::Direct
            };
            options.skip_existing = skip_existing;
            options.dry_run = dry_run;

            let mut dataset = RecipeDataset::read(&recipes_file)?;
            let fetcher = RequestFetcher::new(Some(config.request_timeout()), &config.user_agent)?;
            let changed = ImageCache::new(fetcher, options)
                .cache(&mut dataset.recipes)
                .await?;

            if dry_run {
                return Ok(());
            }
            if changed {
                let output_file = output_file.unwrap_or(recipes_file);
                dataset.write(&output_file)?;
            } else {
                info!("No changes made.");
            }
        }
    }

    Ok(())
}
