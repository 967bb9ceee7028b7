//! Command-line front end for the mehndi catalog
//!
//! Loads the catalog configuration, fetches the sheets it names and prints
//! what the website's gallery, carousel and services pages would render.

mod render;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use mehndi_core::{
    CatalogCache, CatalogConfig, CatalogFetcher, CatalogImageRecord, CatalogView, ConfigLoader,
    Phase, ReadModel, ServiceRecord, ServiceTabs,
};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Browse the mehndi design catalog")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(
        long,
        short,
        default_value = "mehndi.yaml",
        help = "Configuration source: file path or URL"
    )]
    config: String,

    #[clap(long, short, help = "Log level (overrides logging.level from the configuration)")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one page of the design gallery
    Gallery {
        #[clap(long, help = "Category key, or 'all'")]
        category: Option<String>,

        #[clap(long, default_value_t = 1)]
        page: usize,
    },
    /// Print the carousel window and its current slide
    Carousel {
        #[clap(long, help = "Category key, or 'all'")]
        category: Option<String>,

        #[clap(
            long,
            allow_hyphen_values = true,
            help = "Move the carousel by DELTA slides (repeatable)"
        )]
        advance: Vec<i64>,
    },
    /// Print the service package and gallery for a service type
    Services {
        #[clap(long)]
        tab: Option<String>,
    },
    /// List the gallery tabs with their record counts
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::from_source(&cli.config).await?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let log_level_filter = level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();
    log::info!("Configuration loaded from {}", cli.config);

    let cache = CatalogCache::new(CatalogFetcher::from_config(&config)?);

    match cli.command {
        Commands::Gallery { category, page } => gallery(&config, &cache, category, page).await,
        Commands::Carousel { category, advance } => {
            carousel(&config, &cache, category, &advance).await
        }
        Commands::Services { tab } => services(&config, &cache, tab).await,
        Commands::Categories => categories(&config, &cache).await,
    }
}

/// Mount an image view, fetch, and apply the requested category.
async fn image_view(
    config: &CatalogConfig,
    cache: &CatalogCache,
    category: Option<String>,
) -> Result<CatalogView<CatalogImageRecord>> {
    let view = CatalogView::mount(cache, config.gallery.carousel_size);
    view.refresh().await;
    ensure_ready(&view.snapshot())?;
    if let Some(category) = category {
        view.select_category(&category);
    }
    Ok(view)
}

fn ensure_ready<R: Clone>(model: &ReadModel<R>) -> Result<()> {
    match (model.phase, &model.error) {
        (Phase::Ready, _) => Ok(()),
        (phase, Some(error)) => bail!("catalog {}: {}", phase, error),
        (phase, None) => bail!("catalog {}", phase),
    }
}

async fn gallery(
    config: &CatalogConfig,
    cache: &CatalogCache,
    category: Option<String>,
    page: usize,
) -> Result<()> {
    let view = image_view(config, cache, category).await?;
    let model = view.snapshot();
    let page = model.page(page, config.gallery.page_size);
    print!("{}", render::gallery_page(&model.active_category, &page));
    Ok(())
}

async fn carousel(
    config: &CatalogConfig,
    cache: &CatalogCache,
    category: Option<String>,
    advance: &[i64],
) -> Result<()> {
    let view = image_view(config, cache, category).await?;
    for delta in advance {
        view.advance(*delta);
    }
    print!("{}", render::carousel(&view.snapshot()));
    Ok(())
}

async fn services(config: &CatalogConfig, cache: &CatalogCache, tab: Option<String>) -> Result<()> {
    let service_view = CatalogView::<ServiceRecord>::mount(cache, config.gallery.carousel_size);
    let image_view =
        CatalogView::<CatalogImageRecord>::mount(cache, config.gallery.carousel_size);

    tokio::join!(service_view.refresh(), image_view.refresh());
    ensure_ready(&service_view.snapshot())?;
    ensure_ready(&image_view.snapshot())?;

    let (Some(services), Some(images)) = (service_view.index(), image_view.index()) else {
        bail!("catalog data unavailable");
    };
    let mut tabs = ServiceTabs::new(
        config.services.tabs(),
        &config.services.default_tab(),
        services,
        images,
    );
    if let Some(tab) = tab {
        tabs.select_tab(&tab);
    }
    print!("{}", render::service_tab(tabs.tabs(), &tabs.snapshot()));
    Ok(())
}

async fn categories(config: &CatalogConfig, cache: &CatalogCache) -> Result<()> {
    let view = CatalogView::<CatalogImageRecord>::mount(cache, config.gallery.carousel_size);
    view.refresh().await;
    ensure_ready(&view.snapshot())?;

    let Some(index) = view.index() else {
        bail!("catalog data unavailable");
    };
    print!("{}", render::category_counts(&config.gallery_tabs(), &index));
    Ok(())
}
