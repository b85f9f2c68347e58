use std::path::PathBuf;

use clap::Parser;
use facet_search::{
    read_config, FacetSelections, FacetedSearch, HttpSearchBackend, SearchOutcome, SearchRequest,
    TenantId,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "search-cli", about = "Run a faceted search against the index")]
struct Opts {
    /// Free text to search for
    #[arg(default_value = "")]
    text: String,

    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    page: u32,

    /// Results per page (defaults to `search.default_page_size`)
    #[arg(long)]
    size: Option<u32>,

    /// Facet selections as JSON, e.g. '{"brand":"Acme","color":{"or":["red","blue"]}}'
    #[arg(long)]
    facets: Option<String>,

    /// Sort by date instead of relevance
    #[arg(long)]
    by_date: bool,

    /// Tenant the search is made from
    #[arg(long)]
    tenant: Option<String>,

    /// Directory holding base.yaml and the environment overrides
    #[arg(long, default_value = "facet-search/config")]
    config_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename(".env.local").ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facet_search=info,search_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let opts = Opts::parse();

    let settings = read_config(&opts.config_dir)
        .map_err(|e| anyhow::anyhow!("Error reading config from {:?}: {}", opts.config_dir, e))?;

    let facets: FacetSelections = match &opts.facets {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("Error parsing --facets: {}", e))?,
        None => FacetSelections::new(),
    };

    let page_size = opts.size.unwrap_or(settings.search.default_page_size);
    let mut request = SearchRequest::new(opts.text)
        .page(opts.page, page_size)
        .facets(facets)
        .sort_by_date(opts.by_date);
    if let Some(tenant) = opts.tenant {
        request = request.tenant(TenantId::new(tenant));
    }

    let backend = HttpSearchBackend::new(&settings.backend, &settings.search.tenant)?;
    let search = FacetedSearch::new(backend, settings.catalog, settings.search);

    match search.search(&request).await? {
        SearchOutcome::Found(results) => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        SearchOutcome::Empty => {
            tracing::info!("nothing to search for");
        }
        SearchOutcome::Disabled => {
            tracing::warn!("search is disabled in the catalog");
        }
        SearchOutcome::Unavailable(e) => {
            anyhow::bail!("Search backend unavailable: {}", e);
        }
    }

    Ok(())
}
