//! CLI entry point for curve-site

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curve_site::commands;
use curve_site::content::DocumentKind;
use curve_site::router::Tenant;
use curve_site::Site;

#[derive(Parser)]
#[command(name = "curve-site")]
#[command(version)]
#[command(about = "Serve the main site and The Curve from one content repository", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to the configured address)
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// List posts and reports
    List {
        /// Kind of content to list (post, report, all)
        #[arg(default_value = "all")]
        r#type: String,
    },

    /// Render a single document
    Render {
        /// Document kind (post, report)
        kind: DocumentKind,

        /// Document slug
        slug: String,

        /// Print the structured page data as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },

    /// Show a tenant's spotlight listing
    Spotlight {
        /// Tenant (main, conference)
        #[arg(short, long, default_value = "main")]
        tenant: Tenant,
    },

    /// Create a new post or report
    New {
        /// Title of the new document
        #[arg(required_unless_present = "from_url")]
        title: Option<String>,

        /// Import title, subtitle, author and date from a published article;
        /// explicit options take precedence
        #[arg(long, value_name = "URL")]
        from_url: Option<String>,

        /// Image to crop to 4:3 and save as the post header
        #[arg(long, value_name = "PATH")]
        header: Option<PathBuf>,

        /// Slug (defaults to the slugified title)
        #[arg(short, long)]
        slug: Option<String>,

        /// Subtitle
        #[arg(long)]
        subtitle: Option<String>,

        /// Author, may be repeated
        #[arg(short, long = "author")]
        authors: Vec<String>,

        /// Publication date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Create a report instead of a post
        #[arg(long)]
        report: bool,

        /// Feature the post on the main landing page
        #[arg(long)]
        spotlight: bool,
    },

    /// Crop an image into an existing post's header
    Header {
        /// Post slug
        slug: String,

        /// Source image
        image: PathBuf,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "curve_site=debug,tower_http=debug,info"
    } else {
        "curve_site=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = Site::new(&base_dir)?;
            let port = port.unwrap_or(site.config.server.port);
            let ip = ip.unwrap_or_else(|| site.config.server.ip.clone());
            site.serve(&ip, port).await?;
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            let kinds = match r#type.as_str() {
                "all" => DocumentKind::ALL.to_vec(),
                other => vec![other.parse::<DocumentKind>()?],
            };
            site.list(&kinds).await?;
        }

        Commands::Render { kind, slug, json } => {
            let site = Site::new(&base_dir)?;
            commands::render::run(&site, kind, &slug, json).await?;
        }

        Commands::Spotlight { tenant } => {
            let site = Site::new(&base_dir)?;
            commands::spotlight::run(&site, tenant).await?;
        }

        Commands::New {
            title,
            from_url,
            header,
            slug,
            subtitle,
            mut authors,
            date,
            report,
            spotlight,
        } => {
            let site = Site::new(&base_dir)?;
            let kind = if report {
                DocumentKind::Report
            } else {
                DocumentKind::Post
            };

            let article = match from_url {
                Some(url) => commands::extract::fetch_article(&url).await?,
                None => commands::extract::ArticleInfo::default(),
            };
            let Some(title) = title.or(article.title) else {
                anyhow::bail!("No title given and none found on the page");
            };
            let slug = slug.or_else(|| Some(article.slug).filter(|s| !s.is_empty()));
            let subtitle = subtitle.or(article.subtitle);
            if authors.is_empty() {
                authors.extend(article.author);
            }

            tracing::info!("Creating new {} with title: {}", kind, title);
            commands::new::create_document(
                &site,
                &commands::new::NewDocument {
                    kind,
                    title: &title,
                    slug: slug.as_deref(),
                    subtitle: subtitle.as_deref(),
                    authors: &authors,
                    date: date.or(article.date),
                    spotlight,
                    header: header.as_deref(),
                },
            )?;
        }

        Commands::Header { slug, image } => {
            let site = Site::new(&base_dir)?;
            commands::header::run(&site, &slug, &image)?;
        }

        Commands::Version => {
            println!("curve-site version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
