//! Square CLI
//!
//! Drive the Square interaction layer against a headless page.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use square_interact::{
    initialize, DataSource, HttpDataSource, InteractConfig, PageContext, Severity, SessionHandle,
    SimulatedTransport,
};
use square_platform::{LifecycleEvent, Page, PageEvent};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod site;

use site::DemoSite;

#[derive(Parser)]
#[command(name = "square")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Square site interaction layer", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted visit of the landing page
    Demo {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Visit with the reduced-motion preference set
        #[arg(long)]
        reduced_motion: bool,

        /// Run without the animation provider
        #[arg(long)]
        no_motion: bool,

        /// Make the contact form submission fail
        #[arg(long)]
        fail_submit: bool,

        /// Hydrate the page from this company data URL
        #[arg(long)]
        data_url: Option<String>,
    },

    /// Fetch and print company data
    Fetch {
        /// Company data URL
        #[arg(short, long)]
        url: String,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Demo {
            config,
            reduced_motion,
            no_motion,
            fail_submit,
            data_url,
        } => cmd_demo(
            config.as_deref(),
            reduced_motion,
            no_motion,
            fail_submit,
            data_url.as_deref(),
        ),

        Commands::Fetch { url } => cmd_fetch(&url),

        Commands::Config { config } => cmd_config(config.as_deref()),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<InteractConfig> {
    match path {
        Some(path) => InteractConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(InteractConfig::default()),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
}

fn cmd_demo(
    config: Option<&std::path::Path>,
    reduced_motion: bool,
    no_motion: bool,
    fail_submit: bool,
    data_url: Option<&str>,
) -> Result<()> {
    let config = load_config(config)?;
    let site = site::build(reduced_motion);

    let latency = config.forms.simulated_latency_ms;
    let transport = if fail_submit {
        SimulatedTransport::new(latency).failing()
    } else {
        SimulatedTransport::new(latency)
    };
    let mut context = PageContext::new(site.page.clone())
        .with_config(config)
        .with_transport(Rc::new(transport));
    if no_motion {
        context = context.without_motion();
    }

    let session = initialize(context);
    session.dispatch_all(site.page.drain_events());

    if let Some(url) = data_url {
        let source = HttpDataSource::new(url)?;
        let updated = runtime()?.block_on(session.hydrate(&source));
        info!("Hydrated {} element(s)", updated);
    }

    visit(&session, &site);
    report(&session, &site);

    session.dispose();
    Ok(())
}

/// Scripted visit: load, menu, scroll, hover, submit, leave
fn visit(session: &SessionHandle, site: &DemoSite) {
    let page = &site.page;

    session.dispatch(&PageEvent::Lifecycle(LifecycleEvent::Load));
    session.advance(1200);
    info!(
        "Hero title at {}ms: opacity={}",
        session.now(),
        page.style(site.title, "opacity").unwrap_or_else(|| "1".to_string())
    );

    session.dispatch(&PageEvent::click(site.toggle));
    info!("Menu open: {}", page.has_class(site.menu, "active"));
    session.dispatch(&PageEvent::click(site.toggle));

    for y in [150.0, 600.0, 1400.0, 2200.0, 3000.0, 3600.0] {
        session.dispatch_all(page.scroll_to(y));
        session.advance(250);
    }
    info!("Navbar scrolled: {}", page.has_class(site.navbar, "scrolled"));
    session.advance(3000);

    if let Some(card) = site.cards.first().copied() {
        session.dispatch(&PageEvent::pointer_enter(card));
        session.advance(150);
        session.dispatch(&PageEvent::pointer_leave(card));
        session.advance(300);
        info!(
            "Card after hover: transform={}",
            page.style(card, "transform").unwrap_or_default()
        );
    }

    for (name, value) in [("name", "Ada"), ("email", "ada@example.com"), ("message", "Hello")] {
        let selector = format!("[data-contact-form] [name=\"{}\"]", name);
        if let Some(field) = page.query(&selector) {
            page.set_value(field, value);
        }
    }
    let outcome = session.dispatch(&PageEvent::submit(site.form));
    info!("Form submitted (default prevented: {})", outcome.default_prevented);
    session.advance(2000);

    let id = session.notify("Thanks for visiting", Severity::Info);
    session.advance(1000);
    session.dismiss(id);
    session.advance(400);

    let outcome = session.dispatch(&PageEvent::click(site.about_link));
    if outcome.default_prevented {
        session.advance(600);
    }
}

fn report(session: &SessionHandle, site: &DemoSite) {
    let page = &site.page;
    let stats = session.stats();

    println!("Square demo");
    println!("===========");
    println!();
    println!("Time: {}ms", stats.runtime.now);
    println!("Motion: {}", stats.motion);
    println!();
    println!("Counters:");
    for counter in &site.counters {
        println!("  - {}", page.text(*counter));
    }
    println!();
    let revealed = site
        .reveals
        .iter()
        .filter(|el| session.reveal().is_revealed(**el))
        .count();
    println!("Revealed: {}/{}", revealed, site.reveals.len());
    println!();
    println!("Bound data:");
    for el in &site.bound {
        let path = page.attribute(*el, "data-bind").unwrap_or_default();
        println!("  - {}: {}", path, page.text(*el));
    }
    println!();
    println!("Notifications on screen: {}", stats.notifications);
    for nav in site.page.navigations() {
        println!("Navigated to: {}", nav);
    }
    if site.page.navigations().is_empty() {
        warn!("No navigation happened");
    }
}

fn cmd_fetch(url: &str) -> Result<()> {
    let source = HttpDataSource::new(url)?;
    let data = runtime()?.block_on(source.fetch())?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn cmd_config(config: Option<&std::path::Path>) -> Result<()> {
    let config = load_config(config)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
