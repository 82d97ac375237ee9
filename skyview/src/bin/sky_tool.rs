//! Command line access to the sky viewer's catalog and saved constellations.
//!
//! # Usage
//!
//! ```bash
//! # Catalog summary and saved constellation counts
//! sky_tool --catalog stars.csv info
//!
//! # Find stars by name
//! sky_tool --catalog stars.csv search sirius
//!
//! # Stars above the horizon for an observer at 37.5N, sidereal time 90 deg
//! sky_tool --catalog stars.csv disk --sidereal 90 --latitude 37.5
//!
//! # Edit constellations (stored in ~/.skyview unless --store is given)
//! sky_tool --catalog stars.csv link add 12 40
//! sky_tool name Orion 0 1 2
//! sky_tool groups
//! sky_tool reset
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use skyview::annotations::AnnotationStore;
use skyview::catalog::{CatalogSlot, CatalogState, LoadOutcome, DEFAULT_SEARCH_LIMIT};
use skyview::celestial::DiskProjection;
use skyview::config::SkyConfig;
use skyview::format::{format_dms, format_hms};
use skyview::overlay::disk_link_segments;
use skyview::storage::FileStore;
use skyview::LinkId;

#[derive(Parser, Debug)]
#[command(name = "sky_tool")]
#[command(about = "Inspect star catalogs and edit saved constellations")]
#[command(version)]
struct Args {
    /// Star catalog CSV
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Directory holding saved state (default: ~/.skyview)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Config JSON (default: ~/.skyview/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show catalog and constellation summary
    Info,

    /// Search stars by name
    Search {
        query: String,

        /// Maximum number of matches
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// List stars visible on the all-sky disk
    Disk {
        /// Local sidereal time in degrees
        #[arg(long, default_value = "0")]
        sidereal: f64,

        /// Observer latitude in degrees
        #[arg(long, default_value = "0")]
        latitude: f64,

        /// Only print this many of the brightest stars
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Add or remove constellation links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Name one or more links
    Name {
        name: String,

        /// Link ids to name
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// List named constellations
    Groups,

    /// Delete all saved links and names
    Reset,
}

#[derive(Subcommand, Debug)]
enum LinkAction {
    /// Link two stars by catalog index
    Add { star_a: usize, star_b: usize },

    /// Remove a link by id
    Remove { id: u64 },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config_path = args.config.clone().or_else(SkyConfig::default_path);
    let config = match &config_path {
        Some(path) => SkyConfig::load_or_default(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SkyConfig::default(),
    };

    let mut store = match &args.store {
        Some(path) => FileStore::with_path(path.clone()),
        None => FileStore::default(),
    };

    let mut slot = CatalogSlot::new();
    if let Some(path) = &args.catalog {
        match slot.load_path(path) {
            LoadOutcome::Applied { stars } => info!("Catalog {} has {stars} stars", path.display()),
            LoadOutcome::Unavailable(reason) => warn!("Catalog {} unavailable: {reason}", path.display()),
            LoadOutcome::Superseded => {}
        }
    }
    let catalog = slot.catalog();

    let restored = AnnotationStore::restore(&store);
    if restored.links.is_malformed() || restored.names.is_malformed() {
        warn!(
            "Saved constellations were partly unreadable (links: {}, names: {})",
            restored.links, restored.names
        );
    }
    let mut annotations = restored.store;

    match args.command {
        Command::Info => {
            let state = match slot.state() {
                CatalogState::Empty => "not loaded".to_string(),
                CatalogState::Loaded => "loaded".to_string(),
                CatalogState::Unavailable(reason) => format!("unavailable ({reason})"),
            };
            println!("Catalog:        {state}, {} stars", catalog.len());
            println!("Store:          {}", store.root_path().display());
            println!("Links:          {}", annotations.len());
            println!("Constellations: {}", annotations.list_named_groups().len());
            println!("Known names:    {}", annotations.known_names().join(", "));
            println!("Sphere radius:  {}", config.sphere_radius);
        }

        Command::Search { query, limit } => {
            let hits = catalog.search_by_name(&query, limit);
            if hits.is_empty() {
                println!("No stars match {query:?}");
            }
            for star in hits {
                println!(
                    "{:>6}  {:<32} RA {:<16} Dec {:<16} mag {:.2}",
                    star.index,
                    star.display_name(),
                    format_hms(star.ra_deg),
                    format_dms(star.dec_deg),
                    star.apparent_magnitude
                );
            }
        }

        Command::Disk {
            sidereal,
            latitude,
            count,
        } => {
            let projection = DiskProjection::new(sidereal, latitude)
                .with_rotation(config.disk_rotation_deg)
                .with_horizon(config.horizon_deg)
                .with_magnitude_cutoff(config.disk_magnitude_cutoff);

            let mut visible: Vec<_> = catalog
                .stars()
                .iter()
                .filter_map(|star| {
                    projection
                        .project(star.ra_deg, star.dec_deg, star.apparent_magnitude)
                        .ok()
                        .map(|point| (star, point))
                })
                .collect();
            visible.sort_by(|(a, _), (b, _)| a.apparent_magnitude.total_cmp(&b.apparent_magnitude));

            println!("{} stars above the horizon", visible.len());
            let drawn = disk_link_segments(&annotations, &catalog, &projection).len();
            println!("{drawn} of {} constellation links visible", annotations.len());
            for (star, point) in visible.into_iter().take(count) {
                println!(
                    "{:>6}  {:<32} x {:>7.4}  y {:>7.4}  mag {:.2}",
                    star.index,
                    star.display_name(),
                    point.x,
                    point.y,
                    star.apparent_magnitude
                );
            }
        }

        Command::Link { action } => match action {
            LinkAction::Add { star_a, star_b } => {
                let id = annotations.add_link(star_a, star_b, catalog.len())?;
                annotations.persist(&mut store)?;
                println!("Added link {id}");
            }
            LinkAction::Remove { id } => {
                if annotations.remove_link(LinkId(id)).is_none() {
                    bail!("no link with id {id}");
                }
                annotations.persist(&mut store)?;
                println!("Removed link {}", LinkId(id));
            }
        },

        Command::Name { name, ids } => {
            let ids: Vec<LinkId> = ids.into_iter().map(LinkId).collect();
            let named = annotations.name_links(&ids, &name)?;
            annotations.persist(&mut store)?;
            println!("Named {named} of {} links {name:?}", ids.len());
        }

        Command::Groups => {
            for (name, ids) in annotations.list_named_groups() {
                let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                println!("{name}: {}", ids.join(" "));
            }
        }

        Command::Reset => {
            annotations.reset(&mut store)?;
            println!("Cleared saved constellations in {}", store.root_path().display());
        }
    }

    Ok(())
}
