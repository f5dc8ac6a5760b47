#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for CrowdWatch.
//!
//! Every action is available as a subcommand (`crowdwatch predict 1`,
//! `crowdwatch watch --frames ./frames`, ...). Run with no subcommand to
//! pick actions from an interactive menu instead.
//!
//! Uses `indicatif-log-bridge` (via [`crowdwatch_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and spinners never fight for the terminal.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::Session;
use dialoguer::{Input, Select};

#[derive(Parser)]
#[command(name = "crowdwatch", about = "Crowd density monitoring and forecasting")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Prompt for the bind address and port
        #[arg(long)]
        interactive: bool,
    },
    /// List locations with their density level
    Locations {
        /// Only show locations whose name contains this text
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Show aggregate crowd statistics
    Stats,
    /// Forecast the next three hours for a location
    Predict {
        /// Location id
        id: String,
    },
    /// Generate a plausible profile for a new location and add it
    Add {
        /// Name of the new location
        name: String,
    },
    /// Chat with the crowd-management assistant
    Chat,
    /// Estimate crowd density from a directory of camera frames
    Watch {
        /// Directory of image files, sampled in name order
        #[arg(long)]
        frames: PathBuf,

        /// Seconds between samples (overrides `SAMPLE_INTERVAL_SECS`)
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many successful samples
        #[arg(long)]
        samples: Option<usize>,
    },
}

/// Menu entries shown when no subcommand is given.
enum Tool {
    Locations,
    Stats,
    Predict,
    Add,
    Chat,
    Watch,
    Server,
    Exit,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::Locations,
        Self::Stats,
        Self::Predict,
        Self::Add,
        Self::Chat,
        Self::Watch,
        Self::Server,
        Self::Exit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Locations => "Browse locations",
            Self::Stats => "Show statistics",
            Self::Predict => "Predict crowds for a location",
            Self::Add => "Add a new location",
            Self::Chat => "Ask the assistant",
            Self::Watch => "Watch camera frames",
            Self::Server => "Start server",
            Self::Exit => "Exit",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let multi = crowdwatch_cli_utils::init_logger();
    let cli = Cli::parse();
    let mut session = Session::new(multi);

    match cli.command {
        None => menu(&mut session).await?,
        Some(Commands::Serve { interactive }) => commands::serve(interactive).await?,
        Some(Commands::Locations { search }) => commands::list_locations(&session, &search),
        Some(Commands::Stats) => commands::show_statistics(&session),
        Some(Commands::Predict { id }) => commands::predict(&mut session, &id).await?,
        Some(Commands::Add { name }) => commands::add_location(&mut session, &name).await?,
        Some(Commands::Chat) => commands::chat(&mut session).await?,
        Some(Commands::Watch {
            frames,
            interval,
            samples,
        }) => commands::watch(&mut session, &frames, interval, samples).await?,
    }

    Ok(())
}

async fn menu(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    println!("CrowdWatch");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        // Action errors are reported and the menu continues.
        let result = match Tool::ALL[idx] {
            Tool::Locations => {
                let search: String = Input::new()
                    .with_prompt("Search (blank for all)")
                    .allow_empty(true)
                    .interact_text()?;
                commands::list_locations(session, &search);
                Ok(())
            }
            Tool::Stats => {
                commands::show_statistics(session);
                Ok(())
            }
            Tool::Predict => {
                let locations = session.locations();
                let names: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
                let choice = Select::new()
                    .with_prompt("Location")
                    .items(&names)
                    .default(0)
                    .interact()?;
                commands::predict(session, &locations[choice].id).await
            }
            Tool::Add => {
                let name: String = Input::new()
                    .with_prompt("Location name")
                    .interact_text()?;
                commands::add_location(session, &name).await
            }
            Tool::Chat => commands::chat(session).await,
            Tool::Watch => {
                let dir: String = Input::new()
                    .with_prompt("Frames directory")
                    .interact_text()?;
                commands::watch(session, &PathBuf::from(dir), None, None).await
            }
            Tool::Server => return commands::serve(true).await,
            Tool::Exit => return Ok(()),
        };

        if let Err(e) = result {
            log::error!("{e}");
            println!("Error: {e}");
        }
    }
}
