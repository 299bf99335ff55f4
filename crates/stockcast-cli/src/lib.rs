//! stockcast CLI Library
//!
//! This crate provides the command-line interface for stockcast:
//!
//! - **Serve**: HTTP serving of the quantity prediction model
//! - **Predict**: one-shot prediction without starting a server
//! - **Inspect**: summary of an artifact bundle
//!
//! # Example
//!
//! ```bash
//! # Serve the bundle in the working directory on $PORT (default 5001)
//! stockcast serve
//!
//! # Predict next month's quantity offline
//! stockcast predict --quantity 120 --month 5
//!
//! # Show what a bundle contains
//! stockcast inspect --artifact-path /models/quantity_prediction_model.json
//! ```

pub mod commands;

use clap::{Parser, Subcommand};

pub use commands::{InspectCommand, PredictCommand, ServeCommand};

/// stockcast - quantity prediction serving
#[derive(Parser, Debug)]
#[command(name = "stockcast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the model over HTTP
    Serve(ServeCommand),

    /// Run a single prediction against a bundle
    Predict(PredictCommand),

    /// Print a summary of an artifact bundle
    Inspect(InspectCommand),
}
