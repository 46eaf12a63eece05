//! CropSight CLI
//!
//! Command-line entry point for diagnosing crop leaf images, bootstrapping
//! weight files and inspecting the configured label sets.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use cropsight::backend::{backend_name, default_device, InferenceBackend};
use cropsight::config::CONFIG_ENV;
use cropsight::service::load_catalog;
use cropsight::utils::logging::{init_logging, LogConfig};
use cropsight::{
    AdvisoryTable, Crop, CropSightError, DiagnosisService, DiseaseClassifier, PredictionResponse,
    ServiceConfig,
};

/// CropSight crop disease diagnosis
///
/// Classifies potato, cotton and wheat leaf photos with Burn CNNs and attaches
/// agronomic advice and matching products to every confident diagnosis.
#[derive(Parser, Debug)]
#[command(name = "cropsight")]
#[command(version)]
#[command(about = "Crop disease diagnosis with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Service configuration file (defaults to the built-in three-crop setup)
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Diagnose a single leaf image
    Predict {
        /// Crop the image shows (potato, cotton, wheat)
        #[arg(long)]
        crop: Crop,

        /// Path to the image file
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Write freshly initialised weights for a crop
    InitWeights {
        /// Crop to create weights for
        #[arg(long)]
        crop: Crop,

        /// Output path (defaults to the crop's configured weights path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show label sets and their advisory text
    Labels {
        /// Only show this crop
        #[arg(long)]
        crop: Option<Crop>,
    },

    /// Write the default configuration file
    Config {
        /// Output file path
        #[arg(short, long, default_value = "cropsight.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose);
    let _ = init_logging(&log_config);

    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServiceConfig::default(),
    };

    match cli.command {
        Commands::Predict { crop, image } => cmd_predict(&config, crop, &image)?,
        Commands::InitWeights { crop, output } => cmd_init_weights(&config, crop, output)?,
        Commands::Labels { crop } => cmd_labels(&config, crop),
        Commands::Config { output } => cmd_config(&output)?,
    }

    Ok(())
}

fn cmd_predict(config: &ServiceConfig, crop: Crop, image: &Path) -> Result<()> {
    // Only load the model that is needed
    let single = config
        .only(crop)
        .ok_or_else(|| CropSightError::UnknownCrop(crop.to_string()))?;

    let catalog = load_catalog(&single)?;
    info!("Backend: {}", backend_name());

    let service =
        DiagnosisService::<InferenceBackend>::from_config(&single, Box::new(catalog), default_device())?;

    let bytes = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;

    match service.diagnose(crop, &bytes) {
        Ok(response) => {
            print_response(crop, &response);
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(err @ CropSightError::LowConfidence { .. }) => {
            println!("{} {}", "Rejected:".yellow().bold(), err);
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_response(crop: Crop, response: &PredictionResponse) {
    println!();
    println!("{}", format!("{} diagnosis", crop).cyan().bold());
    println!(
        "  {} {} ({:.2}%)",
        "Class:".bold(),
        response.disease_class.green().bold(),
        response.confidence
    );
    if let Some(advice) = &response.advisory_message {
        println!("  {} {}", "Advice:".bold(), advice);
    }
    println!(
        "  {} {}",
        "Products:".bold(),
        response.recommended_products.len()
    );
    for product in &response.recommended_products {
        println!("    - {} ({:.2})", product.name, product.price);
    }
    println!();
}

fn cmd_init_weights(config: &ServiceConfig, crop: Crop, output: Option<PathBuf>) -> Result<()> {
    let crop_config = config
        .crop(crop)
        .ok_or_else(|| CropSightError::UnknownCrop(crop.to_string()))?;

    let path = output.unwrap_or_else(|| crop_config.weights_path.clone());
    let classifier_config = crop_config.classifier_config();

    let model = DiseaseClassifier::<InferenceBackend>::new(&classifier_config, &default_device());
    let file = model.save(&path)?;

    println!(
        "{} {} model ({} classes) written to {}",
        "Initialised".green().bold(),
        classifier_config.variant,
        classifier_config.num_classes,
        file.display()
    );
    println!(
        "{}",
        "These weights are untrained and only suitable for smoke tests.".yellow()
    );

    Ok(())
}

fn cmd_labels(config: &ServiceConfig, only: Option<Crop>) {
    let advisories = AdvisoryTable::default();

    for crop_config in &config.crops {
        if only.is_some_and(|crop| crop != crop_config.crop) {
            continue;
        }

        println!(
            "{} ({} model)",
            crop_config.crop.to_string().cyan().bold(),
            crop_config.variant
        );
        for (index, label) in crop_config.labels.iter().enumerate() {
            println!("  {:>2}  {}", index, label.bold());
            match advisories.advisory_for(label) {
                Some(advice) => println!("      {}", advice),
                None => println!("      {}", "no advisory text".red()),
            }
        }
        println!();
    }
}

fn cmd_config(output: &Path) -> Result<()> {
    ServiceConfig::default().save(output)?;
    println!("{} {}", "Default config written to".green(), output.display());
    Ok(())
}
