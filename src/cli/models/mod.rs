//! Models command - descriptor maintenance against the configured bucket

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Subcommand;
use serde_json::Value;

use crate::domain::model::NetworkType;
use crate::infrastructure::model::{AddOutcome, ModelRepository};

#[derive(Subcommand)]
pub enum ModelsCommand {
    /// List every model, sorted by network type then name
    List,

    /// Print one descriptor
    Show { network_type: String, name: String },

    /// Store descriptors from a JSON file holding one object or an array of them
    Import {
        file: PathBuf,
        /// Replace descriptors that already exist
        #[arg(long)]
        overwrite: bool,
    },

    /// Merge a JSON object into an existing descriptor
    Update {
        network_type: String,
        name: String,
        /// JSON object with the fields to change
        patch: String,
    },

    /// Remove a descriptor
    Delete { network_type: String, name: String },
}

pub async fn run(command: ModelsCommand) -> anyhow::Result<()> {
    let (_, state) = super::bootstrap().await?;
    let models = &state.models;

    match command {
        ModelsCommand::List => {
            for model in models.list().await? {
                println!(
                    "{:<18} {:<40} enabled={:<5} version={}",
                    model.network_type.as_str(),
                    model.name,
                    model.enabled,
                    model.reported_version()
                );
            }
        }
        ModelsCommand::Show { network_type, name } => {
            let descriptor = models.get(&name, network_type.parse()?).await?;
            super::print_json(&descriptor)?;
        }
        ModelsCommand::Import { file, overwrite } => {
            import_file(models, &file, overwrite).await?;
        }
        ModelsCommand::Update {
            network_type,
            name,
            patch,
        } => {
            let patch = match serde_json::from_str::<Value>(&patch)
                .context("Patch is not valid JSON")?
            {
                Value::Object(patch) => patch,
                _ => bail!("Patch must be a JSON object"),
            };
            let updated = models.update(&name, network_type.parse()?, patch).await?;
            super::print_json(&updated)?;
        }
        ModelsCommand::Delete { network_type, name } => {
            let network_type: NetworkType = network_type.parse()?;
            models.delete(&name, network_type).await?;
            println!("Deleted {}/{}", network_type, name);
        }
    }

    Ok(())
}

async fn import_file(
    models: &ModelRepository,
    file: &Path,
    overwrite: bool,
) -> anyhow::Result<()> {
    let contents = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let values = match serde_json::from_slice::<Value>(&contents)
        .with_context(|| format!("{} is not valid JSON", file.display()))?
    {
        Value::Array(values) => values,
        value => vec![value],
    };

    let mut failed = 0;
    for (index, value) in values.into_iter().enumerate() {
        match models.add_raw(value, overwrite).await {
            Ok(AddOutcome::Written) => println!("[{}] stored", index),
            Ok(AddOutcome::AlreadyExists) => {
                println!("[{}] skipped: already exists (use --overwrite)", index)
            }
            Err(e) => {
                failed += 1;
                eprintln!("[{}] failed: {}", index, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} descriptor(s) could not be imported", failed);
    }
    Ok(())
}
