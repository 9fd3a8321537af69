//! `import-pois`: seed the POI catalogue from a JSON array.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use promenade_core::PointOfInterest;
use promenade_data::persist_pois_to_sqlite;
use serde::{Deserialize, Serialize};

use crate::{
    ARG_POIS_DB, ARG_POIS_FILE, CliError, DEFAULT_POIS_DB, ENV_IMPORT_POIS_FILE, write_json,
};

/// CLI arguments for the `import-pois` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import-pois",
    long_about = "Load a JSON array of points of interest into the catalogue. \
                 Each entry has an id, a location with lat and lon, a \
                 category and optional string tags. Existing entries with \
                 the same id are replaced.",
    about = "Seed the POI catalogue"
)]
#[ortho_config(prefix = "PROMENADE")]
pub(crate) struct ImportPoisArgs {
    /// Path to the JSON file.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) pois_file: Option<Utf8PathBuf>,
    /// Path to the POI catalogue database.
    #[arg(long = ARG_POIS_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) pois_db: Option<Utf8PathBuf>,
}

impl ImportPoisArgs {
    pub(crate) fn into_config(self) -> Result<ImportPoisConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportPoisConfig::try_from(merged)
    }
}

/// Resolved `import-pois` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportPoisConfig {
    pub(crate) pois_file: Utf8PathBuf,
    pub(crate) pois_db: Utf8PathBuf,
}

impl TryFrom<ImportPoisArgs> for ImportPoisConfig {
    type Error = CliError;

    fn try_from(args: ImportPoisArgs) -> Result<Self, Self::Error> {
        let pois_file = args.pois_file.ok_or(CliError::MissingArgument {
            field: ARG_POIS_FILE,
            env: ENV_IMPORT_POIS_FILE,
        })?;
        Ok(Self {
            pois_file,
            pois_db: args
                .pois_db
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_POIS_DB)),
        })
    }
}

/// Summary printed after an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ImportSummary {
    pub(crate) imported: usize,
    pub(crate) pois_db: Utf8PathBuf,
}

/// Load a JSON-encoded array of points of interest from disk.
pub(crate) fn load_pois(path: &Utf8Path) -> Result<Vec<PointOfInterest>, CliError> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| {
        CliError::OpenPoiFile {
            path: path.to_path_buf(),
            source,
        }
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParsePoiFile {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn run_import_pois_with(
    args: ImportPoisArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let pois = load_pois(&config.pois_file)?;
    persist_pois_to_sqlite(&config.pois_db, &pois).map_err(|source| CliError::ImportPois {
        path: config.pois_db.clone(),
        source,
    })?;
    info!("imported {} points of interest from {}", pois.len(), config.pois_file);
    write_json(
        writer,
        &ImportSummary {
            imported: pois.len(),
            pois_db: config.pois_db,
        },
    )
}
