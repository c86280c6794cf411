//! Decode-then-emit: turn MAP files into JSON documents a human can read.
//! Large arrays that are already interpreted correctly are replaced with a
//! marker string so the rest of the structure stays readable.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::map::{self, DecodeError, DecodedMap, Dialect, MapFile};

/// Replacement for stripped arrays
pub const STRIPPED: &str = "Stripped from JSON";

#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Appended to the MAP path to name the output file
    pub output_suffix: String,
    pub strip_arrays: bool,
    pub pretty: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_suffix: ".JSON".to_string(),
            strip_arrays: true,
            pretty: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("{}: could not serialize MAP: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{}: could not write output: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The set of light types seen across one or more files
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LightTypeCatalog(BTreeSet<u8>);

impl LightTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, light_type: u8) -> bool {
        self.0.insert(light_type)
    }

    pub fn merge(&mut self, other: LightTypeCatalog) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, light_type: u8) -> bool {
        self.0.contains(&light_type)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Light types in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u8> for LightTypeCatalog {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FileOutcome {
    Converted {
        dialect: Dialect,
        end_of_file_reached: bool,
        unevaluated_flags: usize,
        output: PathBuf,
    },
    /// On the known-skip list
    Skipped,
}

#[derive(Clone, Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub light_types: LightTypeCatalog,
}

/// Convert a single MAP file to `<path><suffix>`
pub fn convert_file(path: &Path, options: &ConvertOptions) -> Result<FileReport, ConvertError> {
    log::info!("Processing: {}", path.display());
    if map::is_known_unsupported(path) {
        log::debug!("Skipping test map: {}", path.display());
        return Ok(FileReport {
            path: path.to_path_buf(),
            outcome: FileOutcome::Skipped,
            light_types: LightTypeCatalog::new(),
        });
    }

    let decoded = MapFile::read_file(path)?;
    let unevaluated_flags = report_unevaluated_flags(path, &decoded.map);
    let light_types = decoded.map.light_types().collect();

    let document = map_document(path, &decoded, options.strip_arrays).map_err(|source| {
        ConvertError::Json { path: path.to_path_buf(), source }
    })?;
    let text = if options.pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(|source| ConvertError::Json { path: path.to_path_buf(), source })?;

    let mut output = path.as_os_str().to_owned();
    output.push(&options.output_suffix);
    let output = PathBuf::from(output);
    fs::write(&output, text).map_err(|source| ConvertError::Write {
        path: output.clone(),
        source,
    })?;

    Ok(FileReport {
        path: path.to_path_buf(),
        outcome: FileOutcome::Converted {
            dialect: decoded.map.dialect,
            end_of_file_reached: decoded.end_of_file_reached,
            unevaluated_flags,
            output,
        },
        light_types,
    })
}

/// Log every mesh with geometry flags outside the known set. Returns how many
/// were logged.
pub fn report_unevaluated_flags(path: &Path, map: &MapFile) -> usize {
    let warnings = map.unevaluated_flags();
    for warning in &warnings {
        log::error!(
            "{} UnevaluatedFlags for: {}_{} (bits {:#010x})",
            path.display(),
            warning.object_name,
            warning.owner_name,
            warning.unevaluated_bits,
        );
    }
    warnings.len()
}

/// The JSON document written for a decoded file
pub fn map_document(
    path: &Path,
    decoded: &DecodedMap,
    strip_arrays: bool,
) -> serde_json::Result<Value> {
    let mut contents = serde_json::to_value(&decoded.map)?;
    if strip_arrays {
        strip_large_arrays(&mut contents, decoded.map.dialect);
    }
    Ok(json!({
        "filename": path.display().to_string(),
        "end_of_file_reached": decoded.end_of_file_reached,
        "filecontents": contents,
    }))
}

/// Replace the bulk geometry arrays of a serialized `MapFile` with
/// `[STRIPPED]`. Which arrays exist depends on the dialect.
pub fn strip_large_arrays(contents: &mut Value, dialect: Dialect) {
    let Some(objects) = contents
        .pointer_mut("/geometries/objects")
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for object in objects {
        match dialect {
            Dialect::RainbowSix => {
                strip(object, &["vertices", "vertex_params", "faces"]);
                for mesh in array_mut(object, "meshes") {
                    strip(mesh, &["face_indices", "renderable"]);
                }
            }
            Dialect::RogueSpear => {
                let Some(data) = object.get_mut("geometry_data") else {
                    continue;
                };
                strip(data, &["vertices"]);
                for group in array_mut(data, "face_groups") {
                    strip(
                        group,
                        &["vertex_indices", "param_indices", "vertex_params", "face_normals"],
                    );
                }
                if let Some(collision) = data.get_mut("collision_information") {
                    strip(
                        collision,
                        &["vertices", "normals", "faces", "collision_mesh_definitions"],
                    );
                }
            }
        }
    }
}

fn strip(value: &mut Value, keys: &[&str]) {
    for key in keys {
        if let Some(field) = value.get_mut(*key) {
            *field = json!([STRIPPED]);
        }
    }
}

fn array_mut<'a>(value: &'a mut Value, key: &str) -> impl Iterator<Item = &'a mut Value> {
    value
        .get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
}

/// Totals of a batch run
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Converted files that did not decode to the last byte
    pub incomplete: Vec<PathBuf>,
    pub light_types: LightTypeCatalog,
}

impl BatchSummary {
    /// Fold one file's result in. A failed file is logged and counted; it
    /// never stops the batch.
    pub fn add(mut self, result: Result<FileReport, ConvertError>) -> Self {
        match result {
            Ok(report) => {
                match report.outcome {
                    FileOutcome::Converted { end_of_file_reached, .. } => {
                        self.converted += 1;
                        if !end_of_file_reached {
                            self.incomplete.push(report.path);
                        }
                    }
                    FileOutcome::Skipped => self.skipped += 1,
                }
                self.light_types.merge(report.light_types);
            }
            Err(err) => {
                log::error!("{err}");
                self.failed += 1;
            }
        }
        self
    }

    pub fn merge(mut self, other: BatchSummary) -> Self {
        self.converted += other.converted;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.incomplete.extend(other.incomplete);
        self.incomplete.sort();
        self.light_types.merge(other.light_types);
        self
    }
}

/// Convert every file independently on the rayon pool. There is no ordering
/// between files.
pub fn run_batch(paths: &[PathBuf], options: &ConvertOptions) -> BatchSummary {
    paths
        .par_iter()
        .map(|path| convert_file(path, options))
        .fold(BatchSummary::default, BatchSummary::add)
        .reduce(BatchSummary::default, BatchSummary::merge)
}

/// All files under `root` with the given extension, matched without regard to
/// case
pub fn discover_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, glob::PatternError> {
    let opts = glob::MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };
    let pattern = root.join("**").join(format!("*.{extension}"));

    let mut files = Vec::new();
    for entry in glob::glob_with(&pattern.to_string_lossy(), opts)? {
        match entry {
            Ok(path) => files.push(path),
            Err(err) => log::warn!("{err}"),
        }
    }
    files.sort();
    Ok(files)
}
