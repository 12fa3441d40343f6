use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::error::Result;
use crate::pipeline::PipelineOutput;

pub const BUSINESS_OUTPUT_FILENAME: &str = "processed_business_data.csv";
pub const MARKETING_OUTPUT_FILENAME: &str = "processed_marketing_data.csv";

/// Paths of the artifacts written by one pipeline run.
#[derive(Debug, Clone)]
pub struct OutputArtifacts {
    pub business_path: PathBuf,
    pub marketing_path: PathBuf,
}

/// Serialize a frame to CSV bytes. Dates render as `%Y-%m-%d`; the byte
/// output is deterministic for a given frame, which is what makes whole-run
/// idempotence observable.
pub fn create_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut clone = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut clone)?;
    Ok(buffer)
}

/// Write the two canonical artifacts consumed by the presentation and
/// narrative layers.
pub fn write_artifacts(out_dir: &Path, output: &PipelineOutput) -> Result<OutputArtifacts> {
    fs::create_dir_all(out_dir)?;

    let business_path = out_dir.join(BUSINESS_OUTPUT_FILENAME);
    fs::write(&business_path, create_csv_bytes(&output.joined)?)?;

    let marketing_path = out_dir.join(MARKETING_OUTPUT_FILENAME);
    fs::write(&marketing_path, create_csv_bytes(&output.marketing)?)?;

    Ok(OutputArtifacts {
        business_path,
        marketing_path,
    })
}
