//! Command implementations.

pub mod batch;
pub mod config;
pub mod process;
pub mod rules;

use std::path::Path;

use schet_core::{MediaType, PipelineConfig, RuleSet};

/// Map a file extension to a supported media type.
pub fn media_type_for(path: &Path) -> anyhow::Result<MediaType> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => Ok(MediaType::Pdf),
        "png" => Ok(MediaType::Png),
        "jpg" | "jpeg" => Ok(MediaType::Jpeg),
        "tif" | "tiff" => Ok(MediaType::Tiff),
        "bmp" => Ok(MediaType::Bmp),
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Load the pipeline config from a path or fall back to defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PipelineConfig> {
    match config_path {
        Some(path) => Ok(PipelineConfig::from_file(Path::new(path))?),
        None => Ok(PipelineConfig::default()),
    }
}

/// Load the rule-set from a path or fall back to the built-in rules.
pub fn load_rules(rules_path: Option<&str>) -> anyhow::Result<RuleSet> {
    match rules_path {
        Some(path) => Ok(RuleSet::from_file(Path::new(path))?),
        None => Ok(RuleSet::default_rules()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn media_type_mapping_covers_supported_extensions() {
        assert_eq!(
            media_type_for(&PathBuf::from("a.PDF")).unwrap(),
            MediaType::Pdf
        );
        assert_eq!(
            media_type_for(&PathBuf::from("a.jpeg")).unwrap(),
            MediaType::Jpeg
        );
        assert!(media_type_for(&PathBuf::from("a.docx")).is_err());
    }
}
