use std::path::Path;

use crate::app_dirs;
use crate::dataset::write_atomic;

use super::errors::ConfigError;
use super::types::Settings;

/// Load `config.toml` from the application directory, or defaults when it does not exist.
pub fn load_or_default() -> Result<Settings, ConfigError> {
    load_from(&app_dirs::config_path()?)
}

/// Load settings from `path`; a missing file yields defaults.
pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<Settings>(&text)
        .map(Settings::normalized)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
}

/// Write settings to `path` through a temp file.
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, text.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::ClassifierKind;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.training.min_labeled, 3);
        assert_eq!(settings.scoring.classifier, ClassifierKind::NaiveBayes);
        assert_eq!(settings.import.eval_split_start, 801);
        assert_eq!(settings.export.score, "32");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[training]\nclassifier = \"linear_svc\"\n\n[vectorizer]\nmax_df = 7.0\n\n[embedding]\nepochs = 10\n",
        )
        .unwrap();
        let settings = load_from(&path).unwrap();
        assert_eq!(settings.training.classifier, ClassifierKind::LinearSvc);
        assert_eq!(settings.training.min_labeled, 3);
        assert_eq!(settings.vectorizer.max_df, 1.0);
        assert!(settings.vectorizer.sublinear_tf);
        assert_eq!(settings.embedding.epochs, 10);
        assert_eq!(settings.embedding.n_neighbors, 15);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.paths.data_dir = Some(dir.path().join("data"));
        settings.scoring.classifier = ClassifierKind::Logistic;
        settings.embedding.use_previous_positions = false;
        save_to_path(&settings, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), settings);
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[training\n").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn relative_paths_resolve_against_data_dir() {
        let settings = Settings::default();
        let resolved = settings.paths.resolve(Path::new("/srv/glyph"));
        assert_eq!(resolved.dataset, Path::new("/srv/glyph/data.csv"));
        assert_eq!(resolved.metrics, Path::new("/srv/glyph/metrics.csv"));
    }
}
