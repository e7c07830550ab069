use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::monitor_config::ConfigError;
use crate::pipeline::monitor_loop::FailurePolicy;
use crate::publishing::domain::event::PayloadMode;
use crate::shared::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};

/// Which analysis a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Drowsiness,
    Classification,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Drowsiness => write!(f, "drowsiness"),
            Variant::Classification => write!(f, "classification"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drowsiness" => Ok(Variant::Drowsiness),
            "classification" => Ok(Variant::Classification),
            _ => Err(format!(
                "unknown variant '{s}', expected 'drowsiness' or 'classification'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Stdout,
    Http,
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" => Ok(SinkKind::Stdout),
            "http" => Ok(SinkKind::Http),
            _ => Err(format!("unknown sink '{s}', expected 'stdout' or 'http'")),
        }
    }
}

/// One configuration layer. Every field is optional so layers can be
/// stacked: command line over environment over file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub variant: Option<Variant>,
    pub video_source: Option<String>,
    pub endpoint: Option<String>,
    pub eye_threshold: Option<f64>,
    pub pitch_threshold: Option<f64>,
    pub confidence_floor: Option<f64>,
    /// `Name: value` pairs sent with every inference request.
    pub headers: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub delay_ms: Option<u64>,
    pub jpeg_quality: Option<u8>,
    pub warmup_ms: Option<u64>,
    pub on_failure: Option<FailurePolicy>,
    pub payload: Option<PayloadMode>,
    pub sink: Option<SinkKind>,
    pub sink_url: Option<String>,
    pub sink_headers: Vec<String>,
    pub message_timeout_ms: Option<u64>,
    pub iterations: Option<u64>,
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads the file at [`default_path`](Self::default_path) if there is
    /// one. A missing file is not an error; a broken one is.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("Loading settings from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Combines two layers; values set in `self` win over `base`.
    pub fn merged_over(self, base: Settings) -> Settings {
        Settings {
            variant: self.variant.or(base.variant),
            video_source: self.video_source.or(base.video_source),
            endpoint: self.endpoint.or(base.endpoint),
            eye_threshold: self.eye_threshold.or(base.eye_threshold),
            pitch_threshold: self.pitch_threshold.or(base.pitch_threshold),
            confidence_floor: self.confidence_floor.or(base.confidence_floor),
            headers: prefer_non_empty(self.headers, base.headers),
            timeout_ms: self.timeout_ms.or(base.timeout_ms),
            delay_ms: self.delay_ms.or(base.delay_ms),
            jpeg_quality: self.jpeg_quality.or(base.jpeg_quality),
            warmup_ms: self.warmup_ms.or(base.warmup_ms),
            on_failure: self.on_failure.or(base.on_failure),
            payload: self.payload.or(base.payload),
            sink: self.sink.or(base.sink),
            sink_url: self.sink_url.or(base.sink_url),
            sink_headers: prefer_non_empty(self.sink_headers, base.sink_headers),
            message_timeout_ms: self.message_timeout_ms.or(base.message_timeout_ms),
            iterations: self.iterations.or(base.iterations),
        }
    }
}

fn prefer_non_empty(top: Vec<String>, base: Vec<String>) -> Vec<String> {
    if top.is_empty() {
        base
    } else {
        top
    }
}

/// Picks the endpoint from the variant-specific legacy variable
/// (`faceapi` or `classifierapi`) when no generic endpoint was given.
pub fn legacy_endpoint(
    variant: Option<Variant>,
    face_api: Option<String>,
    classifier_api: Option<String>,
) -> Option<String> {
    match variant? {
        Variant::Drowsiness => face_api,
        Variant::Classification => classifier_api,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "variant": "drowsiness",
                "video_source": "/dev/video0",
                "eye_threshold": 0.25,
                "headers": ["Ocp-Apim-Subscription-Key: abc"],
                "on_failure": "skip"
            }}"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.variant, Some(Variant::Drowsiness));
        assert_eq!(settings.video_source.as_deref(), Some("/dev/video0"));
        assert_eq!(settings.eye_threshold, Some(0.25));
        assert_eq!(settings.on_failure, Some(FailurePolicy::Skip));
        assert_eq!(settings.headers.len(), 1);
        assert_eq!(settings.pitch_threshold, None);
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"eye_treshold": 0.2}}"#).unwrap();
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = Settings::load(Path::new("/nonexistent/edgewatch.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_top_layer_wins() {
        let top = Settings {
            endpoint: Some("http://flag".into()),
            delay_ms: Some(100),
            ..Settings::default()
        };
        let base = Settings {
            endpoint: Some("http://file".into()),
            video_source: Some("rtsp://cam".into()),
            headers: vec!["A: 1".into()],
            ..Settings::default()
        };

        let merged = top.merged_over(base);
        assert_eq!(merged.endpoint.as_deref(), Some("http://flag"));
        assert_eq!(merged.video_source.as_deref(), Some("rtsp://cam"));
        assert_eq!(merged.delay_ms, Some(100));
        assert_eq!(merged.headers, vec!["A: 1".to_string()]);
    }

    #[test]
    fn test_top_headers_replace_base_headers() {
        let top = Settings {
            headers: vec!["B: 2".into()],
            ..Settings::default()
        };
        let base = Settings {
            headers: vec!["A: 1".into()],
            ..Settings::default()
        };
        assert_eq!(top.merged_over(base).headers, vec!["B: 2".to_string()]);
    }

    #[test]
    fn test_legacy_endpoint_follows_variant() {
        let face = Some("http://face".to_string());
        let classifier = Some("http://classifier".to_string());
        assert_eq!(
            legacy_endpoint(Some(Variant::Drowsiness), face.clone(), classifier.clone()),
            face
        );
        assert_eq!(
            legacy_endpoint(Some(Variant::Classification), face.clone(), classifier.clone()),
            classifier
        );
        assert_eq!(legacy_endpoint(None, face, classifier), None);
    }

    #[test]
    fn test_parse_variant_and_sink() {
        assert_eq!("Drowsiness".parse::<Variant>(), Ok(Variant::Drowsiness));
        assert_eq!("classification".parse::<Variant>(), Ok(Variant::Classification));
        assert!("faces".parse::<Variant>().is_err());
        assert_eq!("http".parse::<SinkKind>(), Ok(SinkKind::Http));
        assert!("kafka".parse::<SinkKind>().is_err());
    }

    #[test]
    fn test_default_path_names_app_dir() {
        if let Some(path) = Settings::default_path() {
            assert!(path.ends_with("edgewatch/config.json"));
        }
    }
}
