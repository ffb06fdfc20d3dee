use std::path::{Path, PathBuf};

pub const RESOURCE_DIR_ENV: &str = "NATURESHIELD_RESOURCE_DIR";

/// Side length the bundled classifiers expect.
pub const INPUT_SIZE: u32 = 224;
pub const IMAGE_MEAN: f32 = 0.0;
pub const IMAGE_STD: f32 = 255.0;
pub const NUM_RESULTS: usize = 1;
pub const THRESHOLD: f32 = 0.01;
pub const NUM_THREADS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceSettings {
    pub input_size: u32,
    pub image_mean: f32,
    pub image_std: f32,
    pub num_results: usize,
    pub threshold: f32,
    pub num_threads: usize,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            input_size: INPUT_SIZE,
            image_mean: IMAGE_MEAN,
            image_std: IMAGE_STD,
            num_results: NUM_RESULTS,
            threshold: THRESHOLD,
            num_threads: NUM_THREADS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub resource_dir: PathBuf,
    pub inference: InferenceSettings,
}

impl AppConfig {
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            inference: InferenceSettings::default(),
        }
    }

    /// Resolves the resource root: `NATURESHIELD_RESOURCE_DIR`, then the
    /// platform resource directory, then the working directory.
    pub fn resolve(platform_dir: Option<&Path>) -> Self {
        Self::resolve_with(std::env::var_os(RESOURCE_DIR_ENV).map(PathBuf::from), platform_dir)
    }

    fn resolve_with(env_dir: Option<PathBuf>, platform_dir: Option<&Path>) -> Self {
        let resource_dir = env_dir
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| platform_dir.map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(resource_dir)
    }
}
