use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use waldo_engine::coords::{ImageSize, WindowSize};
use waldo_engine::logging::LoggingConfig;

use crate::bounding_box::BoundingBox;
use crate::cli::Cli;

/// Window title.
pub const WINDOW_TITLE: &str = "Where Is Waldo";

/// Largest initial window; bigger images are fitted inside keeping their aspect.
pub const MAX_WINDOW_SIZE: (u32, u32) = (1600, 1200);

const DEFAULT_IMAGE: &str = "where_is_waldo.png";
const DEFAULT_RECORD: &str = "waldo_bounding_box.json";

/// Filter used by `--debug`: verbose for our crates, quiet GPU stack.
const DEBUG_FILTER: &str = "info,waldo_game=debug,waldo_engine=debug,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Problems with the game's inputs, reported before the window opens.
#[derive(Debug)]
pub enum ConfigError {
    ReadRecord { path: PathBuf, source: io::Error },
    ParseRecord { path: PathBuf, source: serde_json::Error },
    InvertedBox(BoundingBox),
    LoadImage { path: PathBuf, source: image::ImageError },
    EmptyImage { path: PathBuf },
    MissingRecord { image: PathBuf },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadRecord { path, .. } => {
                write!(f, "cannot read bounding box record {}", path.display())
            }
            ConfigError::ParseRecord { path, source } => {
                write!(f, "malformed bounding box record {}: {source}", path.display())
            }
            ConfigError::InvertedBox(b) => write!(
                f,
                "bounding box is inverted (left {}, top {}, right {}, bottom {})",
                b.left, b.top, b.right, b.bottom
            ),
            ConfigError::LoadImage { path, .. } => write!(f, "cannot load image {}", path.display()),
            ConfigError::EmptyImage { path } => write!(f, "image {} has no pixels", path.display()),
            ConfigError::MissingRecord { image } => write!(
                f,
                "image {} was given without a bounding box record (use --bounding-box)",
                image.display()
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadRecord { source, .. } => Some(source),
            ConfigError::ParseRecord { source, .. } => Some(source),
            ConfigError::LoadImage { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Resolved command-line configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub image_path: PathBuf,
    pub bounding_box_path: PathBuf,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
}

impl GameConfig {
    /// Applies defaults: without an image, the bundled sample and its record
    /// are used together.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, &default_data_dir())
    }

    fn resolve(cli: Cli, data_dir: &Path) -> Result<Self, ConfigError> {
        let (image_path, bounding_box_path) = match (cli.image_path, cli.bounding_box) {
            (Some(image), Some(record)) => (image, record),
            (Some(image), None) => return Err(ConfigError::MissingRecord { image }),
            (None, record) => {
                if let Some(record) = record {
                    log::warn!("ignoring {} without an image, using the bundled sample", record.display());
                }
                (data_dir.join(DEFAULT_IMAGE), data_dir.join(DEFAULT_RECORD))
            }
        };

        Ok(Self {
            image_path,
            bounding_box_path,
            debug: cli.debug,
            log_file: cli.log_file,
        })
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.debug.then(|| DEBUG_FILTER.to_string()),
            log_file: self.log_file.clone(),
            ..LoggingConfig::default()
        }
    }
}

/// `data/` under the working directory if present, else next to the crate.
fn default_data_dir() -> PathBuf {
    let local = PathBuf::from("data");
    if local.join(DEFAULT_IMAGE).is_file() {
        local
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
    }
}

/// Everything loaded from disk before the window opens.
pub struct GameAssets {
    pub image: RgbaImage,
    pub bounding_box: BoundingBox,
    pub initial_window_size: WindowSize,
}

impl GameAssets {
    pub fn load(config: &GameConfig) -> Result<Self, ConfigError> {
        let bounding_box = BoundingBox::load(&config.bounding_box_path)?;

        let image = image::open(&config.image_path)
            .map_err(|source| ConfigError::LoadImage {
                path: config.image_path.clone(),
                source,
            })?
            .to_rgba8();

        let image_size = ImageSize::new(image.width(), image.height()).ok_or_else(|| {
            ConfigError::EmptyImage {
                path: config.image_path.clone(),
            }
        })?;

        if !bounding_box_fits(&bounding_box, image_size) {
            log::warn!(
                "bounding box {bounding_box:?} reaches outside the {image_size} image; parts of it can never be clicked"
            );
        }

        let initial_window_size = initial_window_size(image_size);
        log::info!(
            "loaded {} ({image_size}), initial window {initial_window_size}",
            config.image_path.display()
        );

        Ok(Self {
            image,
            bounding_box,
            initial_window_size,
        })
    }
}

fn bounding_box_fits(b: &BoundingBox, image: ImageSize) -> bool {
    let (w, h) = (image.width() as i64, image.height() as i64);
    b.left >= 0 && b.top >= 0 && i64::from(b.right) < w && i64::from(b.bottom) < h
}

/// Image size, or the largest size within [`MAX_WINDOW_SIZE`] with the same
/// aspect ratio (truncated).
pub fn initial_window_size(image: ImageSize) -> WindowSize {
    let (max_w, max_h) = MAX_WINDOW_SIZE;
    let (w, h) = (image.width(), image.height());

    let (width, height) = if w <= max_w && h <= max_h {
        (w, h)
    } else {
        let image_to_window = (f64::from(w) / f64::from(h)) / (f64::from(max_w) / f64::from(max_h));
        if image_to_window > 1.0 {
            (max_w, (f64::from(max_h) / image_to_window) as u32)
        } else {
            ((f64::from(max_w) * image_to_window) as u32, max_h)
        }
    };

    if width != w || height != h {
        log::debug!("image {image} is larger than the maximal window, fitting to {width}x{height}");
    }

    WindowSize::new(width.max(1), height.max(1)).unwrap_or(WindowSize::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> ImageSize {
        ImageSize::new(w, h).unwrap()
    }

    fn cli(image: Option<&str>, record: Option<&str>) -> Cli {
        Cli {
            image_path: image.map(PathBuf::from),
            bounding_box: record.map(PathBuf::from),
            debug: false,
            log_file: None,
        }
    }

    // ── initial window size ───────────────────────────────────────────────

    #[test]
    fn small_images_keep_their_size() {
        assert_eq!(initial_window_size(image(800, 600)), WindowSize::new(800, 600).unwrap());
        assert_eq!(initial_window_size(image(1600, 1200)), WindowSize::new(1600, 1200).unwrap());
    }

    #[test]
    fn wide_images_fit_the_width() {
        assert_eq!(initial_window_size(image(3200, 1200)), WindowSize::new(1600, 600).unwrap());
    }

    #[test]
    fn tall_images_fit_the_height() {
        assert_eq!(initial_window_size(image(1000, 3000)), WindowSize::new(400, 1200).unwrap());
    }

    #[test]
    fn fitted_size_keeps_the_aspect_ratio() {
        for (w, h) in [(4000, 2500), (2000, 1300), (1601, 1201), (5000, 7000), (2048, 2048)] {
            let s = initial_window_size(image(w, h));
            assert!(s.width() <= 1600 && s.height() <= 1200, "{s}");
            assert!(s.width() == 1600 || s.height() == 1200, "{s}");
            let before = f64::from(w) / f64::from(h);
            let after = f64::from(s.width()) / f64::from(s.height());
            assert!((before - after).abs() / before < 0.01, "{w}x{h} -> {s}");
        }
    }

    #[test]
    fn extreme_aspect_never_collapses() {
        let s = initial_window_size(image(100_000, 1));
        assert_eq!(s.width(), 1600);
        assert!(s.height() >= 1);
    }

    // ── path resolution ───────────────────────────────────────────────────

    #[test]
    fn no_arguments_use_the_bundled_sample() {
        let c = GameConfig::resolve(cli(None, None), Path::new("assets")).unwrap();
        assert_eq!(c.image_path, Path::new("assets").join(DEFAULT_IMAGE));
        assert_eq!(c.bounding_box_path, Path::new("assets").join(DEFAULT_RECORD));
    }

    #[test]
    fn record_without_image_uses_the_bundled_pair() {
        let c = GameConfig::resolve(cli(None, Some("mine.json")), Path::new("assets")).unwrap();
        assert_eq!(c.image_path, Path::new("assets").join(DEFAULT_IMAGE));
        assert_eq!(c.bounding_box_path, Path::new("assets").join(DEFAULT_RECORD));
    }

    #[test]
    fn image_without_record_is_an_error() {
        let err = GameConfig::resolve(cli(Some("x.png"), None), Path::new("assets")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRecord { .. }));
        assert!(err.to_string().contains("x.png"));
    }

    #[test]
    fn explicit_paths_are_kept() {
        let c = GameConfig::resolve(cli(Some("x.png"), Some("x.json")), Path::new("assets")).unwrap();
        assert_eq!(c.image_path, PathBuf::from("x.png"));
        assert_eq!(c.bounding_box_path, PathBuf::from("x.json"));
    }

    #[test]
    fn debug_selects_the_verbose_filter() {
        let mut c = GameConfig::resolve(cli(None, None), Path::new("d")).unwrap();
        assert_eq!(c.logging().env_filter, None);
        c.debug = true;
        let filter = c.logging().env_filter.unwrap();
        assert!(filter.contains("waldo_game=debug") && filter.contains("naga=warn"));
    }

    // ── asset loading ─────────────────────────────────────────────────────

    #[test]
    fn loads_image_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("img.png");
        let record_path = dir.path().join("box.json");
        RgbaImage::new(40, 20).save(&image_path).unwrap();
        std::fs::write(&record_path, r#"{"left": 1, "top": 2, "right": 3, "bottom": 4}"#).unwrap();

        let config = GameConfig::resolve(
            Cli {
                image_path: Some(image_path),
                bounding_box: Some(record_path),
                debug: false,
                log_file: None,
            },
            dir.path(),
        )
        .unwrap();
        let assets = GameAssets::load(&config).unwrap();
        assert_eq!(assets.image.dimensions(), (40, 20));
        assert_eq!(assets.initial_window_size, WindowSize::new(40, 20).unwrap());
        assert_eq!(assets.bounding_box.marker_radius(), 1);
    }

    #[test]
    fn bundled_sample_loads() {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        let config = GameConfig::resolve(cli(None, None), &data).unwrap();
        let assets = GameAssets::load(&config).unwrap();
        let size = image(assets.image.width(), assets.image.height());
        assert!(bounding_box_fits(&assets.bounding_box, size));
        assert_eq!(assets.initial_window_size, WindowSize::new(1200, 900).unwrap());
    }

    #[test]
    fn unreadable_image_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let record_path = dir.path().join("box.json");
        std::fs::write(&record_path, r#"{"left": 1, "top": 2, "right": 3, "bottom": 4}"#).unwrap();
        let image_path = dir.path().join("img.png");
        std::fs::write(&image_path, b"not an image").unwrap();

        let config = GameConfig {
            image_path,
            bounding_box_path: record_path,
            debug: false,
            log_file: None,
        };
        assert!(matches!(GameAssets::load(&config), Err(ConfigError::LoadImage { .. })));
    }

    #[test]
    fn bounding_box_bounds_check() {
        let img = image(10, 10);
        assert!(bounding_box_fits(&BoundingBox::new(0, 0, 9, 9).unwrap(), img));
        assert!(!bounding_box_fits(&BoundingBox::new(0, 0, 10, 9).unwrap(), img));
        assert!(!bounding_box_fits(&BoundingBox::new(-1, 0, 5, 5).unwrap(), img));
    }
}
