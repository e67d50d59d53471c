use detectron2_rs::image_utils::image_io::read_image_as_rgb8;
use detectron2_rs::{DetectionConfig, Detector};
use serde_json::json;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn collect_images(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_image(entry.path()) => {
                    images.push(entry.into_path());
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "skipping unreadable path"),
            }
        }
    }
    images
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut of_interest = false;
    let mut roots = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--of-interest" {
            of_interest = true;
        } else {
            roots.push(PathBuf::from(arg));
        }
    }
    if roots.is_empty() {
        return Err("usage: detectron2-rs [--of-interest] <image-or-directory>...".into());
    }

    let config = DetectionConfig::from_env()?;
    let mut detector = Detector::new(config)?;
    info!(device = %detector.device(), "detector ready");

    let images = collect_images(&roots);
    if images.is_empty() {
        warn!("no images found");
    }
    for path in images {
        let image = read_image_as_rgb8(&path)?;
        let result = if of_interest {
            detector.detect_of_interest(&image)?
        } else {
            detector.detect(&image)?
        };
        let (boxes, classes, confidences) = result.into_parts();
        println!(
            "{}",
            json!({
                "image": path.display().to_string(),
                "boxes": boxes,
                "classes": classes,
                "confidences": confidences,
            })
        );
    }
    Ok(())
}
