use image::DynamicImage;
use tracing::{debug, info};

use crate::error::FemError;

/// Grayscale rows of an image, top row first
fn grayscale_rows(image: &DynamicImage) -> Vec<Vec<u8>> {
    image
        .to_luma8()
        .rows()
        .map(|row| row.map(|pixel| pixel.0[0]).collect())
        .collect()
}

/// Reads a bitmap file (bmp, png) as rows of grayscale intensities
///
/// # Arguments
/// * `path` - The path to the image file
pub fn load_bitmap(path: &str) -> Result<Vec<Vec<u8>>, FemError> {
    let image = match image::open(path) {
        Ok(img) => img,
        Err(err) => {
            return Err(FemError::Input(format!(
                "Unable to read bitmap {path}: {err}"
            )))
        }
    };
    info!(
        "loaded {}x{} bitmap from {}",
        image.width(),
        image.height(),
        path
    );

    Ok(grayscale_rows(&image))
}

/// Decodes an encoded image held in memory as rows of grayscale intensities
pub fn decode_bitmap(bytes: &[u8]) -> Result<Vec<Vec<u8>>, FemError> {
    match image::load_from_memory(bytes) {
        Ok(img) => Ok(grayscale_rows(&img)),
        Err(err) => Err(FemError::Input(format!("Unable to decode bitmap: {err}"))),
    }
}

/// Converts a grayscale bitmap into a binary source field
///
/// Pixels are read row by row, inverted and normalised to `[0, 1]`, then
/// every non-zero value is set to exactly 1. Dark pixels therefore mark the
/// source region and white pixels are empty. There must be one pixel per
/// mesh node; pixel `k` of the flattened bitmap becomes the source at node `k`.
///
/// # Arguments
/// * `pixels` - Rows of 8-bit intensities
/// * `num_nodes` - The number of nodes in the mesh
pub fn source_from_bitmap(pixels: &[Vec<u8>], num_nodes: usize) -> Result<Vec<f64>, FemError> {
    if let Some(first) = pixels.first() {
        if let Some(row) = pixels.iter().position(|r| r.len() != first.len()) {
            return Err(FemError::Input(format!(
                "Bitmap row {row} has {} pixels, expected {}",
                pixels[row].len(),
                first.len()
            )));
        }
    }

    let num_pixels: usize = pixels.iter().map(Vec::len).sum();
    if num_pixels != num_nodes {
        return Err(FemError::CoefficientLength {
            name: "bitmap pixels",
            expected: num_nodes,
            found: num_pixels,
        });
    }

    let source: Vec<f64> = pixels
        .iter()
        .flatten()
        .map(|&p| (255.0 - f64::from(p)) / 255.0)
        .map(|s| if s != 0.0 { 1.0 } else { 0.0 })
        .collect();

    debug!(
        "bitmap source covers {} of {} nodes",
        source.iter().filter(|&&s| s == 1.0).count(),
        num_nodes
    );

    Ok(source)
}

pub fn uniform_source(num_nodes: usize, value: f64) -> Vec<f64> {
    vec![value; num_nodes]
}
