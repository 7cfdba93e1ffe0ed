//! Slice preview rendering
//!
//! The annotation surface has no native display, so the slice it shows is
//! rendered to PNG: gray levels stretched between the slice's minimum and
//! maximum, confirmed points in green and the unconfirmed point in red.

use std::path::{Path, PathBuf};

use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use log::{debug, info};

use crate::annotation::Annotation;
use crate::errors::PatchResult;
use crate::volume::Volume;

/// Colour of confirmed annotations
pub const CONFIRMED_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
/// Colour of the point awaiting a label
pub const PENDING_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Marker radius in slice pixels
pub const MARKER_RADIUS: i64 = 3;

/// Converts one slice to 8-bit gray, stretched to its own value range
///
/// Non-finite samples render black. A constant slice renders black.
pub fn slice_to_gray(volume: &Volume, z: usize) -> Option<GrayImage> {
    let values = volume.plane_values(z)?;
    let (height, width) = values.dim();

    let (min, max) = values.iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    debug!("Slice {} value range [{}, {}]", z, min, max);

    let mut gray = GrayImage::new(width as u32, height as u32);
    for ((y, x), &value) in values.indexed_iter() {
        let level = if value.is_finite() && range > 0.0 {
            ((value - min) / range * 255.0).round() as u8
        } else {
            0
        };
        gray.put_pixel(x as u32, y as u32, Luma([level]));
    }
    Some(gray)
}

fn draw_marker(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    let (width, height) = (image.width() as i64, image.height() as i64);
    for dy in -MARKER_RADIUS..=MARKER_RADIUS {
        for dx in -MARKER_RADIUS..=MARKER_RADIUS {
            if dx * dx + dy * dy > MARKER_RADIUS * MARKER_RADIUS {
                continue;
            }
            let (px, py) = (x.saturating_add(dx), y.saturating_add(dy));
            if px >= 0 && py >= 0 && px < width && py < height {
                image.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Renders slice `z` with its markers, cropped to `window`
///
/// `window` is `(x0, y0, x1, y1)` in slice pixels; `None` keeps the whole
/// slice.
pub fn render_annotated_slice(
    volume: &Volume,
    z: usize,
    annotations: &[Annotation],
    pending: Option<(i64, i64)>,
    window: Option<(u32, u32, u32, u32)>
) -> Option<RgbImage> {
    let gray = slice_to_gray(volume, z)?;
    let mut image = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let level = gray.get_pixel(x, y)[0];
        Rgb([level, level, level])
    });

    for annotation in annotations {
        draw_marker(&mut image, annotation.point.x, annotation.point.y, CONFIRMED_COLOR);
    }
    if let Some((x, y)) = pending {
        draw_marker(&mut image, x, y, PENDING_COLOR);
    }

    match window {
        Some((x0, y0, x1, y1)) => Some(imageops::crop_imm(&image, x0, y0, x1 - x0, y1 - y0).to_image()),
        None => Some(image),
    }
}

/// Makes sure the output ends in `.png`
pub fn ensure_png_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => path.to_path_buf(),
        _ => path.with_extension("png"),
    }
}

/// Saves a rendered preview as PNG, returning the path written
pub fn save_preview(image: &RgbImage, path: &Path) -> PatchResult<PathBuf> {
    let final_path = ensure_png_extension(path);
    image.save(&final_path)?;
    info!("Preview written to {}", final_path.display());
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Point;
    use crate::volume::SampleType;

    fn gradient_volume() -> Volume {
        let bytes: Vec<u8> = (0..2 * 10 * 20)
            .flat_map(|i| ((i % 200) as u16 * 10).to_le_bytes())
            .collect();
        Volume::from_raw((2, 10, 20), SampleType::U16, bytes).unwrap()
    }

    #[test]
    fn gray_levels_span_full_range() {
        let gray = slice_to_gray(&gradient_volume(), 0).unwrap();
        assert_eq!(gray.get_pixel(0, 0)[0], 0);
        assert_eq!(gray.get_pixel(19, 9)[0], 255);
    }

    #[test]
    fn markers_and_crop() {
        let annotations = vec![Annotation { point: Point::new(5, 5, 1), label: "L1_C1__a".to_string() }];
        let image = render_annotated_slice(&gradient_volume(), 1, &annotations, Some((15, 2)), None).unwrap();
        assert_eq!(*image.get_pixel(5, 5), CONFIRMED_COLOR);
        assert_eq!(*image.get_pixel(15, 2), PENDING_COLOR);

        let cropped = render_annotated_slice(&gradient_volume(), 1, &annotations, None, Some((4, 4, 12, 8))).unwrap();
        assert_eq!(cropped.dimensions(), (8, 4));
        assert_eq!(*cropped.get_pixel(1, 1), CONFIRMED_COLOR);
    }

    #[test]
    fn preview_path_gets_png_extension() {
        assert_eq!(ensure_png_extension(Path::new("out/view.tif")), PathBuf::from("out/view.png"));
        assert_eq!(ensure_png_extension(Path::new("view.PNG")), PathBuf::from("view.PNG"));
    }
}
