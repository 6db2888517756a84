//! Land/water classification from an aerial raster.

use crate::error::RouteError;
use crate::models::{BoundingBox, GridShape, RasterImage, WaterSpec};

/// Imagery is requested at this multiple of the grid's linear resolution so
/// every grid cell has several candidate pixels.
pub const RASTER_OVERSAMPLE: usize = 5;

/// Per-cell traversability, immutable once computed. `true` = land.
#[derive(Debug, Clone)]
pub struct LandMask {
    shape: GridShape,
    cells: Vec<bool>,
}

impl LandMask {
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn is_land(&self, index: usize) -> bool {
        self.cells[index]
    }

    pub fn land_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    #[cfg(test)]
    pub(crate) fn from_cells(shape: GridShape, cells: Vec<bool>) -> Self {
        assert_eq!(cells.len(), shape.len());
        Self { shape, cells }
    }
}

/// Classify each grid cell as land or water by sampling one raster pixel per
/// cell center.
///
/// The raster's actual coverage (`image.bbox`) may differ slightly from the
/// requested `bbox`; the cell-center-to-pixel map scales by the ratio of the
/// grid span to the image span. Image row 0 and grid row 0 are both the
/// northern edge, so rows map without a flip (checked by the reference-raster
/// test below rather than assumed).
pub fn classify(
    bbox: &BoundingBox,
    shape: GridShape,
    image: &RasterImage,
    water: &WaterSpec,
) -> Result<LandMask, RouteError> {
    if image.width == 0 || image.height == 0 {
        return Err(RouteError::Classification("empty raster".into()));
    }
    if image.pixels.len() != image.width * image.height * 3 {
        return Err(RouteError::Classification(format!(
            "raster pixel buffer is {} bytes, expected {} for {}x{} RGB",
            image.pixels.len(),
            image.width * image.height * 3,
            image.width,
            image.height
        )));
    }
    let dlat_img = image.bbox.lat_span();
    let dlon_img = image.bbox.lon_span();
    if dlat_img <= 0.0 || dlon_img <= 0.0 {
        return Err(RouteError::Classification(
            "raster bounding box has no extent".into(),
        ));
    }

    // Affine map from cell index to pixel coordinates. Cells partition the
    // grid box into nx x ny rectangles; we sample the pixel under each
    // rectangle's center.
    let offset_y = image.height as f64 * (image.bbox.lat_max - bbox.lat_max) / dlat_img;
    let cell_h = image.height as f64 * bbox.lat_span() / dlat_img / shape.ny as f64;
    let west_delta = (bbox.lon_min - image.bbox.lon_min).rem_euclid(360.0);
    let offset_x = image.width as f64 * west_delta / dlon_img;
    let cell_w = image.width as f64 * bbox.lon_span() / dlon_img / shape.nx as f64;

    let mut cells = vec![false; shape.len()];
    for row in 0..shape.ny {
        let py = offset_y + cell_h * (row as f64 + 0.5);
        let py = (py.floor() as i64).clamp(0, image.height as i64 - 1) as usize;
        for col in 0..shape.nx {
            let px = offset_x + cell_w * (col as f64 + 0.5);
            let px = (px.floor() as i64).clamp(0, image.width as i64 - 1) as usize;
            cells[shape.index(row, col)] = !is_water_pixel(image.rgb_at(py, px), water);
        }
    }
    Ok(LandMask { shape, cells })
}

/// A pixel is water when its squared RGB distance to the reference water
/// color falls strictly below the tolerance.
fn is_water_pixel(rgb: [u8; 3], water: &WaterSpec) -> bool {
    let mut dist2 = 0.0;
    for (channel, reference) in rgb.iter().zip(water.rgb.iter()) {
        let delta = f64::from(*channel) - f64::from(*reference);
        dist2 += delta * delta;
    }
    dist2 < water.tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER_RGB: [u8; 3] = [0, 0, 255];
    const LAND_RGB: [u8; 3] = [40, 160, 40];

    fn raster(bbox: BoundingBox, width: usize, height: usize, rows: &[&[u8; 3]]) -> RasterImage {
        assert_eq!(rows.len(), height);
        let mut pixels = Vec::with_capacity(width * height * 3);
        for rgb in rows {
            for _ in 0..width {
                pixels.extend_from_slice(*rgb);
            }
        }
        RasterImage {
            pixels,
            width,
            height,
            bbox,
        }
    }

    fn unit_bbox() -> BoundingBox {
        BoundingBox {
            lat_min: 46.0,
            lon_min: 10.0,
            lat_max: 47.0,
            lon_max: 11.0,
        }
    }

    #[test]
    fn reference_raster_fixes_row_orientation() {
        // Northern half water, southern half land. Grid row 0 (north) must
        // come out as water; a flipped row map would invert this.
        let bbox = unit_bbox();
        let image = raster(
            bbox,
            10,
            10,
            &[
                &WATER_RGB, &WATER_RGB, &WATER_RGB, &WATER_RGB, &WATER_RGB, &LAND_RGB, &LAND_RGB,
                &LAND_RGB, &LAND_RGB, &LAND_RGB,
            ],
        );
        let shape = GridShape::new(4, 4);
        let mask = classify(&bbox, shape, &image, &WaterSpec::default()).unwrap();
        for col in 0..4 {
            assert!(!mask.is_land(shape.index(0, col)), "north row must be water");
            assert!(mask.is_land(shape.index(3, col)), "south row must be land");
        }
    }

    #[test]
    fn tolerance_is_a_strict_upper_bound_for_water() {
        let water = WaterSpec::default();
        // Exactly at the tolerance: sqrt(25_000) off in one channel rounds to
        // a non-integer, so straddle it instead.
        assert!(is_water_pixel([0, 0, 255], &water));
        assert!(is_water_pixel([90, 90, 255], &water)); // 2*8100 < 25000
        assert!(!is_water_pixel([100, 100, 155], &water)); // 3*10000 >= 25000
    }

    #[test]
    fn image_bbox_larger_than_grid_bbox_shifts_sampling() {
        // Image covers twice the grid's extent; the grid sits in the image's
        // north-west quadrant, which is water. The rest is land.
        let grid_bbox = unit_bbox();
        let image_bbox = BoundingBox {
            lat_min: 45.0,
            lon_min: 10.0,
            lat_max: 47.0,
            lon_max: 12.0,
        };
        let width = 8;
        let height = 8;
        let mut pixels = Vec::with_capacity(width * height * 3);
        for row in 0..height {
            for col in 0..width {
                let rgb = if row < height / 2 && col < width / 2 {
                    WATER_RGB
                } else {
                    LAND_RGB
                };
                pixels.extend_from_slice(&rgb);
            }
        }
        let image = RasterImage {
            pixels,
            width,
            height,
            bbox: image_bbox,
        };
        let shape = GridShape::new(3, 3);
        let mask = classify(&grid_bbox, shape, &image, &WaterSpec::default()).unwrap();
        for index in 0..shape.len() {
            assert!(!mask.is_land(index), "whole grid lies in the water quadrant");
        }
    }

    #[test]
    fn rejects_mismatched_pixel_buffer() {
        let bbox = unit_bbox();
        let image = RasterImage {
            pixels: vec![0; 10],
            width: 4,
            height: 4,
            bbox,
        };
        let err = classify(&bbox, GridShape::new(2, 2), &image, &WaterSpec::default()).unwrap_err();
        assert!(matches!(err, RouteError::Classification(_)));
    }
}
