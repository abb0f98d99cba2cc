use anyhow::Error;
use nalgebra::Point2;
use opencv::core::{Mat, MatTrait, MatTraitConst, Point, Scalar, Vec3b, Vector, CV_8UC1};
use opencv::imgproc::{fill_poly, polylines, LINE_8};
use tracing::debug;

use crate::config::config::LipRenderConfig;
use crate::helper::lip_helper::LipHelper;
use crate::utils::color::{adjust_color, decode_hex, LipColor};
use crate::utils::utils::{u8_to_unit_f32, unit_f32_to_u8};

/// Two-stop vertical gradient over the lip bounding span. Offset 0 sits at
/// `top_y`, offset 1 at `bottom_y`.
#[derive(Debug, Clone, PartialEq)]
pub struct LipGradient {
    pub top: [u8; 3],
    pub bottom: [u8; 3],
    pub top_y: f32,
    pub bottom_y: f32,
}

impl LipGradient {
    /// color_at interpolates the gradient at a pixel row and returns unit
    /// RGB channels. A zero-height span resolves to the top stop.
    pub fn color_at(&self, y: f32) -> [f32; 3] {
        let span = self.bottom_y - self.top_y;
        let t = if span <= f32::EPSILON {
            0.0
        } else {
            ((y - self.top_y) / span).clamp(0.0, 1.0)
        };

        let mut shade = [0f32; 3];
        for c in 0..3 {
            let top = self.top[c] as f32 / 255.0;
            let bottom = self.bottom[c] as f32 / 255.0;
            shade[c] = top + (bottom - top) * t;
        }
        shade
    }
}

/// soft_light_channel blends one unit-interval channel of the gradient
/// into the base image channel.
///
/// base < 0.5: 2*base*blend + base^2 * (1 - 2*blend)
/// otherwise:  2*base*(1 - blend) + sqrt(base) * (2*blend - 1)
pub fn soft_light_channel(base: f32, blend: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * blend + base * base * (1.0 - 2.0 * blend)
    } else {
        2.0 * base * (1.0 - blend) + base.sqrt() * (2.0 * blend - 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct LipCompositor {
    pub shade_offset: i32,
    pub min_inner_area: f32,
}

impl LipCompositor {
    /// new initializes a new instance of the lip compositor module.
    pub fn new(config: LipRenderConfig) -> Self {
        LipCompositor {
            shade_offset: config.shade_offset,
            min_inner_area: config.min_inner_area,
        }
    }

    /// build_lip_mask rasterizes the region between the outer and inner
    /// contours into a single-channel mask, nonzero = paintable.
    ///
    /// Both contours go into one fill call; the parity fill rule carves
    /// the inner loop out of the outer one regardless of winding order. An
    /// inner contour collapsed below `min_inner_area` (closed mouth) is
    /// left out, so the mask degenerates to the full outer fill.
    ///
    /// # Arguments
    /// * `rows` - image height in pixels
    /// * `cols` - image width in pixels
    /// * `outer` - outer lip contour in pixel space
    /// * `inner` - inner mouth contour in pixel space
    ///
    /// # Returns
    /// * `Result<Mat, Error>`
    pub fn build_lip_mask(
        &self,
        rows: i32,
        cols: i32,
        outer: &[Point2<f32>],
        inner: &[Point2<f32>],
    ) -> Result<Mat, Error> {
        let mut mask = Mat::new_rows_cols_with_default(rows, cols, CV_8UC1, Scalar::all(0.0))?;

        let mut polygons: Vector<Vector<Point>> = Vector::new();
        polygons.push(to_pixel_polygon(outer));

        let inner_area = LipHelper::contour_area(inner);
        if inner_area > self.min_inner_area {
            polygons.push(to_pixel_polygon(inner));
        } else {
            debug!(inner_area, "inner contour degenerate, filling full lip region");
        }

        fill_poly(
            &mut mask,
            &polygons,
            Scalar::all(255.0),
            LINE_8,
            0,
            Point::default(),
        )?;

        Ok(mask)
    }

    /// build_gradient derives the two gradient stops from the requested
    /// shade: the top stop is the shade itself, the bottom stop the shade
    /// darkened by the configured per-channel offset.
    ///
    /// # Arguments
    /// * `color` - requested lip shade
    /// * `top_y` - min y of the outer contour, pixel space
    /// * `bottom_y` - max y of the outer contour, pixel space
    ///
    /// # Returns
    /// * `Result<LipGradient, Error>`
    pub fn build_gradient(
        &self,
        color: &LipColor,
        top_y: f32,
        bottom_y: f32,
    ) -> Result<LipGradient, Error> {
        let top = color.rgb()?;
        let bottom = decode_hex(&adjust_color(&color.hex, self.shade_offset)?)?;

        Ok(LipGradient {
            top,
            bottom,
            top_y,
            bottom_y,
        })
    }

    /// composite blends the gradient into the image with the soft-light
    /// function, touching only pixels the mask admits.
    ///
    /// The sweep covers the full image width across the gradient's
    /// vertical span, the way the original filled a full-width rectangle
    /// under an even-odd clip. Everything here is infallible pixel work on
    /// buffers that were validated up front, so an aborted run never
    /// leaves the caller's image half painted.
    ///
    /// # Arguments
    /// * `img` - RGB matrix, mutated in place
    /// * `mask` - single-channel mask from `build_lip_mask`
    /// * `gradient` - fill paint from `build_gradient`
    ///
    /// # Returns
    /// * `Result<(), Error>`
    pub fn composite(&self, img: &mut Mat, mask: &Mat, gradient: &LipGradient) -> Result<(), Error> {
        let rows = img.rows();
        let cols = img.cols();

        let row_start = gradient.top_y.floor().max(0.0) as i32;
        let row_end = (gradient.bottom_y.ceil() as i32).min(rows - 1);

        for y in row_start..=row_end {
            let shade = gradient.color_at(y as f32);
            for x in 0..cols {
                if *mask.at_2d::<u8>(y, x)? == 0 {
                    continue;
                }
                let pixel = img.at_2d_mut::<Vec3b>(y, x)?;
                for c in 0..3 {
                    let base = u8_to_unit_f32(pixel[c]);
                    pixel[c] = unit_f32_to_u8(soft_light_channel(base, shade[c]));
                }
            }
        }

        Ok(())
    }

    /// stroke_contours draws the selected contours on top of the rendered
    /// image, outer in green and inner in red, for visual debugging of the
    /// landmark topology.
    ///
    /// # Arguments
    /// * `img` - RGB matrix, mutated in place
    /// * `outer` - outer lip contour in pixel space
    /// * `inner` - inner mouth contour in pixel space
    ///
    /// # Returns
    /// * `Result<(), Error>`
    pub fn stroke_contours(
        &self,
        img: &mut Mat,
        outer: &[Point2<f32>],
        inner: &[Point2<f32>],
    ) -> Result<(), Error> {
        let mut outer_polygon: Vector<Vector<Point>> = Vector::new();
        outer_polygon.push(to_pixel_polygon(outer));
        polylines(img, &outer_polygon, true, Scalar::new(0.0, 255.0, 0.0, 0.0), 2, LINE_8, 0)?;

        let mut inner_polygon: Vector<Vector<Point>> = Vector::new();
        inner_polygon.push(to_pixel_polygon(inner));
        polylines(img, &inner_polygon, true, Scalar::new(255.0, 0.0, 0.0, 0.0), 2, LINE_8, 0)?;

        Ok(())
    }
}

fn to_pixel_polygon(points: &[Point2<f32>]) -> Vector<Point> {
    points
        .iter()
        .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
        .collect()
}

#[cfg(test)]
mod tests {
    use nalgebra::Point2;
    use opencv::core::{Mat, MatTraitConst, Scalar, Vec3b, CV_8UC3};

    use crate::config::config::LipRenderConfig;
    use crate::modules::lip_compositor::{soft_light_channel, LipCompositor, LipGradient};
    use crate::utils::color::LipColor;

    fn rect_contour(left: f32, top: f32, right: f32, bottom: f32) -> Vec<Point2<f32>> {
        vec![
            Point2::new(left, top),
            Point2::new(right, top),
            Point2::new(right, bottom),
            Point2::new(left, bottom),
        ]
    }

    fn mask_at(mask: &Mat, x: i32, y: i32) -> u8 {
        *mask.at_2d::<u8>(y, x).unwrap()
    }

    #[test]
    fn test_mask_is_ring_between_contours() {
        let compositor = LipCompositor::new(LipRenderConfig::new());
        let outer = rect_contour(40.0, 60.0, 60.0, 70.0);
        let inner = rect_contour(45.0, 63.0, 55.0, 67.0);

        let mask = compositor.build_lip_mask(100, 100, &outer, &inner).unwrap();

        // between the contours: paintable
        assert_ne!(mask_at(&mask, 42, 65), 0);
        // inside the inner contour: the mouth opening stays clear
        assert_eq!(mask_at(&mask, 50, 65), 0);
        // outside the outer contour: untouched
        assert_eq!(mask_at(&mask, 20, 65), 0);
        assert_eq!(mask_at(&mask, 50, 30), 0);
    }

    #[test]
    fn test_mask_degenerate_inner_fills_whole_lip() {
        let compositor = LipCompositor::new(LipRenderConfig::new());
        let outer = rect_contour(40.0, 60.0, 60.0, 70.0);
        let collapsed = vec![Point2::new(50.0, 65.0); 21];

        let with_collapsed = compositor
            .build_lip_mask(100, 100, &outer, &collapsed)
            .unwrap();
        let outer_only = compositor.build_lip_mask(100, 100, &outer, &[]).unwrap();

        assert_eq!(
            with_collapsed.data_bytes().unwrap(),
            outer_only.data_bytes().unwrap()
        );
        assert_ne!(mask_at(&with_collapsed, 50, 65), 0);
    }

    #[test]
    fn test_gradient_stops() {
        let compositor = LipCompositor::new(LipRenderConfig::new());
        let color = LipColor::new("Classic Red", "#C41E3A");
        let gradient = compositor.build_gradient(&color, 60.0, 70.0).unwrap();

        assert_eq!(gradient.top, [0xC4, 0x1E, 0x3A]);
        // each channel shifted by -30 and clamped at zero
        assert_eq!(gradient.bottom, [0xA6, 0x00, 0x1C]);

        let top_shade = gradient.color_at(60.0);
        assert!((top_shade[0] - 196.0 / 255.0).abs() < 1e-6);
        let bottom_shade = gradient.color_at(70.0);
        assert!((bottom_shade[1] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_gradient_degenerate_span_is_solid_top_stop() {
        let compositor = LipCompositor::new(LipRenderConfig::new());
        let color = LipColor::new("Classic Red", "#C41E3A");
        let gradient = compositor.build_gradient(&color, 64.0, 64.0).unwrap();

        for y in [0.0, 64.0, 200.0] {
            let shade = gradient.color_at(y);
            assert!(shade.iter().all(|c| c.is_finite()));
            assert!((shade[0] - 196.0 / 255.0).abs() < 1e-6);
            assert!((shade[1] - 30.0 / 255.0).abs() < 1e-6);
            assert!((shade[2] - 58.0 / 255.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_soft_light_identities() {
        // black and white are fixed points
        assert_eq!(soft_light_channel(0.0, 0.3), 0.0);
        assert_eq!(soft_light_channel(1.0, 0.8), 1.0);
        // a 0.5 blend leaves the base unchanged
        for base in [0.0, 0.2, 0.5, 0.7, 1.0] {
            assert!((soft_light_channel(base, 0.5) - base).abs() < 1e-6);
        }
        // darker blends darken, lighter blends lighten
        assert!(soft_light_channel(0.4, 0.1) < 0.4);
        assert!(soft_light_channel(0.4, 0.9) > 0.4);
    }

    #[test]
    fn test_composite_touches_only_masked_pixels() {
        let compositor = LipCompositor::new(LipRenderConfig::new());
        let outer = rect_contour(40.0, 60.0, 60.0, 70.0);

        let source = Mat::new_rows_cols_with_default(
            100,
            100,
            CV_8UC3,
            Scalar::new(128.0, 128.0, 128.0, 0.0),
        )
        .unwrap();
        let mut img = source.clone();

        let mask = compositor.build_lip_mask(100, 100, &outer, &[]).unwrap();
        let color = LipColor::new("Classic Red", "#C41E3A");
        let gradient = compositor.build_gradient(&color, 60.0, 70.0).unwrap();
        compositor.composite(&mut img, &mask, &gradient).unwrap();

        // inside the region the pixels moved
        let inside = img.at_2d::<Vec3b>(65, 50).unwrap();
        assert_ne!((inside[0], inside[1], inside[2]), (128, 128, 128));

        // a masked pixel matches the blend computed from the same inputs
        let shade = gradient.color_at(65.0);
        let expected: Vec<u8> = (0..3)
            .map(|c| {
                crate::utils::utils::unit_f32_to_u8(soft_light_channel(
                    128.0 / 255.0,
                    shade[c],
                ))
            })
            .collect();
        assert_eq!((inside[0], inside[1], inside[2]), (expected[0], expected[1], expected[2]));

        // everything outside is bit-identical
        for (x, y) in [(10, 10), (50, 30), (20, 65), (90, 90), (50, 80)] {
            let before = source.at_2d::<Vec3b>(y, x).unwrap();
            let after = img.at_2d::<Vec3b>(y, x).unwrap();
            assert_eq!(
                (before[0], before[1], before[2]),
                (after[0], after[1], after[2])
            );
        }
    }

    #[test]
    fn test_stroke_contours_marks_outlines() {
        let compositor = LipCompositor::new(LipRenderConfig::new());
        let mut img = Mat::new_rows_cols_with_default(
            100,
            100,
            CV_8UC3,
            Scalar::new(128.0, 128.0, 128.0, 0.0),
        )
        .unwrap();

        let outer = rect_contour(40.0, 60.0, 60.0, 70.0);
        let inner = rect_contour(45.0, 63.0, 55.0, 67.0);
        compositor.stroke_contours(&mut img, &outer, &inner).unwrap();

        // top edge of the outer contour strokes green
        let px = img.at_2d::<Vec3b>(60, 50).unwrap();
        assert_eq!((px[0], px[1], px[2]), (0, 255, 0));
        // top edge of the inner contour strokes red
        let px = img.at_2d::<Vec3b>(63, 50).unwrap();
        assert_eq!((px[0], px[1], px[2]), (255, 0, 0));
        // untouched elsewhere
        let px = img.at_2d::<Vec3b>(20, 20).unwrap();
        assert_eq!((px[0], px[1], px[2]), (128, 128, 128));
    }

    #[test]
    fn test_composite_span_outside_image_is_noop() {
        let compositor = LipCompositor::new(LipRenderConfig::new());
        let source = Mat::new_rows_cols_with_default(
            50,
            50,
            CV_8UC3,
            Scalar::new(90.0, 90.0, 90.0, 0.0),
        )
        .unwrap();
        let mut img = source.clone();

        let mask = Mat::new_rows_cols_with_default(50, 50, opencv::core::CV_8UC1, Scalar::all(255.0))
            .unwrap();
        let gradient = LipGradient {
            top: [200, 0, 0],
            bottom: [100, 0, 0],
            top_y: 120.0,
            bottom_y: 140.0,
        };
        compositor.composite(&mut img, &mask, &gradient).unwrap();

        assert_eq!(
            source.data_bytes().unwrap(),
            img.data_bytes().unwrap()
        );
    }
}
