use anyhow::Error;
use opencv::core::{Mat, MatTraitConst, Vector};
use opencv::imgcodecs::{imdecode, imencode, imwrite, IMREAD_COLOR};
use opencv::imgproc::{cvt_color, COLOR_BGR2RGB, COLOR_RGB2BGR};

use crate::error::LipstickError;

/// decode_image decodes an encoded image buffer into an RGB matrix.
///
/// Fails with `LipstickError::DecodeFailure` when the bytes do not decode
/// to a raster with known dimensions, before any mask or paint work runs.
///
/// # Arguments
/// * `im_bytes` - encoded image bytes (PNG, JPEG, ...)
///
/// # Returns
/// * `Result<Mat, Error>`
pub fn decode_image(im_bytes: &[u8]) -> Result<Mat, Error> {
    let img_as_mat = match Mat::from_slice(im_bytes) {
        Ok(img_as_mat) => img_as_mat,
        Err(e) => return Err(Error::from(e)),
    };

    let img_bgr = match imdecode(&img_as_mat, IMREAD_COLOR) {
        Ok(img_bgr) => img_bgr,
        Err(e) => {
            return Err(Error::from(LipstickError::DecodeFailure(e.to_string())))
        }
    };

    if img_bgr.empty() {
        return Err(Error::from(LipstickError::DecodeFailure(
            "decoder produced an image with no dimensions".to_string(),
        )));
    }

    let mut img_rgb = Mat::default();
    cvt_color(&img_bgr, &mut img_rgb, COLOR_BGR2RGB, 0)?;

    Ok(img_rgb)
}

/// encode_image serializes an RGB matrix into an encoded buffer.
///
/// # Arguments
/// * `img` - RGB matrix
/// * `ext` - target container extension, e.g. `".png"`
///
/// # Returns
/// * `Result<Vec<u8>, Error>`
pub fn encode_image(img: &Mat, ext: &str) -> Result<Vec<u8>, Error> {
    let mut img_bgr = Mat::default();
    cvt_color(img, &mut img_bgr, COLOR_RGB2BGR, 0)?;

    let mut buf: Vector<u8> = Vector::new();
    let encoded = imencode(ext, &img_bgr, &mut buf, &Vector::new())?;
    if !encoded {
        return Err(Error::msg(format!("image encoding to {} failed", ext)));
    }

    Ok(buf.to_vec())
}

/// save_image writes an RGB matrix to disk, for export of the rendered
/// preview.
///
/// # Arguments
/// * `path` - destination file path, format derived from the extension
/// * `img` - RGB matrix
///
/// # Returns
/// * `Result<(), Error>`
pub fn save_image(path: &str, img: &Mat) -> Result<(), Error> {
    let mut img_bgr = Mat::default();
    cvt_color(img, &mut img_bgr, COLOR_RGB2BGR, 0)?;

    let written = imwrite(path, &img_bgr, &Vector::new())?;
    if !written {
        return Err(Error::msg(format!("failed to write image to {}", path)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use opencv::core::{Mat, MatTraitConst, Scalar, Vec3b, CV_8UC3};

    use crate::error::LipstickError;
    use crate::utils::image::{decode_image, encode_image};

    #[test]
    fn test_decode_garbage_bytes_fails() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        let lipstick_err = err.downcast_ref::<LipstickError>();
        assert!(matches!(lipstick_err, Some(LipstickError::DecodeFailure(_))));
    }

    #[test]
    fn test_png_roundtrip_preserves_pixels() {
        let img = Mat::new_rows_cols_with_default(
            8,
            12,
            CV_8UC3,
            Scalar::new(210.0, 120.0, 90.0, 0.0),
        )
        .unwrap();

        let bytes = encode_image(&img, ".png").unwrap();
        let decoded = decode_image(&bytes).unwrap();

        assert_eq!(decoded.rows(), 8);
        assert_eq!(decoded.cols(), 12);
        let px = decoded.at_2d::<Vec3b>(3, 5).unwrap();
        assert_eq!((px[0], px[1], px[2]), (210, 120, 90));
    }
}
