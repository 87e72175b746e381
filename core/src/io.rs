//! GeoTIFF and PNG adapters around the flood engine.
//!
//! `GeoTiffSource` loads a single-band elevation raster and its georeferencing
//! from the ModelPixelScale (33550) / ModelTiepoint (33922) tags, optionally
//! cut to a bounding box given in the raster's own CRS. No reprojection is done.
//! `GeoTiffMaskSink` and `PngPreviewSink` persist a finished mask.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb};
use thiserror::Error;
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;
use tracing::{debug, info};

use crate::error::FloodError;
use crate::grid::{BoundingBox, ElevationGrid, FloodMask, GeoTransform, Grid, Window};
use crate::preview::flood_preview_rgb;
use crate::{LoadedRaster, RasterSink, RasterSource};

// tiff decodes these numbers into named variants, never `Tag::Unknown`
const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

/// Error type for raster loading and writing.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("missing geotransform: {0}")]
    MissingGeotransform(String),

    #[error("unsupported raster layout: {0}")]
    Unsupported(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("bounding box {0:?} does not intersect the raster")]
    EmptyWindow(BoundingBox),

    #[error(transparent)]
    Grid(#[from] FloodError),
}

impl From<tiff::TiffError> for RasterError {
    fn from(e: tiff::TiffError) -> Self {
        RasterError::Tiff(e.to_string())
    }
}

// Raster dimensions as TIFF/PNG expect them
fn dimensions_u32(width: usize, height: usize) -> Result<(u32, u32), RasterError> {
    let too_large = |_| {
        RasterError::Unsupported(format!(
            "{width}x{height} grid exceeds the 32-bit image size limit"
        ))
    };
    Ok((
        u32::try_from(width).map_err(too_large)?,
        u32::try_from(height).map_err(too_large)?,
    ))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RasterError + '_ {
    move |source| RasterError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Single-band GeoTIFF elevation source, decoded eagerly on open.
pub struct GeoTiffSource {
    values: Grid<f64>,
    transform: GeoTransform,
    nodata: Option<f64>,
}

impl GeoTiffSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(io_error(path))?;
        let mut decoder = Decoder::new(file)?;

        match decoder.colortype()? {
            ColorType::Gray(_) => {}
            other => {
                return Err(RasterError::Unsupported(format!(
                    "expected one band, found {other:?}"
                )));
            }
        }
        let (width, height) = decoder.dimensions()?;

        let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok();
        let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok();
        let transform = match (scale, tiepoint) {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => GeoTransform {
                origin_x: t[3] - t[0] * s[0],
                origin_y: t[4] + t[1] * s[1],
                pixel_width: s[0],
                pixel_height: s[1],
            },
            _ => {
                return Err(RasterError::MissingGeotransform(format!(
                    "{} lacks ModelPixelScale/ModelTiepoint tags",
                    path.display()
                )));
            }
        };
        let nodata = decoder
            .get_tag_ascii_string(GDAL_NODATA)
            .ok()
            .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok());

        let flat: Vec<f64> = match decoder.read_image()? {
            DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::F64(data) => data,
            DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        };
        let values = Grid::from_flat(width as usize, height as usize, flat)?;
        info!(
            path = %path.display(),
            width,
            height,
            ?nodata,
            "loaded elevation raster"
        );

        Ok(Self {
            values,
            transform,
            nodata,
        })
    }
}

impl RasterSource for GeoTiffSource {
    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn read_window(&self, bbox: Option<&BoundingBox>) -> Result<LoadedRaster, RasterError> {
        let Some(bbox) = bbox else {
            return Ok(LoadedRaster {
                values: self.values.clone(),
                transform: self.transform,
                nodata: self.nodata,
            });
        };
        let window = Window::from_bbox(
            &self.transform,
            bbox,
            self.values.width(),
            self.values.height(),
        )
        .ok_or(RasterError::EmptyWindow(*bbox))?;
        debug!(?window, "subsetting raster to bounding box");
        Ok(LoadedRaster {
            values: self.values.subset(&window)?,
            transform: self.transform.shifted(window.row, window.col),
            nodata: self.nodata,
        })
    }
}

/// Writes the mask as an 8-bit GeoTIFF: 1 flooded, 0 dry.
pub struct GeoTiffMaskSink {
    path: PathBuf,
}

impl GeoTiffMaskSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl RasterSink for GeoTiffMaskSink {
    fn write(
        &self,
        mask: &FloodMask,
        _grid: &ElevationGrid,
        _threshold: f64,
        transform: Option<&GeoTransform>,
    ) -> Result<(), RasterError> {
        let (width, height) = dimensions_u32(mask.width(), mask.height())?;
        let file = File::create(&self.path).map_err(io_error(&self.path))?;
        let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
        let mut image = encoder.new_image::<colortype::Gray8>(width, height)?;
        if let Some(t) = transform {
            let scale = [t.pixel_width, t.pixel_height, 0.0];
            let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
            image.encoder().write_tag(MODEL_PIXEL_SCALE, &scale[..])?;
            image.encoder().write_tag(MODEL_TIEPOINT, &tiepoint[..])?;
        }
        let data: Vec<u8> = mask.as_slice().iter().map(|&f| u8::from(f)).collect();
        image.write_data(&data)?;
        info!(path = %self.path.display(), "wrote flood mask GeoTIFF");
        Ok(())
    }
}

/// Writes an RGB PNG preview of the flood over the terrain.
pub struct PngPreviewSink {
    path: PathBuf,
}

impl PngPreviewSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl RasterSink for PngPreviewSink {
    fn write(
        &self,
        mask: &FloodMask,
        grid: &ElevationGrid,
        threshold: f64,
        _transform: Option<&GeoTransform>,
    ) -> Result<(), RasterError> {
        let (width, height) = dimensions_u32(mask.width(), mask.height())?;
        let rgb = flood_preview_rgb(grid, mask, threshold);
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, rgb)
            .ok_or_else(|| {
                RasterError::Unsupported("preview buffer does not match mask size".into())
            })?;
        img.save(&self.path)?;
        info!(path = %self.path.display(), "saved flood preview");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("flood_core_{}_{name}", std::process::id()))
    }

    #[test]
    fn mask_geotiff_is_readable_back() {
        let path = temp_path("mask.tif");
        let mask = Grid::from_rows(vec![vec![true, false, false], vec![false, true, true]])
            .unwrap();
        let grid = ElevationGrid::from_flat(3, 2, vec![0.0; 6]).unwrap();
        let transform = GeoTransform {
            origin_x: 500.0,
            origin_y: 7000.0,
            pixel_width: 10.0,
            pixel_height: 10.0,
        };
        GeoTiffMaskSink::new(&path)
            .write(&mask, &grid, 1.0, Some(&transform))
            .unwrap();

        let source = GeoTiffSource::open(&path).unwrap();
        assert_eq!(source.transform(), transform);
        let loaded = source.read_window(None).unwrap();
        assert_eq!(loaded.values.as_slice(), &[1.0, 0.0, 0.0, 0.0, 1.0, 1.0]);

        let sub = source
            .read_window(Some(&BoundingBox::new(510.0, 6980.0, 530.0, 6990.0)))
            .unwrap();
        assert_eq!(sub.values.to_rows(), vec![vec![1.0, 1.0]]);
        assert_eq!(sub.transform.origin_x, 510.0);
        assert_eq!(sub.transform.origin_y, 6990.0);

        assert!(matches!(
            source.read_window(Some(&BoundingBox::new(0.0, 0.0, 1.0, 1.0))),
            Err(RasterError::EmptyWindow(_))
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn untagged_tiff_has_no_geotransform() {
        let path = temp_path("plain.tif");
        let mask = Grid::filled(2, 2, true).unwrap();
        let grid = ElevationGrid::from_flat(2, 2, vec![0.0; 4]).unwrap();
        GeoTiffMaskSink::new(&path)
            .write(&mask, &grid, 1.0, None)
            .unwrap();
        assert!(matches!(
            GeoTiffSource::open(&path),
            Err(RasterError::MissingGeotransform(_))
        ));
        std::fs::remove_file(&path).ok();
    }

    // Float elevation GeoTIFF the way GDAL writes one, nodata tag included
    fn write_dem(path: &Path, width: u32, height: u32, values: &[f32], nodata: &str) {
        let file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(BufWriter::new(file)).unwrap();
        let mut image = encoder
            .new_image::<colortype::Gray32Float>(width, height)
            .unwrap();
        let scale = [2.0, 2.0, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, 100.0, 50.0, 0.0];
        image
            .encoder()
            .write_tag(MODEL_PIXEL_SCALE, &scale[..])
            .unwrap();
        image
            .encoder()
            .write_tag(MODEL_TIEPOINT, &tiepoint[..])
            .unwrap();
        image.encoder().write_tag(GDAL_NODATA, nodata).unwrap();
        image.write_data(values).unwrap();
    }

    #[test]
    fn dem_nodata_and_transform_read_back() {
        let path = temp_path("dem.tif");
        write_dem(
            &path,
            3,
            2,
            &[0.5, -9999.0, 2.0, 1.0, 1.5, -9999.0],
            "-9999",
        );

        let source = GeoTiffSource::open(&path).unwrap();
        assert_eq!(
            source.transform(),
            GeoTransform {
                origin_x: 100.0,
                origin_y: 50.0,
                pixel_width: 2.0,
                pixel_height: 2.0,
            }
        );
        let loaded = source.read_window(None).unwrap();
        assert_eq!(loaded.nodata, Some(-9999.0));
        assert_eq!(loaded.values.get(0, 1), Some(&-9999.0));
        assert_eq!(loaded.values.get(1, 1), Some(&1.5));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn oversized_dimensions_rejected() {
        assert_eq!(dimensions_u32(640, 480).unwrap(), (640, 480));
        let wide = u32::MAX as usize + 1;
        assert!(matches!(
            dimensions_u32(wide, 1),
            Err(RasterError::Unsupported(_))
        ));
    }

    #[test]
    fn png_preview_written() {
        let path = temp_path("preview.png");
        let grid = ElevationGrid::from_flat(2, 2, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let mask = Grid::from_flat(2, 2, vec![true, false, false, false]).unwrap();
        PngPreviewSink::new(&path)
            .write(&mask, &grid, 0.5, None)
            .unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        std::fs::remove_file(&path).ok();
    }
}
