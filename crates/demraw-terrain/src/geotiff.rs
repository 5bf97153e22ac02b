//! GeoTIFF elevation reader and writer.
//!
//! Reads the first image of a TIFF with the `tiff` crate and recovers the
//! affine transform, EPSG code, and GDAL no-data sentinel from the GeoTIFF
//! tags. Only band 1 is used for multi-band files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

use demraw_core::types::AffineTransform;

use crate::error::RasterError;
use crate::projection::SpatialRef;
use crate::raster::Raster;

// GeoTIFF / GDAL tag IDs
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_MODEL_TRANSFORMATION: u16 = 34264;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GDAL_NODATA: u16 = 42113;

// GeoKey IDs
const KEY_MODEL_TYPE: u16 = 1024;
const KEY_RASTER_TYPE: u16 = 1025;
const KEY_GEOGRAPHIC_TYPE: u16 = 2048;
const KEY_PROJECTED_CS_TYPE: u16 = 3072;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

/// PlanarConfiguration value for band-sequential storage.
const PLANAR_SEPARATE: u16 = 2;

/// Open a GeoTIFF file as a [`Raster`].
pub fn open(path: &Path) -> Result<Raster, RasterError> {
    let file = File::open(path).map_err(|source| RasterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    decode(BufReader::new(file))
}

/// Decode a GeoTIFF from any seekable reader.
///
/// Decoder buffer limits are lifted; the raster is always read whole.
pub fn decode<R: Read + Seek>(reader: R) -> Result<Raster, RasterError> {
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let samples_per_pixel = find_u16(&mut decoder, Tag::SamplesPerPixel)?.unwrap_or(1) as usize;
    let planar = find_u16(&mut decoder, Tag::PlanarConfiguration)?.unwrap_or(1);

    let transform = read_transform(&mut decoder)?;
    let geokeys = read_geokeys(&mut decoder)?;
    let nodata = read_nodata(&mut decoder)?;

    let samples = samples_to_f32(decoder.read_image()?);
    let samples = first_band(samples, width * height, samples_per_pixel, planar)?;

    let (transform, spatial_ref) = match (transform, geokeys) {
        (Some(gt), Some(keys)) => (keys.adjust(gt), keys.spatial_ref()),
        (Some(gt), None) => (gt, SpatialRef::Unknown),
        (None, keys) => {
            log::warn!("GeoTIFF has no model transform; using pixel coordinates");
            (
                AffineTransform::default(),
                keys.map(|k| k.spatial_ref()).unwrap_or_default(),
            )
        }
    };

    log::debug!(
        "decoded {width}x{height} raster, {samples_per_pixel} sample(s)/pixel, crs {spatial_ref}, nodata {nodata:?}"
    );
    Raster::new(width, height, samples, transform, spatial_ref, nodata)
}

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn find_u16<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Result<Option<u16>, RasterError> {
    match decoder.find_tag(tag)? {
        Some(value) => Ok(Some(value.into_u16()?)),
        None => Ok(None),
    }
}

fn find_f64_vec<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    code: u16,
) -> Result<Option<Vec<f64>>, RasterError> {
    match decoder.find_tag(tag(code))? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

/// Build the affine transform from ModelTransformation, or PixelScale + Tiepoint.
fn read_transform<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> Result<Option<AffineTransform>, RasterError> {
    if let Some(m) = find_f64_vec(decoder, TAG_MODEL_TRANSFORMATION)? {
        if m.len() < 16 {
            return Err(RasterError::Georeferencing(format!(
                "ModelTransformation has {} values, expected 16",
                m.len()
            )));
        }
        return Ok(Some(AffineTransform::from_coefficients([
            m[3], m[0], m[1], m[7], m[4], m[5],
        ])));
    }

    let scale = find_f64_vec(decoder, TAG_MODEL_PIXEL_SCALE)?;
    let tiepoint = find_f64_vec(decoder, TAG_MODEL_TIEPOINT)?;
    match (scale, tiepoint) {
        (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => {
            let (sx, sy) = (s[0], s[1]);
            let (i, j, x, y) = (t[0], t[1], t[3], t[4]);
            Ok(Some(AffineTransform::from_coefficients([
                x - i * sx,
                sx,
                0.0,
                y + j * sy,
                0.0,
                -sy,
            ])))
        }
        (Some(_), Some(_)) => Err(RasterError::Georeferencing(
            "ModelPixelScale/ModelTiepoint are truncated".into(),
        )),
        _ => Ok(None),
    }
}

/// The subset of GeoKeys the converter cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct GeoKeys {
    model_type: Option<u16>,
    raster_type: Option<u16>,
    geographic_type: Option<u16>,
    projected_type: Option<u16>,
}

impl GeoKeys {
    fn parse(directory: &[u16]) -> Result<Self, RasterError> {
        if directory.len() < 4 {
            return Err(RasterError::Georeferencing("GeoKeyDirectory header truncated".into()));
        }
        let count = directory[3] as usize;
        let entries = directory[4..].chunks_exact(4).take(count);
        let mut keys = GeoKeys::default();
        for entry in entries {
            let (id, location, value) = (entry[0], entry[1], entry[3]);
            // Only inline SHORT values are relevant here.
            if location != 0 {
                continue;
            }
            match id {
                KEY_MODEL_TYPE => keys.model_type = Some(value),
                KEY_RASTER_TYPE => keys.raster_type = Some(value),
                KEY_GEOGRAPHIC_TYPE => keys.geographic_type = Some(value),
                KEY_PROJECTED_CS_TYPE => keys.projected_type = Some(value),
                _ => {}
            }
        }
        Ok(keys)
    }

    fn spatial_ref(&self) -> SpatialRef {
        let defined = |code: Option<u16>| code.filter(|&c| c != 0 && c != USER_DEFINED);
        let projected = defined(self.projected_type);
        let geographic = defined(self.geographic_type);
        match (self.model_type, projected, geographic) {
            (Some(MODEL_TYPE_GEOGRAPHIC), _, Some(g)) => SpatialRef::Epsg(g as u32),
            (_, Some(p), _) => SpatialRef::Epsg(p as u32),
            (_, None, Some(g)) => SpatialRef::Epsg(g as u32),
            _ => SpatialRef::Unknown,
        }
    }

    /// PixelIsPoint tiepoints reference pixel centers; shift to the pixel corner.
    fn adjust(&self, gt: AffineTransform) -> AffineTransform {
        if self.raster_type == Some(RASTER_PIXEL_IS_POINT) {
            gt.offset_by(-0.5, -0.5)
        } else {
            gt
        }
    }
}

fn read_geokeys<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<GeoKeys>, RasterError> {
    match decoder.find_tag(tag(TAG_GEO_KEY_DIRECTORY))? {
        Some(value) => Ok(Some(GeoKeys::parse(&value.into_u16_vec()?)?)),
        None => Ok(None),
    }
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f32>, RasterError> {
    let Some(value) = decoder.find_tag(tag(TAG_GDAL_NODATA))? else {
        return Ok(None);
    };
    let text = value.into_string()?;
    parse_nodata(&text).map(Some)
}

/// Parse a GDAL_NODATA string such as `"-9999"` or `"nan"`.
pub fn parse_nodata(text: &str) -> Result<f32, RasterError> {
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    trimmed
        .parse::<f64>()
        .map(|v| v as f32)
        .map_err(|_| RasterError::Georeferencing(format!("Invalid GDAL_NODATA value '{trimmed}'")))
}

fn samples_to_f32(data: DecodingResult) -> Vec<f32> {
    match data {
        DecodingResult::U8(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U16(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I16(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
    }
}

/// Extract band 1 from chunky or planar sample storage.
fn first_band(
    samples: Vec<f32>,
    pixel_count: usize,
    samples_per_pixel: usize,
    planar: u16,
) -> Result<Vec<f32>, RasterError> {
    if samples_per_pixel <= 1 || samples.len() == pixel_count {
        return Ok(samples);
    }
    if planar == PLANAR_SEPARATE {
        let mut samples = samples;
        samples.truncate(pixel_count);
        return Ok(samples);
    }
    if samples.len() < pixel_count * samples_per_pixel {
        return Err(RasterError::SampleCount {
            width: pixel_count,
            height: samples_per_pixel,
            actual: samples.len(),
        });
    }
    Ok(samples.into_iter().step_by(samples_per_pixel).take(pixel_count).collect())
}

/// Write a raster as a single-band f32 GeoTIFF.
pub fn write(raster: &Raster, path: &Path) -> Result<(), RasterError> {
    let file = File::create(path).map_err(|source| RasterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    encode(raster, BufWriter::new(file))
}

/// Encode a raster as a single-band f32 GeoTIFF into any seekable writer.
pub fn encode<W: Write + Seek>(raster: &Raster, writer: W) -> Result<(), RasterError> {
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image =
        encoder.new_image::<Gray32Float>(raster.width() as u32, raster.height() as u32)?;

    let dir = image.encoder();
    let gt = raster.transform;
    if gt.row_rotation == 0.0 && gt.col_rotation == 0.0 {
        let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        dir.write_tag(Tag::Unknown(TAG_MODEL_PIXEL_SCALE), scale.as_slice())?;
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        dir.write_tag(Tag::Unknown(TAG_MODEL_TIEPOINT), tiepoint.as_slice())?;
    } else {
        #[rustfmt::skip]
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(Tag::Unknown(TAG_MODEL_TRANSFORMATION), matrix.as_slice())?;
    }

    let geokeys = geokey_directory(&raster.spatial_ref);
    dir.write_tag(Tag::Unknown(TAG_GEO_KEY_DIRECTORY), geokeys.as_slice())?;

    if let Some(nodata) = raster.nodata {
        let text = format!("{nodata}");
        dir.write_tag(Tag::Unknown(TAG_GDAL_NODATA), text.as_str())?;
    }

    image.write_data(raster.samples())?;
    Ok(())
}

fn geokey_directory(srs: &SpatialRef) -> Vec<u16> {
    let code = srs
        .epsg_code()
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(USER_DEFINED);
    let geographic = srs.is_geographic();

    let mut keys = vec![1, 1, 0, 3];
    let model = if geographic {
        MODEL_TYPE_GEOGRAPHIC
    } else {
        MODEL_TYPE_PROJECTED
    };
    keys.extend_from_slice(&[KEY_MODEL_TYPE, 0, 1, model]);
    keys.extend_from_slice(&[KEY_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
    let crs_key = if geographic {
        KEY_GEOGRAPHIC_TYPE
    } else {
        KEY_PROJECTED_CS_TYPE
    };
    keys.extend_from_slice(&[crs_key, 0, 1, code]);
    keys
}
