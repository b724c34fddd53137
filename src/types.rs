use clap::ValueEnum;
use log::warn;

use crate::error::{Error, Result};

// Printer profile: 12x30 mm sticker, 8 dots per mm
pub const PRINTER_WIDTH: u32 = 240;
pub const PRINTER_HEIGHT: u32 = 96;

pub const DEFAULT_THRESHOLD: u8 = 128;
pub const DEFAULT_MATRIX_SIZE: u32 = 4;

/// How a source picture is brought to the printer's target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScaleType {
    /// Keep the aspect ratio; the result may be smaller than the target.
    Scale,
    /// Keep the aspect ratio and centre the picture on a white target-sized canvas.
    #[default]
    Fit,
    /// Keep the aspect ratio and cut away whatever overhangs the target.
    Crop,
    /// Scale each axis independently.
    Stretch,
}

impl ScaleType {
    /// Strict name lookup (`scale`, `fit`, `crop`, `stretch`).
    pub fn from_name(name: &str) -> Result<Self> {
        <Self as ValueEnum>::from_str(name, true).map_err(|_| Error::UnsupportedParameter {
            name: "scale type",
            value: name.to_string(),
        })
    }
}

/// Binarization strategy.
///
/// The first nine variants carry the numeric indices the parameter source
/// uses (0 through 8, in declaration order). `Threshold` is the plain
/// brightness cut and has no index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Algorithm {
    ThresholdMatrix,
    #[default]
    FloydSteinberg,
    Ordered,
    Atkinson,
    Jarvis,
    Stucki,
    Burkes,
    Sierra,
    SierraLite,
    Threshold,
}

const INDEXED: [Algorithm; 9] = [
    Algorithm::ThresholdMatrix,
    Algorithm::FloydSteinberg,
    Algorithm::Ordered,
    Algorithm::Atkinson,
    Algorithm::Jarvis,
    Algorithm::Stucki,
    Algorithm::Burkes,
    Algorithm::Sierra,
    Algorithm::SierraLite,
];

impl Algorithm {
    /// Numeric index of this algorithm, if it has one.
    pub fn index(self) -> Option<u8> {
        INDEXED.iter().position(|a| *a == self).map(|i| i as u8)
    }

    /// Permissive index lookup: unknown indices fall back to the legacy
    /// threshold matrix.
    pub fn from_index(index: u8) -> Self {
        Self::try_from(index).unwrap_or_else(|_| {
            warn!("Unknown algorithm index {}, using threshold matrix", index);
            Algorithm::ThresholdMatrix
        })
    }

    /// Strict name lookup, e.g. `floyd-steinberg` or `sierra-lite`.
    pub fn from_name(name: &str) -> Result<Self> {
        <Self as ValueEnum>::from_str(name, true).map_err(|_| Error::UnsupportedParameter {
            name: "algorithm",
            value: name.to_string(),
        })
    }
}

impl TryFrom<u8> for Algorithm {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        INDEXED
            .get(index as usize)
            .copied()
            .ok_or(Error::UnsupportedParameter {
                name: "algorithm index",
                value: index.to_string(),
            })
    }
}

/// Side length of a generated Bayer matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayerSize {
    Two,
    Four,
    Eight,
}

impl BayerSize {
    pub fn side(self) -> usize {
        match self {
            BayerSize::Two => 2,
            BayerSize::Four => 4,
            BayerSize::Eight => 8,
        }
    }
}

impl TryFrom<u32> for BayerSize {
    type Error = Error;

    fn try_from(size: u32) -> Result<Self> {
        match size {
            2 => Ok(BayerSize::Two),
            4 => Ok(BayerSize::Four),
            8 => Ok(BayerSize::Eight),
            _ => Err(Error::UnsupportedParameter {
                name: "matrix size",
                value: size.to_string(),
            }),
        }
    }
}

/// User-chosen quantization and tone parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DitherParameters {
    /// 0-255. Error diffusion and Bayer compare against it; the flat
    /// threshold ignores it.
    pub threshold: u8,
    pub invert: bool,
    /// Bayer matrix side (2, 4 or 8); also the legacy matrix side.
    pub matrix_size: u32,
    /// 0.0-2.0. The tone stage is skipped only when both `brightness` and
    /// `contrast` are exactly 1.0. Any other pair runs the full remap, which
    /// is far from neutral near 1.0: (1.0, 0.99) comes out almost white.
    /// The remap's own neutral pair is (128/255, 0.5).
    pub brightness: f32,
    /// 0.0-2.0, see `brightness`.
    pub contrast: f32,
    /// 0.0-1.0 blend of Sobel edges over the picture.
    pub edge_intensity: f32,
}

impl Default for DitherParameters {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            invert: false,
            matrix_size: DEFAULT_MATRIX_SIZE,
            brightness: 1.0,
            contrast: 1.0,
            edge_intensity: 0.0,
        }
    }
}

impl DitherParameters {
    /// Bayer size for ordered dithering; unsupported sizes fall back to 4.
    pub fn bayer_size(&self) -> BayerSize {
        BayerSize::try_from(self.matrix_size).unwrap_or_else(|_| {
            warn!(
                "Unsupported matrix size {}, using {}",
                self.matrix_size, DEFAULT_MATRIX_SIZE
            );
            BayerSize::Four
        })
    }

    /// `(brightness, contrast)` when the tone stage should run.
    pub fn tone(&self) -> Option<(f32, f32)> {
        if self.brightness == 1.0 && self.contrast == 1.0 {
            None
        } else {
            Some((self.brightness, self.contrast))
        }
    }

    /// Edge intensity when edge enhancement should run.
    pub fn edges(&self) -> Option<f32> {
        (self.edge_intensity > 0.0).then_some(self.edge_intensity.min(1.0))
    }
}

/// Everything the pipeline needs besides the picture itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintSettings {
    pub scale: ScaleType,
    /// Turn the picture a quarter when its orientation disagrees with the label.
    pub auto_rotate: bool,
    /// Extra clockwise rotation in degrees, applied before auto-rotation.
    pub rotation: f32,
    pub algorithm: Algorithm,
    pub dither: DitherParameters,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            scale: ScaleType::default(),
            auto_rotate: true,
            rotation: 0.0,
            algorithm: Algorithm::default(),
            dither: DitherParameters::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_indices_follow_declaration_order() {
        assert_eq!(Algorithm::try_from(0).unwrap(), Algorithm::ThresholdMatrix);
        assert_eq!(Algorithm::try_from(1).unwrap(), Algorithm::FloydSteinberg);
        assert_eq!(Algorithm::try_from(2).unwrap(), Algorithm::Ordered);
        assert_eq!(Algorithm::try_from(8).unwrap(), Algorithm::SierraLite);
        for i in 0..9u8 {
            assert_eq!(Algorithm::try_from(i).unwrap().index(), Some(i));
        }
        assert_eq!(Algorithm::Threshold.index(), None);
    }

    #[test]
    fn test_unknown_index_is_rejected_or_falls_back() {
        assert!(matches!(
            Algorithm::try_from(9),
            Err(Error::UnsupportedParameter { .. })
        ));
        assert_eq!(Algorithm::from_index(42), Algorithm::ThresholdMatrix);
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(
            Algorithm::from_name("sierra-lite").unwrap(),
            Algorithm::SierraLite
        );
        assert_eq!(
            Algorithm::from_name("Floyd-Steinberg").unwrap(),
            Algorithm::FloydSteinberg
        );
        assert!(Algorithm::from_name("halftone").is_err());
        assert_eq!(ScaleType::from_name("crop").unwrap(), ScaleType::Crop);
        assert!(ScaleType::from_name("zoom").is_err());
    }

    #[test]
    fn test_bayer_size_fallback() {
        let mut params = DitherParameters::default();
        assert_eq!(params.bayer_size(), BayerSize::Four);
        params.matrix_size = 8;
        assert_eq!(params.bayer_size(), BayerSize::Eight);
        params.matrix_size = 3;
        assert_eq!(params.bayer_size(), BayerSize::Four);
        assert!(BayerSize::try_from(16).is_err());
    }

    #[test]
    fn test_neutral_tone_is_skipped() {
        let mut params = DitherParameters::default();
        assert_eq!(params.tone(), None);
        assert_eq!(params.edges(), None);
        params.contrast = 0.5;
        assert_eq!(params.tone(), Some((1.0, 0.5)));
        params.edge_intensity = 1.5;
        assert_eq!(params.edges(), Some(1.0));
    }
}
