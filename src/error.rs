/// Errors produced by the conversion pipeline and the transport sinks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Raster has zero area ({width}x{height})")]
    EmptyRaster { width: u32, height: u32 },

    #[error("{pixels} pixels cannot be packed into whole bytes")]
    Unaligned { pixels: u64 },

    #[error("Printer expects a 240x96 raster, got {width}x{height}")]
    ProfileMismatch { width: u32, height: u32 },

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Unsupported {name}: {value}")]
    UnsupportedParameter { name: &'static str, value: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] std::io::Error),

    #[cfg(feature = "ble")]
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
}

/// Result type alias for btsticker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reject zero-area rasters and targets before any work is done.
pub(crate) fn ensure_area(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyRaster { width, height });
    }
    Ok(())
}
