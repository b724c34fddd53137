//! Wire format of the sticker printer.
//!
//! A frame is `HEADER ++ payload ++ TRAILER`. The payload is the raster
//! mirrored left-to-right and packed one bit per pixel, MSB first, walking
//! columns (outer loop over x, inner loop over y). White is bit 1.

use log::debug;

use crate::error::{Error, Result};
use crate::raster::MonoRaster;
use crate::types::{PRINTER_HEIGHT, PRINTER_WIDTH};

/// Packed image bytes for the 240x96 label.
pub const PAYLOAD_LEN: usize = (PRINTER_WIDTH * PRINTER_HEIGHT / 8) as usize;

/// Size field carried in the header: payload plus four bytes of overhead.
pub const SIZE_FIELD: u16 = PAYLOAD_LEN as u16 + 4;

pub const HEADER: [u8; 10] = [
    0xdd,
    0x00,
    0x01,
    0x02,
    SIZE_FIELD.to_be_bytes()[0],
    SIZE_FIELD.to_be_bytes()[1],
    0x00,
    0x0c,
    0x01,
    0x00,
];

pub const TRAILER: [u8; 2] = [0x00, 0xdd];

pub const FRAME_LEN: usize = HEADER.len() + PAYLOAD_LEN + TRAILER.len();

/// Encode a 240x96 raster as a complete print frame.
pub fn encode(raster: &MonoRaster) -> Result<Vec<u8>> {
    let (width, height) = raster.dimensions();
    if (width, height) != (PRINTER_WIDTH, PRINTER_HEIGHT) {
        return Err(Error::ProfileMismatch { width, height });
    }

    let payload = pack_columns(&raster.mirrored())?;

    let mut frame = Vec::with_capacity(FRAME_LEN);
    frame.extend_from_slice(&HEADER);
    frame.extend_from_slice(&payload);
    frame.extend_from_slice(&TRAILER);

    debug!("Encoded frame: {} bytes, {} ink dots", frame.len(), raster.ink_count());
    Ok(frame)
}

/// Decode a frame back to the raster that produced it.
pub fn decode(frame: &[u8]) -> Result<MonoRaster> {
    if frame.len() != FRAME_LEN {
        return Err(Error::MalformedFrame(format!(
            "expected {} bytes, got {}",
            FRAME_LEN,
            frame.len()
        )));
    }
    let (header, rest) = frame.split_at(HEADER.len());
    if header != HEADER {
        return Err(Error::MalformedFrame(format!("bad header {:02x?}", header)));
    }
    let (payload, trailer) = rest.split_at(PAYLOAD_LEN);
    if trailer != TRAILER {
        return Err(Error::MalformedFrame(format!("bad trailer {:02x?}", trailer)));
    }

    Ok(unpack_columns(payload, PRINTER_WIDTH, PRINTER_HEIGHT)?.mirrored())
}

/// Pack a raster column by column, MSB first, white = 1.
pub fn pack_columns(raster: &MonoRaster) -> Result<Vec<u8>> {
    let (width, height) = raster.dimensions();
    let pixels = width as u64 * height as u64;
    if pixels % 8 != 0 {
        return Err(Error::Unaligned { pixels });
    }

    let mut out = Vec::with_capacity((pixels / 8) as usize);
    let mut byte = 0u8;
    let mut bit = 0;
    for x in 0..width {
        for y in 0..height {
            if raster.is_white(x, y) {
                byte |= 1 << (7 - bit);
            }
            bit += 1;
            if bit == 8 {
                out.push(byte);
                byte = 0;
                bit = 0;
            }
        }
    }
    Ok(out)
}

/// Inverse of [`pack_columns`].
pub fn unpack_columns(payload: &[u8], width: u32, height: u32) -> Result<MonoRaster> {
    let pixels = width as u64 * height as u64;
    if pixels % 8 != 0 {
        return Err(Error::Unaligned { pixels });
    }
    if payload.len() as u64 != pixels / 8 {
        return Err(Error::MalformedFrame(format!(
            "{} payload bytes for {}x{}",
            payload.len(),
            width,
            height
        )));
    }

    let h = height as usize;
    MonoRaster::from_fn(width, height, |x, y| {
        let index = x as usize * h + y as usize;
        payload[index / 8] & (0x80 >> (index % 8)) != 0
    })
}
