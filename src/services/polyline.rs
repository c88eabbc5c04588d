//! Google encoded polyline format, precision 1e5.

use crate::error::{AppError, Result};
use crate::models::Coordinates;

const PRECISION: f64 = 1e5;

/// Encode coordinates (latitude first for every point).
pub fn encode(coordinates: &[Coordinates]) -> String {
    let mut output = String::with_capacity(coordinates.len() * 8);
    let mut prev_lat = 0i64;
    let mut prev_lng = 0i64;

    for point in coordinates {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut output);
        encode_value(lng - prev_lng, &mut output);
        prev_lat = lat;
        prev_lng = lng;
    }

    output
}

fn encode_value(delta: i64, output: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 } as u64;
    while value >= 0x20 {
        output.push((((value & 0x1f) | 0x20) as u8 + 63) as char);
        value >>= 5;
    }
    output.push((value as u8 + 63) as char);
}

pub fn decode(encoded: &str) -> Result<Vec<Coordinates>> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat = 0i64;
    let mut lng = 0i64;
    let mut coordinates = Vec::new();

    while index < bytes.len() {
        lat += decode_value(bytes, &mut index)?;
        lng += decode_value(bytes, &mut index)?;
        let point = Coordinates::new(lat as f64 / PRECISION, lng as f64 / PRECISION)
            .map_err(|e| AppError::Internal(format!("Invalid polyline point: {}", e)))?;
        coordinates.push(point);
    }

    Ok(coordinates)
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64> {
    let mut result = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = *bytes
            .get(*index)
            .ok_or_else(|| AppError::Internal("Truncated polyline".to_string()))?;
        if !(63..127).contains(&byte) || shift > 60 {
            return Err(AppError::Internal(format!(
                "Invalid polyline character at {}",
                index
            )));
        }
        *index += 1;

        let chunk = (byte - 63) as u64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    let value = (result >> 1) as i64;
    Ok(if result & 1 == 1 { !value } else { value })
}
