//! Decoder for the binary geometry encoding used by the building store.
//!
//! Payloads arrive either as raw WKB bytes or as the hexadecimal text form
//! some drivers hand back; both are accepted. Standard WKB and PostGIS EWKB
//! are understood: each geometry carries its own byte-order marker, the type
//! word may carry Z/M/SRID flags (or the ISO `+1000` dimension offsets), and
//! extra ordinates or an embedded SRID are read and dropped.

use geo::{Centroid, Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TYPE_POLYGON: u32 = 3;
const TYPE_MULTI_POLYGON: u32 = 6;
const TYPE_GEOMETRY_COLLECTION: u32 = 7;

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

/// Building footprint as decoded from a geometry payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Footprint {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    /// Recognized geometry type with no areal footprint (point, line, ...).
    /// Buildings carrying one are skipped downstream; the batch continues.
    Unsupported { type_code: u32 },
}

impl Footprint {
    /// Exterior ring of every polygon, empty for unsupported types.
    /// Interior rings (holes) are parsed but never rasterized.
    pub fn exterior_rings(&self) -> Vec<&LineString<f64>> {
        match self {
            Footprint::Polygon(p) => vec![p.exterior()],
            Footprint::MultiPolygon(mp) => mp.0.iter().map(|p| p.exterior()).collect(),
            Footprint::Unsupported { .. } => Vec::new(),
        }
    }

    /// Centroid in the footprint's own coordinate frame, `None` for
    /// unsupported or degenerate geometry.
    pub fn centroid(&self) -> Option<geo::Point<f64>> {
        match self {
            Footprint::Polygon(p) => p.centroid(),
            Footprint::MultiPolygon(mp) => mp.centroid(),
            Footprint::Unsupported { .. } => None,
        }
    }

    pub fn is_areal(&self) -> bool {
        !matches!(self, Footprint::Unsupported { .. })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("geometry payload truncated: wanted {wanted} more bytes at offset {offset}")]
    Truncated { offset: usize, wanted: usize },
    #[error("invalid byte-order marker {0:#04x}")]
    ByteOrder(u8),
    #[error("unrecognized geometry type code {0}")]
    UnknownType(u32),
    #[error("invalid hex digit {byte:#04x} at position {pos}")]
    InvalidHex { pos: usize, byte: u8 },
    #[error("odd-length hex payload ({0} digits)")]
    OddHexLength(usize),
}

/// Decode a geometry payload into a footprint.
///
/// Raw WKB always opens with a byte-order marker (`0x00` or `0x01`);
/// anything else is treated as hexadecimal text and normalized to bytes
/// first.
pub fn decode(payload: &[u8]) -> Result<Footprint, DecodeError> {
    match payload.first() {
        Some(&0x00) | Some(&0x01) => decode_wkb(payload),
        _ => decode_wkb(&hex_to_bytes(payload)?),
    }
}

fn decode_wkb(bytes: &[u8]) -> Result<Footprint, DecodeError> {
    let mut cur = Cursor::new(bytes);
    let header = read_header(&mut cur)?;
    match header.base {
        TYPE_POLYGON => Ok(Footprint::Polygon(read_polygon_body(&mut cur, &header)?)),
        TYPE_MULTI_POLYGON => {
            let count = cur.u32(header.le)? as usize;
            // header + ring count is at least 9 bytes per member
            cur.ensure(count.saturating_mul(9))?;
            let mut polygons = Vec::with_capacity(count);
            for _ in 0..count {
                // each member polygon repeats the full WKB header
                let member = read_header(&mut cur)?;
                if member.base != TYPE_POLYGON {
                    return Err(DecodeError::UnknownType(member.base));
                }
                polygons.push(read_polygon_body(&mut cur, &member)?);
            }
            Ok(Footprint::MultiPolygon(MultiPolygon(polygons)))
        }
        other => Ok(Footprint::Unsupported { type_code: other }),
    }
}

struct Header {
    base: u32,
    dims: usize,
    le: bool,
}

fn read_header(cur: &mut Cursor) -> Result<Header, DecodeError> {
    let le = match cur.byte()? {
        0x00 => false,
        0x01 => true,
        other => return Err(DecodeError::ByteOrder(other)),
    };
    let raw = cur.u32(le)?;

    let mut dims = 2;
    if raw & EWKB_Z != 0 {
        dims += 1;
    }
    if raw & EWKB_M != 0 {
        dims += 1;
    }
    if raw & EWKB_SRID != 0 {
        cur.u32(le)?; // embedded SRID, unused here
    }

    let mut base = raw & 0x1FFF_FFFF;
    if base >= 1000 {
        // ISO WKB: Z = +1000, M = +2000, ZM = +3000
        let offset = base / 1000;
        if offset == 1 || offset == 3 {
            dims += 1;
        }
        if offset == 2 || offset == 3 {
            dims += 1;
        }
        base %= 1000;
    }

    if base == 0 || base > TYPE_GEOMETRY_COLLECTION {
        return Err(DecodeError::UnknownType(base));
    }
    Ok(Header { base, dims, le })
}

fn read_polygon_body(cur: &mut Cursor, header: &Header) -> Result<Polygon<f64>, DecodeError> {
    let ring_count = cur.u32(header.le)? as usize;
    cur.ensure(ring_count.saturating_mul(4))?;
    let mut rings = Vec::with_capacity(ring_count);
    for _ in 0..ring_count {
        rings.push(read_ring(cur, header)?);
    }
    let mut rings = rings.into_iter();
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Ok(Polygon::new(exterior, rings.collect()))
}

fn read_ring(cur: &mut Cursor, header: &Header) -> Result<LineString<f64>, DecodeError> {
    let point_count = cur.u32(header.le)? as usize;
    // reject impossible counts before allocating
    cur.ensure(point_count.saturating_mul(header.dims * 8))?;
    let mut coords = Vec::with_capacity(point_count);
    for _ in 0..point_count {
        let x = cur.f64(header.le)?;
        let y = cur.f64(header.le)?;
        for _ in 2..header.dims {
            cur.f64(header.le)?; // Z/M ordinates dropped
        }
        coords.push(Coord { x, y });
    }
    Ok(LineString::from(coords))
}

fn hex_to_bytes(text: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let start = text.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let end = text.len() - text.iter().rev().take_while(|b| b.is_ascii_whitespace()).count();
    let trimmed = &text[start.min(end)..end];

    if trimmed.len() % 2 != 0 {
        return Err(DecodeError::OddHexLength(trimmed.len()));
    }
    let mut bytes = Vec::with_capacity(trimmed.len() / 2);
    for (i, pair) in trimmed.chunks_exact(2).enumerate() {
        let hi = hex_digit(pair[0]).ok_or(DecodeError::InvalidHex {
            pos: i * 2,
            byte: pair[0],
        })?;
        let lo = hex_digit(pair[1]).ok_or(DecodeError::InvalidHex {
            pos: i * 2 + 1,
            byte: pair[1],
        })?;
        bytes.push(hi << 4 | lo);
    }
    Ok(bytes)
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn ensure(&self, wanted: usize) -> Result<(), DecodeError> {
        if self.remaining() < wanted {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                wanted: wanted - self.remaining(),
            });
        }
        Ok(())
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(count)?;
        let slice = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self, le: bool) -> Result<u32, DecodeError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(if le {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    }

    fn f64(&mut self, le: bool) -> Result<f64, DecodeError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(if le {
            f64::from_le_bytes(raw)
        } else {
            f64::from_be_bytes(raw)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u32(out: &mut Vec<u8>, value: u32, le: bool) {
        if le {
            out.extend_from_slice(&value.to_le_bytes());
        } else {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn push_f64(out: &mut Vec<u8>, value: f64, le: bool) {
        if le {
            out.extend_from_slice(&value.to_le_bytes());
        } else {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn wkb_polygon(rings: &[&[(f64, f64)]], le: bool) -> Vec<u8> {
        let mut out = vec![if le { 0x01 } else { 0x00 }];
        push_u32(&mut out, TYPE_POLYGON, le);
        push_u32(&mut out, rings.len() as u32, le);
        for ring in rings {
            push_u32(&mut out, ring.len() as u32, le);
            for &(x, y) in *ring {
                push_f64(&mut out, x, le);
                push_f64(&mut out, y, le);
            }
        }
        out
    }

    fn square_ring() -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]
    }

    #[test]
    fn test_decode_polygon() {
        let ring = square_ring();
        let payload = wkb_polygon(&[&ring], true);
        match decode(&payload).unwrap() {
            Footprint::Polygon(p) => {
                assert_eq!(p.exterior().coords().count(), 5);
                assert!(p.interiors().is_empty());
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_big_endian() {
        let ring = square_ring();
        let payload = wkb_polygon(&[&ring], false);
        assert!(matches!(decode(&payload).unwrap(), Footprint::Polygon(_)));
    }

    #[test]
    fn test_decode_hex_text() {
        let ring = square_ring();
        let raw = wkb_polygon(&[&ring], true);
        let hex: String = raw.iter().map(|b| format!("{:02X}", b)).collect();
        let from_hex = decode(hex.as_bytes()).unwrap();
        assert_eq!(from_hex, decode(&raw).unwrap());
    }

    #[test]
    fn test_decode_hex_with_trailing_newline() {
        let ring = square_ring();
        let raw = wkb_polygon(&[&ring], true);
        let hex: String = raw.iter().map(|b| format!("{:02x}", b)).collect();
        let padded = format!("{}\n", hex);
        assert!(matches!(
            decode(padded.as_bytes()).unwrap(),
            Footprint::Polygon(_)
        ));
    }

    #[test]
    fn test_interior_rings_parsed() {
        let outer = square_ring();
        let hole = vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0), (2.0, 2.0)];
        let payload = wkb_polygon(&[&outer, &hole], true);
        match decode(&payload).unwrap() {
            Footprint::Polygon(p) => assert_eq!(p.interiors().len(), 1),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_multipolygon() {
        let a = square_ring();
        let b: Vec<(f64, f64)> = a.iter().map(|&(x, y)| (x + 50.0, y)).collect();
        let mut payload = vec![0x01];
        push_u32(&mut payload, TYPE_MULTI_POLYGON, true);
        push_u32(&mut payload, 2, true);
        payload.extend_from_slice(&wkb_polygon(&[&a], true));
        payload.extend_from_slice(&wkb_polygon(&[&b], true));
        match decode(&payload).unwrap() {
            Footprint::MultiPolygon(mp) => assert_eq!(mp.0.len(), 2),
            other => panic!("expected multipolygon, got {:?}", other),
        }
    }

    #[test]
    fn test_ewkb_srid_and_z_dropped() {
        let mut payload = vec![0x01];
        push_u32(&mut payload, TYPE_POLYGON | EWKB_SRID | EWKB_Z, true);
        push_u32(&mut payload, 4326, true); // SRID
        push_u32(&mut payload, 1, true); // one ring
        let ring = square_ring();
        push_u32(&mut payload, ring.len() as u32, true);
        for (x, y) in ring {
            push_f64(&mut payload, x, true);
            push_f64(&mut payload, y, true);
            push_f64(&mut payload, 99.0, true); // Z ordinate
        }
        match decode(&payload).unwrap() {
            Footprint::Polygon(p) => {
                let first = p.exterior().coords().next().unwrap();
                assert_eq!((first.x, first.y), (0.0, 0.0));
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_point_is_unsupported() {
        let mut payload = vec![0x01];
        push_u32(&mut payload, 1, true); // Point
        push_f64(&mut payload, 1.0, true);
        push_f64(&mut payload, 2.0, true);
        assert_eq!(
            decode(&payload).unwrap(),
            Footprint::Unsupported { type_code: 1 }
        );
    }

    #[test]
    fn test_truncated_payload() {
        let ring = square_ring();
        let payload = wkb_polygon(&[&ring], true);
        let err = decode(&payload[..payload.len() - 4]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[test]
    fn test_unknown_type_code() {
        let mut payload = vec![0x01];
        push_u32(&mut payload, 99, true);
        assert_eq!(decode(&payload).unwrap_err(), DecodeError::UnknownType(99));
    }

    #[test]
    fn test_bad_byte_order_marker() {
        // "07" decodes to a single 0x07 byte, which is not a valid marker
        assert_eq!(decode(b"07").unwrap_err(), DecodeError::ByteOrder(0x07));
    }

    #[test]
    fn test_invalid_hex() {
        assert!(matches!(
            decode(b"zz").unwrap_err(),
            DecodeError::InvalidHex { pos: 0, .. }
        ));
        assert_eq!(decode(b"012").unwrap_err(), DecodeError::OddHexLength(3));
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(
            decode(b"").unwrap_err(),
            DecodeError::Truncated { offset: 0, .. }
        ));
    }

    #[test]
    fn test_centroid_of_square() {
        let ring = square_ring();
        let footprint = decode(&wkb_polygon(&[&ring], true)).unwrap();
        let centroid = footprint.centroid().unwrap();
        assert_eq!((centroid.x(), centroid.y()), (5.0, 5.0));
    }
}
