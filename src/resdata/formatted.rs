//! Text encoding for formatted keyword streams.
//!
//! Formatted files carry the same logical values as binary ones through a
//! whitespace/line-delimited encoding: quoted 8-character strings, `T`/`F`
//! booleans, and floating point numbers written as a fraction in (0, 1)
//! with an explicit power of ten (`0.31400000E+01`, doubles use a `D`
//! exponent marker instead of `E`).

use std::io::Read;

use super::error::{ResdataError, Result};

fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read the next whitespace-delimited token, or `None` at end of stream.
///
/// A token starting with a single quote runs to the closing quote and may
/// contain spaces; the quotes themselves are stripped.
pub(crate) fn next_token<R: Read>(reader: &mut R) -> Result<Option<String>> {
    let mut byte = loop {
        match read_byte(reader)? {
            None => return Ok(None),
            Some(b) if b.is_ascii_whitespace() => continue,
            Some(b) => break b,
        }
    };

    let mut token = Vec::new();
    if byte == b'\'' {
        loop {
            match read_byte(reader)? {
                None => {
                    return Err(ResdataError::InvalidFormat(
                        "unterminated quoted token".to_string(),
                    ))
                }
                Some(b'\'') => break,
                Some(b) => token.push(b),
            }
        }
    } else {
        loop {
            token.push(byte);
            match read_byte(reader)? {
                None => break,
                Some(b) if b.is_ascii_whitespace() => break,
                Some(b) => byte = b,
            }
        }
    }

    String::from_utf8(token)
        .map(Some)
        .map_err(|_| ResdataError::InvalidFormat("non-UTF8 bytes in formatted token".to_string()))
}

pub(crate) fn require_token<R: Read>(reader: &mut R, what: &str) -> Result<String> {
    next_token(reader)?.ok_or_else(|| {
        ResdataError::InvalidFormat(format!("stream ended while reading {}", what))
    })
}

pub(crate) fn parse_int(token: &str) -> Result<i32> {
    token
        .parse::<i32>()
        .map_err(|_| ResdataError::InvalidFormat(format!("bad integer token: {:?}", token)))
}

pub(crate) fn parse_float(token: &str) -> Result<f32> {
    token
        .parse::<f32>()
        .map_err(|_| ResdataError::InvalidFormat(format!("bad float token: {:?}", token)))
}

pub(crate) fn parse_double(token: &str) -> Result<f64> {
    // Doubles use a Fortran 'D' exponent marker.
    let normalized = token.replace(['D', 'd'], "E");
    normalized
        .parse::<f64>()
        .map_err(|_| ResdataError::InvalidFormat(format!("bad double token: {:?}", token)))
}

pub(crate) fn parse_bool(token: &str) -> Result<bool> {
    match token {
        "T" => Ok(true),
        "F" => Ok(false),
        _ => Err(ResdataError::InvalidFormat(format!(
            "bad logical token: {:?}",
            token
        ))),
    }
}

/// Split a value into a fraction with magnitude in (0.1, 1] scaled down into
/// (0, 1) and a power of ten, the way formatted files expect numbers.
fn split_scientific(value: f64) -> (f64, i32) {
    if value == 0.0 {
        return (0.0, 0);
    }
    let mut power = value.abs().log10().ceil();
    let mut fraction = value / 10f64.powf(power);
    if fraction.abs() == 1.0 {
        fraction *= 0.1;
        power += 1.0;
    }
    (fraction, power as i32)
}

pub(crate) fn fmt_float(value: f32) -> String {
    let (fraction, power) = split_scientific(value as f64);
    format!("  {:11.8}E{:+03}", fraction, power)
}

pub(crate) fn fmt_double(value: f64) -> String {
    let (fraction, power) = split_scientific(value);
    format!("  {:17.14}D{:+03}", fraction, power)
}

pub(crate) fn fmt_int(value: i32) -> String {
    format!(" {:11}", value)
}

pub(crate) fn fmt_bool(value: bool) -> String {
    format!("  {}", if value { 'T' } else { 'F' })
}

pub(crate) fn fmt_str(value: &str) -> String {
    format!(" '{:<8}'", value)
}

pub(crate) fn fmt_header(name: &str, count: u32, tag: &str) -> String {
    format!(" '{:<8}' {:11} '{:<4}'\n", name, count, tag)
}
