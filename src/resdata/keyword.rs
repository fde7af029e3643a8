//! The atomic named, typed, counted array block of the format.
//!
//! A keyword on disk is a 16-byte header record (8-character space-padded
//! name, 4-byte element count, 4-character type tag) followed by one logical
//! payload record of `count * element_size` bytes. Boolean elements are
//! stored as 4-byte integers (`-1` true, `0` false); string elements are
//! 8-character space-padded chunks.

use std::io::{Read, Seek, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::debug;

use super::error::{ResdataError, Result};
use super::formatted;
use super::stream::{Endian, RecordStream};

/// Length of a keyword name on disk.
pub const KW_NAME_LEN: usize = 8;
/// Length of an element type tag on disk.
pub const KW_TAG_LEN: usize = 4;
/// Size of a binary keyword header record.
pub const KW_HEADER_BYTES: usize = KW_NAME_LEN + 4 + KW_TAG_LEN;

/// The closed set of element types a keyword can carry.
///
/// Every decode site matches this enum exhaustively; an unrecognized tag on
/// disk is rejected at header parse time, never defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KwType {
    Int,
    Float,
    Double,
    Bool,
    String,
    Message,
}

impl KwType {
    /// The 4-character tag identifying this type on disk.
    pub fn tag(self) -> &'static str {
        match self {
            KwType::Int => "INTE",
            KwType::Float => "REAL",
            KwType::Double => "DOUB",
            KwType::Bool => "LOGI",
            KwType::String => "CHAR",
            KwType::Message => "MESS",
        }
    }

    /// Parse a type tag; unknown tags are a fatal format error.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "INTE" => Ok(KwType::Int),
            "REAL" => Ok(KwType::Float),
            "DOUB" => Ok(KwType::Double),
            "LOGI" => Ok(KwType::Bool),
            "CHAR" => Ok(KwType::String),
            "MESS" => Ok(KwType::Message),
            other => Err(ResdataError::UnknownTypeTag(other.to_string())),
        }
    }

    /// Bytes per element in the binary encoding.
    pub fn element_size(self) -> usize {
        match self {
            KwType::Int | KwType::Float | KwType::Bool => 4,
            KwType::Double | KwType::String => 8,
            KwType::Message => 0,
        }
    }

    /// Values per line in the formatted encoding.
    pub fn columns(self) -> usize {
        match self {
            KwType::Int => 6,
            KwType::Float => 4,
            KwType::Double => 3,
            KwType::Bool => 25,
            KwType::String => 7,
            KwType::Message => 1,
        }
    }
}

/// A keyword in header-only form: name, type and count known, payload not
/// yet read. Supports cheap scanning via [`Keyword::skip_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KwHeader {
    pub name: String,
    pub kw_type: KwType,
    pub count: u32,
}

impl KwHeader {
    pub fn new(name: &str, kw_type: KwType, count: u32) -> Result<Self> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            kw_type,
            count,
        })
    }

    /// Total payload size in bytes once materialized.
    pub fn payload_bytes(&self) -> u64 {
        self.count as u64 * self.kw_type.element_size() as u64
    }

    /// Read the next keyword header, or `None` on a clean end of stream.
    pub fn read<S: Read + Seek>(stream: &mut RecordStream<S>) -> Result<Option<KwHeader>> {
        if stream.is_formatted() {
            return Self::read_formatted(stream);
        }
        let record = match stream.read_record_opt()? {
            Some(record) => record,
            None => return Ok(None),
        };
        if record.len() != KW_HEADER_BYTES {
            return Err(ResdataError::InvalidFormat(format!(
                "keyword header record has {} bytes, expected {}",
                record.len(),
                KW_HEADER_BYTES
            )));
        }
        let name = decode_padded_str(&record[..KW_NAME_LEN])?;
        let count = get_i32(stream.endian(), &record[KW_NAME_LEN..KW_NAME_LEN + 4]);
        let tag = decode_padded_str(&record[KW_NAME_LEN + 4..])?;
        if count < 0 {
            return Err(ResdataError::InvalidFormat(format!(
                "negative element count {} for keyword {}",
                count, name
            )));
        }
        let kw_type = KwType::from_tag(&tag)?;
        debug!("header: {} {} x{}", name, kw_type.tag(), count);
        Ok(Some(KwHeader {
            name,
            kw_type,
            count: count as u32,
        }))
    }

    fn read_formatted<S: Read + Seek>(stream: &mut RecordStream<S>) -> Result<Option<KwHeader>> {
        let reader = stream.get_mut();
        let name = match formatted::next_token(reader)? {
            Some(token) => token.trim_end().to_string(),
            None => return Ok(None),
        };
        let count_token = formatted::require_token(reader, "keyword element count")?;
        let count = formatted::parse_int(&count_token)?;
        if count < 0 {
            return Err(ResdataError::InvalidFormat(format!(
                "negative element count {} for keyword {}",
                count, name
            )));
        }
        let tag = formatted::require_token(reader, "keyword type tag")?;
        let kw_type = KwType::from_tag(tag.trim_end())?;
        validate_name(&name)?;
        Ok(Some(KwHeader {
            name,
            kw_type,
            count: count as u32,
        }))
    }

    fn write<S: Write + Seek>(&self, stream: &mut RecordStream<S>) -> Result<()> {
        if stream.is_formatted() {
            let line = formatted::fmt_header(&self.name, self.count, self.kw_type.tag());
            stream.get_mut().write_all(line.as_bytes())?;
            return Ok(());
        }
        let mut record = Vec::with_capacity(KW_HEADER_BYTES);
        record.extend_from_slice(pad8(&self.name)?.as_bytes());
        put_i32(stream.endian(), &mut record, self.count as i32);
        record.extend_from_slice(self.kw_type.tag().as_bytes());
        stream.write_record(&record)
    }
}

/// Typed keyword payload.
#[derive(Debug, Clone, PartialEq)]
pub enum KwData {
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
    /// Message keywords carry a count but no payload bytes.
    Message(u32),
}

impl KwData {
    pub fn kw_type(&self) -> KwType {
        match self {
            KwData::Int(_) => KwType::Int,
            KwData::Float(_) => KwType::Float,
            KwData::Double(_) => KwType::Double,
            KwData::Bool(_) => KwType::Bool,
            KwData::Str(_) => KwType::String,
            KwData::Message(_) => KwType::Message,
        }
    }

    pub fn len(&self) -> u32 {
        match self {
            KwData::Int(v) => v.len() as u32,
            KwData::Float(v) => v.len() as u32,
            KwData::Double(v) => v.len() as u32,
            KwData::Bool(v) => v.len() as u32,
            KwData::Str(v) => v.len() as u32,
            KwData::Message(count) => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fully materialized keyword.
///
/// The type and count are fixed at construction; replacing the payload of a
/// keyword on disk must match both (see [`Keyword::replace_at`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    header: KwHeader,
    data: KwData,
}

impl Keyword {
    pub fn new(name: &str, data: KwData) -> Result<Self> {
        match &data {
            KwData::Str(strings) => {
                for s in strings {
                    if s.len() > KW_NAME_LEN || !s.is_ascii() {
                        return Err(ResdataError::InvalidFormat(format!(
                            "string element {:?} exceeds 8 ASCII characters",
                            s
                        )));
                    }
                }
            }
            // The formatted encoding has no representation for non-finite
            // values.
            KwData::Float(values) => {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(ResdataError::InvalidFormat(format!(
                        "non-finite element in keyword {}",
                        name
                    )));
                }
            }
            KwData::Double(values) => {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(ResdataError::InvalidFormat(format!(
                        "non-finite element in keyword {}",
                        name
                    )));
                }
            }
            _ => {}
        }
        let header = KwHeader::new(name, data.kw_type(), data.len())?;
        Ok(Self { header, data })
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn kw_type(&self) -> KwType {
        self.header.kw_type
    }

    pub fn count(&self) -> u32 {
        self.header.count
    }

    pub fn header(&self) -> &KwHeader {
        &self.header
    }

    pub fn data(&self) -> &KwData {
        &self.data
    }

    pub fn as_int(&self) -> Option<&[i32]> {
        match &self.data {
            KwData::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&[f32]> {
        match &self.data {
            KwData::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<&[f64]> {
        match &self.data {
            KwData::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&[bool]> {
        match &self.data {
            KwData::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&[String]> {
        match &self.data {
            KwData::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Read the next keyword (header and payload), or `None` at end of
    /// stream.
    pub fn read<S: Read + Seek>(stream: &mut RecordStream<S>) -> Result<Option<Keyword>> {
        match KwHeader::read(stream)? {
            Some(header) => Ok(Some(Self::read_payload(stream, header)?)),
            None => Ok(None),
        }
    }

    /// Materialize the payload for a previously read header.
    pub fn read_payload<S: Read + Seek>(
        stream: &mut RecordStream<S>,
        header: KwHeader,
    ) -> Result<Keyword> {
        let data = if stream.is_formatted() {
            read_data_formatted(stream, &header)?
        } else {
            read_data_binary(stream, &header)?
        };
        Ok(Keyword { header, data })
    }

    /// Advance the stream past the payload of `header` without materializing
    /// it.
    pub fn skip_payload<S: Read + Seek>(
        stream: &mut RecordStream<S>,
        header: &KwHeader,
    ) -> Result<()> {
        if stream.is_formatted() {
            let reader = stream.get_mut();
            let tokens = formatted_value_count(header);
            for _ in 0..tokens {
                formatted::require_token(reader, "keyword payload")?;
            }
            return Ok(());
        }
        let skipped = stream.skip_record()?;
        if skipped != header.payload_bytes() {
            return Err(ResdataError::TruncatedPayload {
                keyword: header.name.clone(),
                expected: header.payload_bytes(),
                found: skipped,
            });
        }
        Ok(())
    }

    /// Write this keyword at the current stream position. The on-disk header
    /// is always derived from the keyword's own type and count.
    pub fn write<S: Write + Seek>(&self, stream: &mut RecordStream<S>) -> Result<()> {
        self.header.write(stream)?;
        if stream.is_formatted() {
            write_data_formatted(stream, &self.data)
        } else {
            write_data_binary(stream, &self.data)
        }
    }

    /// Scan forward from the current position for the first keyword named
    /// `name`, preserving file order.
    ///
    /// On a hit the stream is left positioned at the start of the keyword's
    /// header and `true` is returned; on a miss the initial position is
    /// restored and `false` is returned.
    pub fn seek_kw<S: Read + Seek>(stream: &mut RecordStream<S>, name: &str) -> Result<bool> {
        let init_pos = stream.tell()?;
        loop {
            let record_start = stream.tell()?;
            match KwHeader::read(stream)? {
                Some(header) => {
                    if header.name == name {
                        stream.seek(record_start)?;
                        return Ok(true);
                    }
                    Self::skip_payload(stream, &header)?;
                }
                None => {
                    stream.seek(init_pos)?;
                    return Ok(false);
                }
            }
        }
    }

    /// Rewrite the payload of the keyword stored at `offset` in place.
    ///
    /// The on-disk header must match this keyword's name, type and count
    /// exactly, which guarantees identical framed length; any difference is
    /// rejected before a byte is written.
    pub fn replace_at<S: Read + Write + Seek>(
        &self,
        stream: &mut RecordStream<S>,
        offset: u64,
    ) -> Result<()> {
        if stream.is_formatted() {
            return Err(ResdataError::InvalidFormat(
                "in-place replace is only defined for binary streams".to_string(),
            ));
        }
        stream.seek(offset)?;
        let on_disk = KwHeader::read(stream)?.ok_or_else(|| ResdataError::ReplaceMismatch {
            keyword: self.header.name.clone(),
        })?;
        if on_disk != self.header {
            return Err(ResdataError::ReplaceMismatch {
                keyword: self.header.name.clone(),
            });
        }
        write_data_binary(stream, &self.data)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > KW_NAME_LEN || !name.is_ascii() {
        return Err(ResdataError::InvalidFormat(format!(
            "keyword name {:?} is not 1..=8 ASCII characters",
            name
        )));
    }
    Ok(())
}

fn pad8(value: &str) -> Result<String> {
    if value.len() > KW_NAME_LEN {
        return Err(ResdataError::InvalidFormat(format!(
            "{:?} exceeds 8 characters",
            value
        )));
    }
    Ok(format!("{:<8}", value))
}

fn decode_padded_str(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes).map_err(|_| {
        ResdataError::InvalidFormat("non-ASCII bytes in keyword header".to_string())
    })?;
    Ok(text.trim_end().to_string())
}

fn get_i32(endian: Endian, bytes: &[u8]) -> i32 {
    match endian {
        Endian::Big => BigEndian::read_i32(bytes),
        Endian::Little => LittleEndian::read_i32(bytes),
    }
}

fn get_f32(endian: Endian, bytes: &[u8]) -> f32 {
    match endian {
        Endian::Big => BigEndian::read_f32(bytes),
        Endian::Little => LittleEndian::read_f32(bytes),
    }
}

fn get_f64(endian: Endian, bytes: &[u8]) -> f64 {
    match endian {
        Endian::Big => BigEndian::read_f64(bytes),
        Endian::Little => LittleEndian::read_f64(bytes),
    }
}

fn put_i32(endian: Endian, out: &mut Vec<u8>, value: i32) {
    match endian {
        Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
        Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
    }
}

fn put_f32(endian: Endian, out: &mut Vec<u8>, value: f32) {
    match endian {
        Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
        Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
    }
}

fn put_f64(endian: Endian, out: &mut Vec<u8>, value: f64) {
    match endian {
        Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
        Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
    }
}

// Unformatted files store logicals as full integers.
const BOOL_TRUE_INT: i32 = -1;
const BOOL_FALSE_INT: i32 = 0;

fn read_data_binary<S: Read + Seek>(
    stream: &mut RecordStream<S>,
    header: &KwHeader,
) -> Result<KwData> {
    let endian = stream.endian();
    let payload = stream.read_record()?;
    if payload.len() as u64 != header.payload_bytes() {
        return Err(ResdataError::TruncatedPayload {
            keyword: header.name.clone(),
            expected: header.payload_bytes(),
            found: payload.len() as u64,
        });
    }
    let count = header.count as usize;
    match header.kw_type {
        KwType::Int => Ok(KwData::Int(
            payload.chunks_exact(4).map(|c| get_i32(endian, c)).collect(),
        )),
        KwType::Float => Ok(KwData::Float(
            payload.chunks_exact(4).map(|c| get_f32(endian, c)).collect(),
        )),
        KwType::Double => Ok(KwData::Double(
            payload.chunks_exact(8).map(|c| get_f64(endian, c)).collect(),
        )),
        KwType::Bool => {
            let mut values = Vec::with_capacity(count);
            for chunk in payload.chunks_exact(4) {
                match get_i32(endian, chunk) {
                    BOOL_TRUE_INT => values.push(true),
                    BOOL_FALSE_INT => values.push(false),
                    other => {
                        return Err(ResdataError::InvalidFormat(format!(
                            "bad logical value {} in keyword {}",
                            other, header.name
                        )))
                    }
                }
            }
            Ok(KwData::Bool(values))
        }
        KwType::String => {
            let mut values = Vec::with_capacity(count);
            for chunk in payload.chunks_exact(KW_NAME_LEN) {
                values.push(decode_padded_str(chunk)?);
            }
            Ok(KwData::Str(values))
        }
        KwType::Message => Ok(KwData::Message(header.count)),
    }
}

fn write_data_binary<S: Write + Seek>(
    stream: &mut RecordStream<S>,
    data: &KwData,
) -> Result<()> {
    let endian = stream.endian();
    let mut payload = Vec::new();
    match data {
        KwData::Int(values) => {
            for v in values {
                put_i32(endian, &mut payload, *v);
            }
        }
        KwData::Float(values) => {
            for v in values {
                put_f32(endian, &mut payload, *v);
            }
        }
        KwData::Double(values) => {
            for v in values {
                put_f64(endian, &mut payload, *v);
            }
        }
        KwData::Bool(values) => {
            for v in values {
                put_i32(endian, &mut payload, if *v { BOOL_TRUE_INT } else { BOOL_FALSE_INT });
            }
        }
        KwData::Str(values) => {
            for v in values {
                payload.extend_from_slice(pad8(v)?.as_bytes());
            }
        }
        KwData::Message(_) => {}
    }
    stream.write_record(&payload)
}

fn formatted_value_count(header: &KwHeader) -> u32 {
    match header.kw_type {
        // Message keywords have no payload values in either encoding.
        KwType::Message => 0,
        _ => header.count,
    }
}

fn read_data_formatted<S: Read + Seek>(
    stream: &mut RecordStream<S>,
    header: &KwHeader,
) -> Result<KwData> {
    let reader = stream.get_mut();
    let count = header.count as usize;
    match header.kw_type {
        KwType::Int => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(formatted::parse_int(&formatted::require_token(
                    reader, "INTE value",
                )?)?);
            }
            Ok(KwData::Int(values))
        }
        KwType::Float => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(formatted::parse_float(&formatted::require_token(
                    reader, "REAL value",
                )?)?);
            }
            Ok(KwData::Float(values))
        }
        KwType::Double => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(formatted::parse_double(&formatted::require_token(
                    reader, "DOUB value",
                )?)?);
            }
            Ok(KwData::Double(values))
        }
        KwType::Bool => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(formatted::parse_bool(&formatted::require_token(
                    reader, "LOGI value",
                )?)?);
            }
            Ok(KwData::Bool(values))
        }
        KwType::String => {
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                let token = formatted::require_token(reader, "CHAR value")?;
                values.push(token.trim_end().to_string());
            }
            Ok(KwData::Str(values))
        }
        KwType::Message => Ok(KwData::Message(header.count)),
    }
}

fn write_data_formatted<S: Write + Seek>(
    stream: &mut RecordStream<S>,
    data: &KwData,
) -> Result<()> {
    let columns = data.kw_type().columns();
    let mut cells: Vec<String> = Vec::new();
    match data {
        KwData::Int(values) => cells.extend(values.iter().map(|v| formatted::fmt_int(*v))),
        KwData::Float(values) => cells.extend(values.iter().map(|v| formatted::fmt_float(*v))),
        KwData::Double(values) => cells.extend(values.iter().map(|v| formatted::fmt_double(*v))),
        KwData::Bool(values) => cells.extend(values.iter().map(|v| formatted::fmt_bool(*v))),
        KwData::Str(values) => cells.extend(values.iter().map(|v| formatted::fmt_str(v))),
        KwData::Message(_) => {}
    }
    let writer = stream.get_mut();
    for line in cells.chunks(columns) {
        for cell in line {
            writer.write_all(cell.as_bytes())?;
        }
        writer.write_all(b"\n")?;
    }
    Ok(())
}
