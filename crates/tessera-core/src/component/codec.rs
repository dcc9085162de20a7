//! Binary descriptor stream.
//!
//! A stream is a sequence of records read until end of input:
//!
//! ```text
//! record    := MARKER type:str name:str
//!              u32 attr-count   (name:str tag:u8 u32 len payload)*
//!              u32 ref-count    (name:str pattern)*
//!              u32 dep-count    (name:str)*
//! str       := u32 len utf8
//! pattern   := 0 query | 1 u32 count (name:str)*
//! query     := u8 has-domain [domain:str] u32 count (key:str value:str)* u32 count (tag:str)*
//! ```
//!
//! Integers are little-endian. Attribute payloads are length-prefixed so a
//! reader can skip values it does not understand; decoding still validates
//! every value against the schema the resolver returns.
use std::collections::BTreeSet;
use std::io::{self, Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::component::descriptor::{ComponentDescriptor, ReferencePattern};
use crate::component::error::ComponentError;
use crate::component::info::ComponentInfo;
use crate::component::value::AttributeValue;
use crate::naming::{AbstractName, AbstractNameQuery};

const RECORD_MARKER: u8 = 0xC5;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STR: u8 = 4;
const TAG_BYTES: u8 = 5;
const TAG_PATH: u8 = 6;
const TAG_NAME: u8 = 7;
const TAG_LIST: u8 = 8;

/// Deepest list nesting a stream may carry.
pub const MAX_LIST_DEPTH: usize = 32;

const PATTERN_QUERY: u8 = 0;
const PATTERN_NAMES: u8 = 1;

fn codec_err(e: impl std::fmt::Display) -> ComponentError {
    ComponentError::Codec(e.to_string())
}

/// Encode descriptors into one stream.
pub fn encode_descriptors(descriptors: &[ComponentDescriptor]) -> Result<Vec<u8>, ComponentError> {
    let mut out = Vec::new();
    for descriptor in descriptors {
        write_record(&mut out, descriptor).map_err(codec_err)?;
    }
    Ok(out)
}

/// Decode every record in `bytes`, resolving type names through `resolve`.
///
/// `resolve` is normally [`ClassLoader::load_info`](crate::component::ClassLoader::load_info);
/// its error aborts decoding.
pub fn decode_descriptors<F>(bytes: &[u8], mut resolve: F) -> Result<Vec<ComponentDescriptor>, ComponentError>
where
    F: FnMut(&str) -> Result<Arc<ComponentInfo>, ComponentError>,
{
    let mut cursor = Cursor::new(bytes);
    let mut descriptors = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        descriptors.push(read_record(&mut cursor, &mut resolve)?);
    }
    Ok(descriptors)
}

fn write_str<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    w.write_u32::<LittleEndian>(s.len() as u32)?;
    w.write_all(s.as_bytes())
}

fn read_str<R: Read>(r: &mut R) -> Result<String, ComponentError> {
    let bytes = read_block(r)?;
    String::from_utf8(bytes).map_err(codec_err)
}

fn read_block<R: Read>(r: &mut R) -> Result<Vec<u8>, ComponentError> {
    let len = r.read_u32::<LittleEndian>().map_err(codec_err)? as u64;
    let mut bytes = Vec::new();
    r.take(len).read_to_end(&mut bytes).map_err(codec_err)?;
    if bytes.len() as u64 != len {
        return Err(ComponentError::Codec("truncated stream".to_string()));
    }
    Ok(bytes)
}

fn read_count<R: Read>(r: &mut R) -> Result<usize, ComponentError> {
    r.read_u32::<LittleEndian>().map(|c| c as usize).map_err(codec_err)
}

fn read_name<R: Read>(r: &mut R) -> Result<AbstractName, ComponentError> {
    read_str(r)?.parse().map_err(codec_err)
}

fn write_record(out: &mut Vec<u8>, descriptor: &ComponentDescriptor) -> io::Result<()> {
    out.write_u8(RECORD_MARKER)?;
    write_str(out, descriptor.type_name())?;
    write_str(out, &descriptor.name().to_string())?;

    out.write_u32::<LittleEndian>(descriptor.attributes().len() as u32)?;
    for (name, value) in descriptor.attributes() {
        write_str(out, name)?;
        write_value(out, value)?;
    }

    out.write_u32::<LittleEndian>(descriptor.references().len() as u32)?;
    for (name, pattern) in descriptor.references() {
        write_str(out, name)?;
        match pattern {
            ReferencePattern::Query(query) => {
                out.write_u8(PATTERN_QUERY)?;
                write_query(out, query)?;
            }
            ReferencePattern::Names(names) => {
                out.write_u8(PATTERN_NAMES)?;
                out.write_u32::<LittleEndian>(names.len() as u32)?;
                for target in names {
                    write_str(out, &target.to_string())?;
                }
            }
        }
    }

    out.write_u32::<LittleEndian>(descriptor.dependencies().len() as u32)?;
    for dependency in descriptor.dependencies() {
        write_str(out, &dependency.to_string())?;
    }
    Ok(())
}

fn read_record<F>(cursor: &mut Cursor<&[u8]>, resolve: &mut F) -> Result<ComponentDescriptor, ComponentError>
where
    F: FnMut(&str) -> Result<Arc<ComponentInfo>, ComponentError>,
{
    let marker = cursor.read_u8().map_err(codec_err)?;
    if marker != RECORD_MARKER {
        return Err(ComponentError::Codec(format!(
            "bad record marker 0x{:02x} at offset {}",
            marker,
            cursor.position() - 1
        )));
    }
    let type_name = read_str(cursor)?;
    let name = read_name(cursor)?;
    let info = resolve(&type_name)?;
    let mut descriptor = ComponentDescriptor::new(name, info);

    for _ in 0..read_count(cursor)? {
        let attribute = read_str(cursor)?;
        let value = read_value(cursor, 0)?;
        descriptor.set_attribute(&attribute, value)?;
    }

    for _ in 0..read_count(cursor)? {
        let reference = read_str(cursor)?;
        let pattern = match cursor.read_u8().map_err(codec_err)? {
            PATTERN_QUERY => ReferencePattern::Query(read_query(cursor)?),
            PATTERN_NAMES => {
                let mut names = BTreeSet::new();
                for _ in 0..read_count(cursor)? {
                    names.insert(read_name(cursor)?);
                }
                ReferencePattern::Names(names)
            }
            other => return Err(ComponentError::Codec(format!("unknown reference pattern {}", other))),
        };
        descriptor.set_reference(&reference, pattern)?;
    }

    for _ in 0..read_count(cursor)? {
        descriptor.add_dependency(read_name(cursor)?);
    }
    Ok(descriptor)
}

fn write_query<W: Write>(w: &mut W, query: &AbstractNameQuery) -> io::Result<()> {
    match query.required_domain() {
        Some(domain) => {
            w.write_u8(1)?;
            write_str(w, domain)?;
        }
        None => w.write_u8(0)?,
    }
    w.write_u32::<LittleEndian>(query.properties().len() as u32)?;
    for (key, value) in query.properties() {
        write_str(w, key)?;
        write_str(w, value)?;
    }
    w.write_u32::<LittleEndian>(query.interfaces().len() as u32)?;
    for tag in query.interfaces() {
        write_str(w, tag)?;
    }
    Ok(())
}

fn read_query<R: Read>(r: &mut R) -> Result<AbstractNameQuery, ComponentError> {
    let mut query = AbstractNameQuery::any();
    if r.read_u8().map_err(codec_err)? == 1 {
        query = query.domain(&read_str(r)?);
    }
    for _ in 0..read_count(r)? {
        let key = read_str(r)?;
        let value = read_str(r)?;
        query = query.property(&key, &value);
    }
    for _ in 0..read_count(r)? {
        query = query.interface(&read_str(r)?);
    }
    Ok(query)
}

fn write_value<W: Write>(w: &mut W, value: &AttributeValue) -> io::Result<()> {
    let (tag, payload) = value_payload(value)?;
    w.write_u8(tag)?;
    w.write_u32::<LittleEndian>(payload.len() as u32)?;
    w.write_all(&payload)
}

fn value_payload(value: &AttributeValue) -> io::Result<(u8, Vec<u8>)> {
    let mut payload = Vec::new();
    let tag = match value {
        AttributeValue::Null => TAG_NULL,
        AttributeValue::Bool(b) => {
            payload.write_u8(u8::from(*b))?;
            TAG_BOOL
        }
        AttributeValue::Int(i) => {
            payload.write_i64::<LittleEndian>(*i)?;
            TAG_INT
        }
        AttributeValue::Float(x) => {
            payload.write_f64::<LittleEndian>(*x)?;
            TAG_FLOAT
        }
        AttributeValue::Str(s) => {
            payload.extend_from_slice(s.as_bytes());
            TAG_STR
        }
        AttributeValue::Bytes(b) => {
            payload.extend_from_slice(b);
            TAG_BYTES
        }
        AttributeValue::Path(p) => {
            let s = p.to_str().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, format!("path {} is not UTF-8", p.display()))
            })?;
            payload.extend_from_slice(s.as_bytes());
            TAG_PATH
        }
        AttributeValue::Name(n) => {
            payload.extend_from_slice(n.to_string().as_bytes());
            TAG_NAME
        }
        AttributeValue::List(items) => {
            payload.write_u32::<LittleEndian>(items.len() as u32)?;
            for item in items {
                write_value(&mut payload, item)?;
            }
            TAG_LIST
        }
    };
    Ok((tag, payload))
}

fn read_value<R: Read>(r: &mut R, depth: usize) -> Result<AttributeValue, ComponentError> {
    let tag = r.read_u8().map_err(codec_err)?;
    let payload = read_block(r)?;
    decode_payload(tag, &payload, depth)
}

fn decode_payload(tag: u8, payload: &[u8], depth: usize) -> Result<AttributeValue, ComponentError> {
    let mut cursor = Cursor::new(payload);
    let text = || String::from_utf8(payload.to_vec()).map_err(codec_err);
    let value = match tag {
        TAG_NULL => AttributeValue::Null,
        TAG_BOOL => AttributeValue::Bool(cursor.read_u8().map_err(codec_err)? != 0),
        TAG_INT => AttributeValue::Int(cursor.read_i64::<LittleEndian>().map_err(codec_err)?),
        TAG_FLOAT => AttributeValue::Float(cursor.read_f64::<LittleEndian>().map_err(codec_err)?),
        TAG_STR => AttributeValue::Str(text()?),
        TAG_BYTES => AttributeValue::Bytes(payload.to_vec()),
        TAG_PATH => AttributeValue::Path(PathBuf::from(text()?)),
        TAG_NAME => AttributeValue::Name(text()?.parse().map_err(codec_err)?),
        TAG_LIST => {
            if depth >= MAX_LIST_DEPTH {
                return Err(ComponentError::Codec(format!("list nesting deeper than {}", MAX_LIST_DEPTH)));
            }
            let count = read_count(&mut cursor)?;
            let mut items = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                items.push(read_value(&mut cursor, depth + 1)?);
            }
            AttributeValue::List(items)
        }
        other => return Err(ComponentError::Codec(format!("unknown value tag {}", other))),
    };
    Ok(value)
}
