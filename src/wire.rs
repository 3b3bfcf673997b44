use crate::message::ArchiveMessage;
use crate::value::{
    AffineTransform, Alignment, Color, EntryRef, FieldValue, HorizontalAlignment, NodeRef, Point,
    Rect, Size, TypeCode, VerticalAlignment,
};
use bytes::{Buf, BufMut};
use thiserror::Error;

/// File magic for flattened archive messages.
pub const MAGIC: [u8; 4] = *b"KAM1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of input")]
    Truncated,
    #[error("bad magic {0:?}, expected {MAGIC:?}")]
    BadMagic([u8; 4]),
    #[error("unknown type code {0:#010x}")]
    UnknownType(u32),
    #[error("field name is not valid UTF-8")]
    InvalidName,
    #[error("string value is not valid UTF-8")]
    InvalidString,
    #[error("bad {type_name} payload of {len} bytes")]
    BadPayload { type_name: &'static str, len: usize },
    #[error("duplicate field {0:?} with conflicting type")]
    DuplicateField(String),
    #[error("{0} trailing bytes after message")]
    TrailingData(usize),
}

/// Serialize a message to its on-disk form. All integers are little-endian;
/// nested messages recurse into their own complete flattened form.
pub fn flatten(msg: &ArchiveMessage) -> Vec<u8> {
    let mut out = Vec::new();
    flatten_into(msg, &mut out);
    out
}

fn flatten_into(msg: &ArchiveMessage, out: &mut Vec<u8>) {
    out.put_slice(&MAGIC);
    out.put_u32_le(msg.what());
    out.put_u32_le(msg.count_names() as u32);
    for name in msg.field_names() {
        let values = msg.values(name);
        // a field always holds at least one value
        let Some(code) = values.first().map(FieldValue::type_code) else {
            continue;
        };
        out.put_u32_le(name.len() as u32);
        out.put_slice(name.as_bytes());
        out.put_u32_le(code.code());
        out.put_u32_le(values.len() as u32);
        for value in values {
            let payload = encode_payload(value);
            out.put_u32_le(payload.len() as u32);
            out.put_slice(&payload);
        }
    }
}

/// Parse a complete flattened message, rejecting any trailing bytes.
pub fn unflatten(bytes: &[u8]) -> Result<ArchiveMessage, WireError> {
    let mut buf = bytes;
    let msg = read_message(&mut buf)?;
    if !buf.is_empty() {
        return Err(WireError::TrailingData(buf.len()));
    }
    Ok(msg)
}

fn encode_payload(value: &FieldValue) -> Vec<u8> {
    let mut out = Vec::new();
    match value {
        FieldValue::Bool(v) => out.put_u8(u8::from(*v)),
        FieldValue::Int8(v) => out.put_i8(*v),
        FieldValue::Int16(v) => out.put_i16_le(*v),
        FieldValue::Int32(v) => out.put_i32_le(*v),
        FieldValue::Int64(v) => out.put_i64_le(*v),
        FieldValue::UInt8(v) => out.put_u8(*v),
        FieldValue::UInt16(v) => out.put_u16_le(*v),
        FieldValue::UInt32(v) => out.put_u32_le(*v),
        FieldValue::UInt64(v) => out.put_u64_le(*v),
        FieldValue::Float(v) => out.put_f32_le(*v),
        FieldValue::Double(v) => out.put_f64_le(*v),
        FieldValue::String(s) => out.put_slice(s.as_bytes()),
        FieldValue::Raw(data) => out.put_slice(data),
        FieldValue::Point(p) => {
            out.put_f32_le(p.x);
            out.put_f32_le(p.y);
        }
        FieldValue::Rect(r) => {
            out.put_f32_le(r.left);
            out.put_f32_le(r.top);
            out.put_f32_le(r.right);
            out.put_f32_le(r.bottom);
        }
        FieldValue::Size(s) => {
            out.put_f32_le(s.width);
            out.put_f32_le(s.height);
        }
        FieldValue::Color(c) => {
            out.put_u8(c.red);
            out.put_u8(c.green);
            out.put_u8(c.blue);
            out.put_u8(c.alpha);
        }
        FieldValue::Alignment(a) => {
            out.put_u32_le(horizontal_code(a.horizontal));
            out.put_u32_le(vertical_code(a.vertical));
        }
        FieldValue::AffineTransform(t) => {
            out.put_f64_le(t.sx);
            out.put_f64_le(t.shy);
            out.put_f64_le(t.shx);
            out.put_f64_le(t.sy);
            out.put_f64_le(t.tx);
            out.put_f64_le(t.ty);
        }
        FieldValue::Time(secs) => out.put_i64_le(*secs),
        FieldValue::EntryRef(r) => {
            out.put_i64_le(r.device);
            out.put_i64_le(r.directory);
            out.put_slice(r.name.as_bytes());
        }
        FieldValue::NodeRef(r) => {
            out.put_i64_le(r.device);
            out.put_i64_le(r.node);
        }
        FieldValue::Message(msg) => flatten_into(msg, &mut out),
    }
    out
}

fn read_message(buf: &mut &[u8]) -> Result<ArchiveMessage, WireError> {
    if buf.remaining() < 4 {
        return Err(WireError::Truncated);
    }
    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if magic != MAGIC {
        return Err(WireError::BadMagic(magic));
    }
    let what = get_u32(buf)?;
    let field_count = get_u32(buf)?;
    let mut msg = ArchiveMessage::with_what(what);
    for _ in 0..field_count {
        let name_len = get_u32(buf)? as usize;
        let name = str::from_utf8(take(buf, name_len)?)
            .map_err(|_| WireError::InvalidName)?
            .to_string();
        let raw_code = get_u32(buf)?;
        let code = TypeCode::from_code(raw_code).ok_or(WireError::UnknownType(raw_code))?;
        let value_count = get_u32(buf)?;
        for _ in 0..value_count {
            let payload_len = get_u32(buf)? as usize;
            let payload = take(buf, payload_len)?;
            let value = decode_payload(code, payload)?;
            msg.add(&name, value)
                .map_err(|_| WireError::DuplicateField(name.clone()))?;
        }
    }
    Ok(msg)
}

fn decode_payload(code: TypeCode, payload: &[u8]) -> Result<FieldValue, WireError> {
    let len = payload.len();
    let bad = || WireError::BadPayload {
        type_name: code.type_name(),
        len,
    };
    let mut p = payload;
    let value = match code {
        TypeCode::Bool => {
            require_len(len, 1, bad)?;
            FieldValue::Bool(p.get_u8() != 0)
        }
        TypeCode::Int8 => {
            require_len(len, 1, bad)?;
            FieldValue::Int8(p.get_i8())
        }
        TypeCode::Int16 => {
            require_len(len, 2, bad)?;
            FieldValue::Int16(p.get_i16_le())
        }
        TypeCode::Int32 => {
            require_len(len, 4, bad)?;
            FieldValue::Int32(p.get_i32_le())
        }
        TypeCode::Int64 => {
            require_len(len, 8, bad)?;
            FieldValue::Int64(p.get_i64_le())
        }
        TypeCode::UInt8 => {
            require_len(len, 1, bad)?;
            FieldValue::UInt8(p.get_u8())
        }
        TypeCode::UInt16 => {
            require_len(len, 2, bad)?;
            FieldValue::UInt16(p.get_u16_le())
        }
        TypeCode::UInt32 => {
            require_len(len, 4, bad)?;
            FieldValue::UInt32(p.get_u32_le())
        }
        TypeCode::UInt64 => {
            require_len(len, 8, bad)?;
            FieldValue::UInt64(p.get_u64_le())
        }
        TypeCode::Float => {
            require_len(len, 4, bad)?;
            FieldValue::Float(p.get_f32_le())
        }
        TypeCode::Double => {
            require_len(len, 8, bad)?;
            FieldValue::Double(p.get_f64_le())
        }
        TypeCode::String => FieldValue::String(
            str::from_utf8(payload)
                .map_err(|_| WireError::InvalidString)?
                .to_string(),
        ),
        TypeCode::Raw => FieldValue::Raw(payload.to_vec()),
        TypeCode::Point => {
            require_len(len, 8, bad)?;
            FieldValue::Point(Point {
                x: p.get_f32_le(),
                y: p.get_f32_le(),
            })
        }
        TypeCode::Rect => {
            require_len(len, 16, bad)?;
            FieldValue::Rect(Rect {
                left: p.get_f32_le(),
                top: p.get_f32_le(),
                right: p.get_f32_le(),
                bottom: p.get_f32_le(),
            })
        }
        TypeCode::Size => {
            require_len(len, 8, bad)?;
            FieldValue::Size(Size {
                width: p.get_f32_le(),
                height: p.get_f32_le(),
            })
        }
        TypeCode::Color => {
            require_len(len, 4, bad)?;
            FieldValue::Color(Color {
                red: p.get_u8(),
                green: p.get_u8(),
                blue: p.get_u8(),
                alpha: p.get_u8(),
            })
        }
        TypeCode::Alignment => {
            require_len(len, 8, bad)?;
            let horizontal = horizontal_from_code(p.get_u32_le()).ok_or_else(bad)?;
            let vertical = vertical_from_code(p.get_u32_le()).ok_or_else(bad)?;
            FieldValue::Alignment(Alignment {
                horizontal,
                vertical,
            })
        }
        TypeCode::AffineTransform => {
            require_len(len, 48, bad)?;
            FieldValue::AffineTransform(AffineTransform {
                sx: p.get_f64_le(),
                shy: p.get_f64_le(),
                shx: p.get_f64_le(),
                sy: p.get_f64_le(),
                tx: p.get_f64_le(),
                ty: p.get_f64_le(),
            })
        }
        TypeCode::Time => {
            require_len(len, 8, bad)?;
            FieldValue::Time(p.get_i64_le())
        }
        TypeCode::EntryRef => {
            if len < 16 {
                return Err(bad());
            }
            let device = p.get_i64_le();
            let directory = p.get_i64_le();
            let name = str::from_utf8(p)
                .map_err(|_| WireError::InvalidString)?
                .to_string();
            FieldValue::EntryRef(EntryRef {
                device,
                directory,
                name,
            })
        }
        TypeCode::NodeRef => {
            require_len(len, 16, bad)?;
            FieldValue::NodeRef(NodeRef {
                device: p.get_i64_le(),
                node: p.get_i64_le(),
            })
        }
        TypeCode::Message => {
            let mut cursor = payload;
            let inner = read_message(&mut cursor)?;
            if !cursor.is_empty() {
                return Err(bad());
            }
            FieldValue::Message(inner)
        }
    };
    Ok(value)
}

fn get_u32(buf: &mut &[u8]) -> Result<u32, WireError> {
    if buf.remaining() < 4 {
        return Err(WireError::Truncated);
    }
    Ok(buf.get_u32_le())
}

fn take<'a>(buf: &mut &'a [u8], len: usize) -> Result<&'a [u8], WireError> {
    if buf.len() < len {
        return Err(WireError::Truncated);
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

fn require_len(len: usize, want: usize, bad: impl Fn() -> WireError) -> Result<(), WireError> {
    if len == want { Ok(()) } else { Err(bad()) }
}

fn horizontal_code(a: HorizontalAlignment) -> u32 {
    match a {
        HorizontalAlignment::Left => 0,
        HorizontalAlignment::Right => 1,
        HorizontalAlignment::Center => 2,
        HorizontalAlignment::UseFullWidth => 3,
        HorizontalAlignment::Unset => 4,
    }
}

fn horizontal_from_code(code: u32) -> Option<HorizontalAlignment> {
    Some(match code {
        0 => HorizontalAlignment::Left,
        1 => HorizontalAlignment::Right,
        2 => HorizontalAlignment::Center,
        3 => HorizontalAlignment::UseFullWidth,
        4 => HorizontalAlignment::Unset,
        _ => return None,
    })
}

fn vertical_code(a: VerticalAlignment) -> u32 {
    match a {
        VerticalAlignment::Top => 0,
        VerticalAlignment::Middle => 1,
        VerticalAlignment::Bottom => 2,
        VerticalAlignment::UseFullHeight => 3,
        VerticalAlignment::Unset => 4,
    }
}

fn vertical_from_code(code: u32) -> Option<VerticalAlignment> {
    Some(match code {
        0 => VerticalAlignment::Top,
        1 => VerticalAlignment::Middle,
        2 => VerticalAlignment::Bottom,
        3 => VerticalAlignment::UseFullHeight,
        4 => VerticalAlignment::Unset,
        _ => return None,
    })
}
