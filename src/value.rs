use crate::message::ArchiveMessage;

pub(crate) const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

/// Wire type codes for archive message fields. Every value stored in a
/// message carries one of these; all values under one field name share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    String,
    Raw,
    Point,
    Rect,
    Size,
    Color,
    Alignment,
    AffineTransform,
    Time,
    EntryRef,
    NodeRef,
    Message,
}

impl TypeCode {
    pub const ALL: [TypeCode; 23] = [
        TypeCode::Bool,
        TypeCode::Int8,
        TypeCode::Int16,
        TypeCode::Int32,
        TypeCode::Int64,
        TypeCode::UInt8,
        TypeCode::UInt16,
        TypeCode::UInt32,
        TypeCode::UInt64,
        TypeCode::Float,
        TypeCode::Double,
        TypeCode::String,
        TypeCode::Raw,
        TypeCode::Point,
        TypeCode::Rect,
        TypeCode::Size,
        TypeCode::Color,
        TypeCode::Alignment,
        TypeCode::AffineTransform,
        TypeCode::Time,
        TypeCode::EntryRef,
        TypeCode::NodeRef,
        TypeCode::Message,
    ];

    pub fn code(self) -> u32 {
        match self {
            TypeCode::Bool => fourcc(b"BOOL"),
            TypeCode::Int8 => fourcc(b"BYTE"),
            TypeCode::Int16 => fourcc(b"SHRT"),
            TypeCode::Int32 => fourcc(b"LONG"),
            TypeCode::Int64 => fourcc(b"LLNG"),
            TypeCode::UInt8 => fourcc(b"UBYT"),
            TypeCode::UInt16 => fourcc(b"USHT"),
            TypeCode::UInt32 => fourcc(b"ULNG"),
            TypeCode::UInt64 => fourcc(b"ULLG"),
            TypeCode::Float => fourcc(b"FLOT"),
            TypeCode::Double => fourcc(b"DBLE"),
            TypeCode::String => fourcc(b"CSTR"),
            TypeCode::Raw => fourcc(b"RAWT"),
            TypeCode::Point => fourcc(b"BPNT"),
            TypeCode::Rect => fourcc(b"RECT"),
            TypeCode::Size => fourcc(b"SIZE"),
            TypeCode::Color => fourcc(b"RGBC"),
            TypeCode::Alignment => fourcc(b"ALGN"),
            TypeCode::AffineTransform => fourcc(b"AMTX"),
            TypeCode::Time => fourcc(b"TIME"),
            TypeCode::EntryRef => fourcc(b"RREF"),
            TypeCode::NodeRef => fourcc(b"NREF"),
            TypeCode::Message => fourcc(b"MSGG"),
        }
    }

    pub fn from_code(code: u32) -> Option<TypeCode> {
        TypeCode::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn type_name(self) -> &'static str {
        match self {
            TypeCode::Bool => "bool",
            TypeCode::Int8 => "int8",
            TypeCode::Int16 => "int16",
            TypeCode::Int32 => "int32",
            TypeCode::Int64 => "int64",
            TypeCode::UInt8 => "uint8",
            TypeCode::UInt16 => "uint16",
            TypeCode::UInt32 => "uint32",
            TypeCode::UInt64 => "uint64",
            TypeCode::Float => "float",
            TypeCode::Double => "double",
            TypeCode::String => "string",
            TypeCode::Raw => "raw data",
            TypeCode::Point => "point",
            TypeCode::Rect => "rect",
            TypeCode::Size => "size",
            TypeCode::Color => "color",
            TypeCode::Alignment => "alignment",
            TypeCode::AffineTransform => "affine transform",
            TypeCode::Time => "time",
            TypeCode::EntryRef => "entry ref",
            TypeCode::NodeRef => "node ref",
            TypeCode::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlignment {
    Left,
    Right,
    Center,
    UseFullWidth,
    #[default]
    Unset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlignment {
    Top,
    Middle,
    Bottom,
    UseFullHeight,
    #[default]
    Unset,
}

impl HorizontalAlignment {
    pub const ALL: [HorizontalAlignment; 5] = [
        HorizontalAlignment::Left,
        HorizontalAlignment::Right,
        HorizontalAlignment::Center,
        HorizontalAlignment::UseFullWidth,
        HorizontalAlignment::Unset,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HorizontalAlignment::Left => "left",
            HorizontalAlignment::Right => "right",
            HorizontalAlignment::Center => "center",
            HorizontalAlignment::UseFullWidth => "full width",
            HorizontalAlignment::Unset => "(unset)",
        }
    }
}

impl VerticalAlignment {
    pub const ALL: [VerticalAlignment; 5] = [
        VerticalAlignment::Top,
        VerticalAlignment::Middle,
        VerticalAlignment::Bottom,
        VerticalAlignment::UseFullHeight,
        VerticalAlignment::Unset,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VerticalAlignment::Top => "top",
            VerticalAlignment::Middle => "middle",
            VerticalAlignment::Bottom => "bottom",
            VerticalAlignment::UseFullHeight => "full height",
            VerticalAlignment::Unset => "(unset)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
}

/// 2D affine transform. Field order matches the wire payload
/// (sx, shy, shx, sy, tx, ty).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub sx: f64,
    pub shy: f64,
    pub shx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self {
            sx: 1.0,
            shy: 0.0,
            shx: 0.0,
            sy: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

/// Reference to a filesystem entry (directory member by name).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryRef {
    pub device: i64,
    pub directory: i64,
    pub name: String,
}

/// Reference to a filesystem node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeRef {
    pub device: i64,
    pub node: i64,
}

/// One typed value inside an archive message field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Raw(Vec<u8>),
    Point(Point),
    Rect(Rect),
    Size(Size),
    Color(Color),
    Alignment(Alignment),
    AffineTransform(AffineTransform),
    /// Unix time in seconds.
    Time(i64),
    EntryRef(EntryRef),
    NodeRef(NodeRef),
    Message(ArchiveMessage),
}

impl FieldValue {
    pub fn type_code(&self) -> TypeCode {
        match self {
            FieldValue::Bool(_) => TypeCode::Bool,
            FieldValue::Int8(_) => TypeCode::Int8,
            FieldValue::Int16(_) => TypeCode::Int16,
            FieldValue::Int32(_) => TypeCode::Int32,
            FieldValue::Int64(_) => TypeCode::Int64,
            FieldValue::UInt8(_) => TypeCode::UInt8,
            FieldValue::UInt16(_) => TypeCode::UInt16,
            FieldValue::UInt32(_) => TypeCode::UInt32,
            FieldValue::UInt64(_) => TypeCode::UInt64,
            FieldValue::Float(_) => TypeCode::Float,
            FieldValue::Double(_) => TypeCode::Double,
            FieldValue::String(_) => TypeCode::String,
            FieldValue::Raw(_) => TypeCode::Raw,
            FieldValue::Point(_) => TypeCode::Point,
            FieldValue::Rect(_) => TypeCode::Rect,
            FieldValue::Size(_) => TypeCode::Size,
            FieldValue::Color(_) => TypeCode::Color,
            FieldValue::Alignment(_) => TypeCode::Alignment,
            FieldValue::AffineTransform(_) => TypeCode::AffineTransform,
            FieldValue::Time(_) => TypeCode::Time,
            FieldValue::EntryRef(_) => TypeCode::EntryRef,
            FieldValue::NodeRef(_) => TypeCode::NodeRef,
            FieldValue::Message(_) => TypeCode::Message,
        }
    }

    pub fn as_message(&self) -> Option<&ArchiveMessage> {
        match self {
            FieldValue::Message(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut ArchiveMessage> {
        match self {
            FieldValue::Message(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short single-line preview for the quick-view panel and tree rows.
    pub fn preview(&self) -> String {
        match self {
            FieldValue::Bool(v) => if *v { "true" } else { "false" }.to_string(),
            FieldValue::Int8(v) => v.to_string(),
            FieldValue::Int16(v) => v.to_string(),
            FieldValue::Int32(v) => v.to_string(),
            FieldValue::Int64(v) => v.to_string(),
            FieldValue::UInt8(v) => v.to_string(),
            FieldValue::UInt16(v) => v.to_string(),
            FieldValue::UInt32(v) => v.to_string(),
            FieldValue::UInt64(v) => v.to_string(),
            FieldValue::Float(v) => format_f32(*v),
            FieldValue::Double(v) => format_f64(*v),
            FieldValue::String(s) => s.clone(),
            FieldValue::Raw(data) => format!("{} bytes", data.len()),
            FieldValue::Point(p) => format!("{}, {}", format_f32(p.x), format_f32(p.y)),
            FieldValue::Rect(r) => format!(
                "{}, {}, {}, {}",
                format_f32(r.left),
                format_f32(r.top),
                format_f32(r.right),
                format_f32(r.bottom)
            ),
            FieldValue::Size(s) => format!("{}, {}", format_f32(s.width), format_f32(s.height)),
            FieldValue::Color(c) => format!("{}, {}, {}, {}", c.red, c.green, c.blue, c.alpha),
            FieldValue::Alignment(a) => {
                format!("{}, {}", a.horizontal.label(), a.vertical.label())
            }
            FieldValue::AffineTransform(t) => format!(
                "translation({}, {}); scale({}, {}); shear({}, {})",
                format_f64(t.tx),
                format_f64(t.ty),
                format_f64(t.sx),
                format_f64(t.sy),
                format_f64(t.shx),
                format_f64(t.shy)
            ),
            FieldValue::Time(secs) => format_time(*secs),
            FieldValue::EntryRef(r) => format!(
                "device: {}, directory: {}, name: {}",
                r.device, r.directory, r.name
            ),
            FieldValue::NodeRef(r) => format!("device: {}, node: {}", r.device, r.node),
            FieldValue::Message(msg) => format!("{} entries", msg.count_names()),
        }
    }
}

fn format_f32(v: f32) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let mut buf = ryu::Buffer::new();
    buf.format(v).to_string()
}

fn format_f64(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let mut buf = ryu::Buffer::new();
    buf.format(v).to_string()
}

fn format_time(secs: i64) -> String {
    use chrono::DateTime;
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{secs} (out of range)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_roundtrip_and_are_unique() {
        for t in TypeCode::ALL {
            assert_eq!(TypeCode::from_code(t.code()), Some(t));
        }
        let mut codes: Vec<u32> = TypeCode::ALL.iter().map(|t| t.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), TypeCode::ALL.len());
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(TypeCode::from_code(0xDEAD_BEEF), None);
    }

    #[test]
    fn previews_are_single_line() {
        let values = [
            FieldValue::Bool(true),
            FieldValue::Int32(-17),
            FieldValue::Float(2.5),
            FieldValue::String("hello".into()),
            FieldValue::Rect(Rect {
                left: 0.0,
                top: 0.0,
                right: 10.0,
                bottom: 10.0,
            }),
            FieldValue::Color(Color {
                red: 1,
                green: 2,
                blue: 3,
                alpha: 255,
            }),
            FieldValue::Raw(vec![0u8; 16]),
        ];
        for v in values {
            assert!(!v.preview().contains('\n'));
        }
    }

    #[test]
    fn rect_preview_matches_field_order() {
        let v = FieldValue::Rect(Rect {
            left: 1.0,
            top: 2.0,
            right: 3.0,
            bottom: 4.0,
        });
        assert_eq!(v.preview(), "1.0, 2.0, 3.0, 4.0");
    }

    #[test]
    fn time_preview_formats_utc() {
        // 2000-02-29 00:00:00 UTC
        let v = FieldValue::Time(951_782_400);
        assert_eq!(v.preview(), "2000-02-29 00:00:00");
    }
}
