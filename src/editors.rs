use crate::message::ArchiveMessage;
use crate::value::{
    AffineTransform, Alignment, Color, EntryRef, FieldValue, HorizontalAlignment, NodeRef, Point,
    Rect, Size, TypeCode, VerticalAlignment,
};
use anyhow::bail;
use chrono::{DateTime, Datelike, NaiveDate, Timelike};

/// Widget-state buffer for one value editor. Numeric text fields stay text
/// until save so partial input never mutates the document.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorBuffer {
    Bool(bool),
    Integer { code: TypeCode, text: String },
    Float(f32),
    Double(f64),
    Text(String),
    Point { x: f32, y: f32 },
    Rect { left: f32, top: f32, right: f32, bottom: f32 },
    Size { width: f32, height: f32 },
    Color(Color),
    Alignment {
        horizontal: HorizontalAlignment,
        vertical: VerticalAlignment,
    },
    Affine(AffineTransform),
    Time {
        day: u32,
        month: u32,
        year_text: String,
        hour: u32,
        minute: u32,
        second: u32,
    },
    EntryRef {
        device_text: String,
        directory_text: String,
        name: String,
    },
    NodeRef {
        device_text: String,
        node_text: String,
    },
    /// Raw blobs and anything without a dedicated editor.
    Unsupported(TypeCode),
}

/// One open editor: either replacing an existing value or creating a new
/// field. Cancel is simply dropping this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub creating: bool,
    pub name: String,
    pub index: usize,
    pub buffer: EditorBuffer,
}

impl EditorState {
    /// Open an editor on an existing value.
    pub fn for_value(name: &str, index: usize, value: &FieldValue) -> Self {
        Self {
            creating: false,
            name: name.to_string(),
            index,
            buffer: buffer_for(value),
        }
    }

    /// Open an editor for a new field of the given type. The name starts
    /// empty and must be filled in before save.
    pub fn for_new(code: TypeCode) -> Self {
        Self {
            creating: true,
            name: String::new(),
            index: 0,
            buffer: default_buffer(code),
        }
    }

    pub fn type_code(&self) -> TypeCode {
        match &self.buffer {
            EditorBuffer::Bool(_) => TypeCode::Bool,
            EditorBuffer::Integer { code, .. } => *code,
            EditorBuffer::Float(_) => TypeCode::Float,
            EditorBuffer::Double(_) => TypeCode::Double,
            EditorBuffer::Text(_) => TypeCode::String,
            EditorBuffer::Point { .. } => TypeCode::Point,
            EditorBuffer::Rect { .. } => TypeCode::Rect,
            EditorBuffer::Size { .. } => TypeCode::Size,
            EditorBuffer::Color(_) => TypeCode::Color,
            EditorBuffer::Alignment { .. } => TypeCode::Alignment,
            EditorBuffer::Affine(_) => TypeCode::AffineTransform,
            EditorBuffer::Time { .. } => TypeCode::Time,
            EditorBuffer::EntryRef { .. } => TypeCode::EntryRef,
            EditorBuffer::NodeRef { .. } => TypeCode::NodeRef,
            EditorBuffer::Unsupported(code) => *code,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self.buffer, EditorBuffer::Unsupported(_))
    }

    /// Incremental validation, run every frame: clamp numeric fields into
    /// range so the widgets never show an impossible value. Free-text fields
    /// are left alone until save.
    pub fn clamp(&mut self) {
        match &mut self.buffer {
            EditorBuffer::Integer { code, text } => clamp_integer_text(*code, text),
            EditorBuffer::Time {
                day,
                month,
                year_text,
                hour,
                minute,
                second,
            } => {
                *month = (*month).clamp(1, 12);
                let year = year_text.trim().parse::<i32>().unwrap_or(1970);
                *day = (*day).clamp(1, days_in_month(*month, year));
                *hour = (*hour).min(23);
                *minute = (*minute).min(59);
                *second = (*second).min(59);
            }
            _ => {}
        }
    }

    /// Convert the buffer into a concrete value. Fails on empty or
    /// unparseable text input and on unsupported types.
    pub fn build_value(&self) -> anyhow::Result<FieldValue> {
        let value = match &self.buffer {
            EditorBuffer::Bool(v) => FieldValue::Bool(*v),
            EditorBuffer::Integer { code, text } => integer_value(*code, text)?,
            EditorBuffer::Float(v) => FieldValue::Float(*v),
            EditorBuffer::Double(v) => FieldValue::Double(*v),
            EditorBuffer::Text(s) => FieldValue::String(s.clone()),
            EditorBuffer::Point { x, y } => FieldValue::Point(Point { x: *x, y: *y }),
            EditorBuffer::Rect {
                left,
                top,
                right,
                bottom,
            } => FieldValue::Rect(Rect {
                left: *left,
                top: *top,
                right: *right,
                bottom: *bottom,
            }),
            EditorBuffer::Size { width, height } => FieldValue::Size(Size {
                width: *width,
                height: *height,
            }),
            EditorBuffer::Color(c) => FieldValue::Color(*c),
            EditorBuffer::Alignment {
                horizontal,
                vertical,
            } => FieldValue::Alignment(Alignment {
                horizontal: *horizontal,
                vertical: *vertical,
            }),
            EditorBuffer::Affine(t) => FieldValue::AffineTransform(*t),
            EditorBuffer::Time {
                day,
                month,
                year_text,
                hour,
                minute,
                second,
            } => {
                let year: i32 = match year_text.trim().parse() {
                    Ok(y) => y,
                    Err(_) => bail!("year {year_text:?} is not a number"),
                };
                let Some(date) = NaiveDate::from_ymd_opt(year, *month, *day) else {
                    bail!("{year}-{month}-{day} is not a valid date");
                };
                let Some(moment) = date.and_hms_opt(*hour, *minute, *second) else {
                    bail!("{hour}:{minute}:{second} is not a valid time");
                };
                FieldValue::Time(moment.and_utc().timestamp())
            }
            EditorBuffer::EntryRef {
                device_text,
                directory_text,
                name,
            } => FieldValue::EntryRef(EntryRef {
                device: parse_i64("device", device_text)?,
                directory: parse_i64("directory", directory_text)?,
                name: name.clone(),
            }),
            EditorBuffer::NodeRef {
                device_text,
                node_text,
            } => FieldValue::NodeRef(NodeRef {
                device: parse_i64("device", device_text)?,
                node: parse_i64("node", node_text)?,
            }),
            EditorBuffer::Unsupported(code) => {
                bail!("{} values cannot be edited", code.type_name())
            }
        };
        Ok(value)
    }

    /// Write the buffer back into the target message: append a new value in
    /// create mode, replace in place otherwise. Nothing is touched on error.
    pub fn apply(&self, target: &mut ArchiveMessage) -> anyhow::Result<()> {
        if self.creating && self.name.trim().is_empty() {
            bail!("a new field needs a name");
        }
        let value = self.build_value()?;
        if self.creating {
            target.add(self.name.trim(), value)?;
        } else {
            target.replace(&self.name, self.index, value)?;
        }
        Ok(())
    }
}

fn buffer_for(value: &FieldValue) -> EditorBuffer {
    match value {
        FieldValue::Bool(v) => EditorBuffer::Bool(*v),
        FieldValue::Int8(v) => integer_buffer(TypeCode::Int8, v),
        FieldValue::Int16(v) => integer_buffer(TypeCode::Int16, v),
        FieldValue::Int32(v) => integer_buffer(TypeCode::Int32, v),
        FieldValue::Int64(v) => integer_buffer(TypeCode::Int64, v),
        FieldValue::UInt8(v) => integer_buffer(TypeCode::UInt8, v),
        FieldValue::UInt16(v) => integer_buffer(TypeCode::UInt16, v),
        FieldValue::UInt32(v) => integer_buffer(TypeCode::UInt32, v),
        FieldValue::UInt64(v) => integer_buffer(TypeCode::UInt64, v),
        FieldValue::Float(v) => EditorBuffer::Float(*v),
        FieldValue::Double(v) => EditorBuffer::Double(*v),
        FieldValue::String(s) => EditorBuffer::Text(s.clone()),
        FieldValue::Point(p) => EditorBuffer::Point { x: p.x, y: p.y },
        FieldValue::Rect(r) => EditorBuffer::Rect {
            left: r.left,
            top: r.top,
            right: r.right,
            bottom: r.bottom,
        },
        FieldValue::Size(s) => EditorBuffer::Size {
            width: s.width,
            height: s.height,
        },
        FieldValue::Color(c) => EditorBuffer::Color(*c),
        FieldValue::Alignment(a) => EditorBuffer::Alignment {
            horizontal: a.horizontal,
            vertical: a.vertical,
        },
        FieldValue::AffineTransform(t) => EditorBuffer::Affine(*t),
        FieldValue::Time(secs) => time_buffer(*secs),
        FieldValue::EntryRef(r) => EditorBuffer::EntryRef {
            device_text: r.device.to_string(),
            directory_text: r.directory.to_string(),
            name: r.name.clone(),
        },
        FieldValue::NodeRef(r) => EditorBuffer::NodeRef {
            device_text: r.device.to_string(),
            node_text: r.node.to_string(),
        },
        FieldValue::Raw(_) | FieldValue::Message(_) => {
            EditorBuffer::Unsupported(value.type_code())
        }
    }
}

fn default_buffer(code: TypeCode) -> EditorBuffer {
    match code {
        TypeCode::Bool => EditorBuffer::Bool(false),
        TypeCode::Int8
        | TypeCode::Int16
        | TypeCode::Int32
        | TypeCode::Int64
        | TypeCode::UInt8
        | TypeCode::UInt16
        | TypeCode::UInt32
        | TypeCode::UInt64 => EditorBuffer::Integer {
            code,
            text: "0".to_string(),
        },
        TypeCode::Float => EditorBuffer::Float(0.0),
        TypeCode::Double => EditorBuffer::Double(0.0),
        TypeCode::String => EditorBuffer::Text(String::new()),
        TypeCode::Point => EditorBuffer::Point { x: 0.0, y: 0.0 },
        TypeCode::Rect => EditorBuffer::Rect {
            left: 0.0,
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
        },
        TypeCode::Size => EditorBuffer::Size {
            width: 0.0,
            height: 0.0,
        },
        TypeCode::Color => EditorBuffer::Color(Color {
            red: 0,
            green: 0,
            blue: 0,
            alpha: 255,
        }),
        TypeCode::Alignment => EditorBuffer::Alignment {
            horizontal: HorizontalAlignment::Unset,
            vertical: VerticalAlignment::Unset,
        },
        TypeCode::AffineTransform => EditorBuffer::Affine(AffineTransform::default()),
        TypeCode::Time => time_buffer(0),
        TypeCode::EntryRef => EditorBuffer::EntryRef {
            device_text: "0".to_string(),
            directory_text: "0".to_string(),
            name: String::new(),
        },
        TypeCode::NodeRef => EditorBuffer::NodeRef {
            device_text: "0".to_string(),
            node_text: "0".to_string(),
        },
        TypeCode::Raw | TypeCode::Message => EditorBuffer::Unsupported(code),
    }
}

fn integer_buffer(code: TypeCode, value: &impl ToString) -> EditorBuffer {
    EditorBuffer::Integer {
        code,
        text: value.to_string(),
    }
}

fn time_buffer(secs: i64) -> EditorBuffer {
    let dt = DateTime::from_timestamp(secs, 0).unwrap_or_default();
    EditorBuffer::Time {
        day: dt.day(),
        month: dt.month(),
        year_text: dt.year().to_string(),
        hour: dt.hour(),
        minute: dt.minute(),
        second: dt.second(),
    }
}

fn integer_range(code: TypeCode) -> (i128, i128) {
    match code {
        TypeCode::Int8 => (i8::MIN as i128, i8::MAX as i128),
        TypeCode::Int16 => (i16::MIN as i128, i16::MAX as i128),
        TypeCode::Int32 => (i32::MIN as i128, i32::MAX as i128),
        TypeCode::Int64 => (i64::MIN as i128, i64::MAX as i128),
        TypeCode::UInt8 => (0, u8::MAX as i128),
        TypeCode::UInt16 => (0, u16::MAX as i128),
        TypeCode::UInt32 => (0, u32::MAX as i128),
        TypeCode::UInt64 => (0, u64::MAX as i128),
        _ => (0, 0),
    }
}

fn clamp_integer_text(code: TypeCode, text: &mut String) {
    let Ok(parsed) = text.trim().parse::<i128>() else {
        // leave partial input ("", "-") alone; save will reject it
        return;
    };
    let (min, max) = integer_range(code);
    let clamped = parsed.clamp(min, max);
    // rewriting the buffer resets the text cursor, so only do it when the
    // value was actually out of range
    if clamped != parsed {
        *text = clamped.to_string();
    }
}

fn parse_i64(label: &str, text: &str) -> anyhow::Result<i64> {
    text.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{label} {text:?} is not a number"))
}

fn integer_value(code: TypeCode, text: &str) -> anyhow::Result<FieldValue> {
    let parsed: i128 = match text.trim().parse() {
        Ok(v) => v,
        Err(_) => bail!("{text:?} is not an integer"),
    };
    let (min, max) = integer_range(code);
    if parsed < min || parsed > max {
        bail!("{parsed} is out of range for {}", code.type_name());
    }
    Ok(match code {
        TypeCode::Int8 => FieldValue::Int8(parsed as i8),
        TypeCode::Int16 => FieldValue::Int16(parsed as i16),
        TypeCode::Int32 => FieldValue::Int32(parsed as i32),
        TypeCode::Int64 => FieldValue::Int64(parsed as i64),
        TypeCode::UInt8 => FieldValue::UInt8(parsed as u8),
        TypeCode::UInt16 => FieldValue::UInt16(parsed as u16),
        TypeCode::UInt32 => FieldValue::UInt32(parsed as u32),
        TypeCode::UInt64 => FieldValue::UInt64(parsed as u64),
        _ => bail!("{} is not an integer type", code.type_name()),
    })
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(month: u32, year: i32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_bounds_follow_the_leap_rule() {
        assert_eq!(days_in_month(2, 2000), 29);
        assert_eq!(days_in_month(2, 1900), 28);
        assert_eq!(days_in_month(2, 2024), 29);
        assert_eq!(days_in_month(2, 2023), 28);
        assert_eq!(days_in_month(4, 2024), 30);
        assert_eq!(days_in_month(12, 2024), 31);
    }

    #[test]
    fn integer_text_is_clamped_to_the_width() {
        let mut state = EditorState::for_new(TypeCode::UInt8);
        if let EditorBuffer::Integer { text, .. } = &mut state.buffer {
            *text = "300".to_string();
        }
        state.clamp();
        assert_eq!(
            state.buffer,
            EditorBuffer::Integer {
                code: TypeCode::UInt8,
                text: "255".to_string()
            }
        );

        // partial input is left for the user to finish
        if let EditorBuffer::Integer { text, .. } = &mut state.buffer {
            *text = "-".to_string();
        }
        state.clamp();
        assert!(state.build_value().is_err());
    }

    #[test]
    fn in_range_integer_text_is_not_rewritten_while_typing() {
        let mut state = EditorState::for_new(TypeCode::Int32);
        if let EditorBuffer::Integer { text, .. } = &mut state.buffer {
            *text = " 42 ".to_string();
        }
        // whitespace around an in-range value must survive clamping, or the
        // buffer rewrite would yank the text cursor on every frame
        state.clamp();
        assert_eq!(
            state.buffer,
            EditorBuffer::Integer {
                code: TypeCode::Int32,
                text: " 42 ".to_string()
            }
        );
        assert_eq!(state.build_value().unwrap(), FieldValue::Int32(42));
    }

    #[test]
    fn time_buffer_roundtrips_through_civil_fields() {
        // 2000-02-29 12:34:56 UTC
        let secs = 951_827_696;
        let state = EditorState::for_value("when", 0, &FieldValue::Time(secs));
        assert_eq!(state.build_value().unwrap(), FieldValue::Time(secs));
    }

    #[test]
    fn day_is_clamped_when_the_month_shrinks() {
        let mut state = EditorState::for_new(TypeCode::Time);
        if let EditorBuffer::Time {
            day,
            month,
            year_text,
            ..
        } = &mut state.buffer
        {
            *day = 31;
            *month = 2;
            *year_text = "1900".to_string();
        }
        state.clamp();
        if let EditorBuffer::Time { day, .. } = &state.buffer {
            assert_eq!(*day, 28);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn create_mode_requires_a_name() {
        let state = EditorState::for_new(TypeCode::Bool);
        let mut msg = ArchiveMessage::new();
        assert!(state.apply(&mut msg).is_err());
        assert!(msg.is_empty());

        let mut named = state;
        named.name = "flag".to_string();
        named.apply(&mut msg).unwrap();
        assert_eq!(msg.find_bool("flag", 0), Some(false));
    }

    #[test]
    fn edit_mode_replaces_in_place() {
        let mut msg = ArchiveMessage::new();
        msg.add("r", FieldValue::Rect(Rect {
            left: 0.0,
            top: 0.0,
            right: 10.0,
            bottom: 10.0,
        }))
        .unwrap();

        let mut state = EditorState::for_value("r", 0, msg.find("r", 0).unwrap());
        state.buffer = EditorBuffer::Rect {
            left: 1.0,
            top: 1.0,
            right: 20.0,
            bottom: 20.0,
        };
        state.apply(&mut msg).unwrap();
        assert_eq!(
            msg.find("r", 0),
            Some(&FieldValue::Rect(Rect {
                left: 1.0,
                top: 1.0,
                right: 20.0,
                bottom: 20.0,
            }))
        );
    }

    #[test]
    fn unsupported_types_refuse_to_save() {
        let state = EditorState::for_value("blob", 0, &FieldValue::Raw(vec![1, 2, 3]));
        assert!(!state.is_supported());
        assert!(state.build_value().is_err());
    }
}
