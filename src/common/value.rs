use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::common::{RsqlError, RsqlResult};

static DATE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Declared type of a column, or of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrType {
    /// Untyped sentinel, e.g. the NULL literal. Accepted for any column.
    Undefined,
    Chars,
    Ints,
    Floats,
    Booleans,
    Dates,
}

impl AttrType {
    /// Payload size in bytes for fixed width types.
    /// CHARS take their declared length instead.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            AttrType::Ints | AttrType::Floats => Some(8),
            AttrType::Booleans => Some(1),
            AttrType::Dates => Some(4),
            AttrType::Chars | AttrType::Undefined => None,
        }
    }
    fn rank(&self) -> u8 {
        match self {
            AttrType::Undefined => 0,
            AttrType::Chars => 1,
            AttrType::Ints => 2,
            AttrType::Floats => 3,
            AttrType::Booleans => 4,
            AttrType::Dates => 5,
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttrType::Undefined => "undefined",
            AttrType::Chars => "chars",
            AttrType::Ints => "ints",
            AttrType::Floats => "floats",
            AttrType::Booleans => "booleans",
            AttrType::Dates => "dates",
        };
        f.write_str(name)
    }
}

/// A typed scalar. `Undefined` doubles as SQL NULL once it reaches a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Undefined,
    Int(i64),
    Float(f64),
    Chars(String),
    Boolean(bool),
    /// Packed as year * 10000 + month * 100 + day.
    Date(i32),
}

impl Value {
    pub fn attr_type(&self) -> AttrType {
        match self {
            Value::Undefined => AttrType::Undefined,
            Value::Int(_) => AttrType::Ints,
            Value::Float(_) => AttrType::Floats,
            Value::Chars(_) => AttrType::Chars,
            Value::Boolean(_) => AttrType::Booleans,
            Value::Date(_) => AttrType::Dates,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Three-way comparison used by the executor and the indexes.
    /// NULL sorts first, values of different types are ordered by type.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Chars(a), Value::Chars(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => self.attr_type().rank().cmp(&other.attr_type().rank()),
        }
    }

    /// Build a date, rejecting days that do not exist in the calendar.
    pub fn date(year: i32, month: u32, day: u32) -> RsqlResult<Value> {
        if !(1..=9999).contains(&year) || NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(RsqlError::InvalidDate(format!("{year}-{month}-{day}")));
        }
        Ok(Value::Date(year * 10000 + month as i32 * 100 + day as i32))
    }

    /// Parse `YYYY-M-D` text into a date value. Only ASCII digits are accepted.
    pub fn parse_date(s: &str) -> RsqlResult<Value> {
        let date_re = DATE_REGEX.get_or_init(|| {
            Regex::new(r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})$").expect("valid date regex")
        });
        let Some(caps) = date_re.captures(s.trim()) else {
            return Err(RsqlError::InvalidDate(s.to_string()));
        };
        let year = caps[1].parse::<i32>().map_err(|_| RsqlError::InvalidDate(s.to_string()))?;
        let month = caps[2].parse::<u32>().map_err(|_| RsqlError::InvalidDate(s.to_string()))?;
        let day = caps[3].parse::<u32>().map_err(|_| RsqlError::InvalidDate(s.to_string()))?;
        Value::date(year, month, day)
    }

    /// Coerce a literal to the type of the field it is compared with or stored into.
    /// Only text headed for a DATES field changes, everything else is returned as is.
    pub fn cast_for(&self, target: AttrType) -> RsqlResult<Value> {
        match (self, target) {
            (Value::Chars(s), AttrType::Dates) => Value::parse_date(s),
            _ => Ok(self.clone()),
        }
    }

    /// Serialize the value into a field payload of exactly `buf.len()` bytes.
    /// NULL is not encoded here, the record keeps a separate tag for it.
    pub(crate) fn write_payload(&self, buf: &mut [u8]) -> RsqlResult<()> {
        match self {
            Value::Int(v) => write_fixed(buf, &v.to_le_bytes())?,
            Value::Float(v) => write_fixed(buf, &v.to_le_bytes())?,
            Value::Boolean(v) => write_fixed(buf, &[if *v { 1 } else { 0 }])?,
            Value::Date(v) => write_fixed(buf, &v.to_le_bytes())?,
            Value::Chars(s) => {
                // zero bytes pad the field, a value cannot carry one
                if s.contains('\0') {
                    return Err(RsqlError::StorageError(format!(
                        "Chars value {:?} contains a NUL byte",
                        s
                    )));
                }
                if s.len() > buf.len() {
                    return Err(RsqlError::StorageError(format!(
                        "Chars value of {} bytes exceeds field length {}",
                        s.len(),
                        buf.len()
                    )));
                }
                buf.fill(0);
                buf[..s.len()].copy_from_slice(s.as_bytes());
            }
            Value::Undefined => {
                return Err(RsqlError::StorageError("Undefined value has no payload".to_string()));
            }
        }
        Ok(())
    }

    pub(crate) fn read_payload(attr_type: AttrType, buf: &[u8]) -> RsqlResult<Value> {
        match attr_type {
            AttrType::Ints => Ok(Value::Int(i64::from_le_bytes(fixed_bytes(attr_type, buf)?))),
            AttrType::Floats => Ok(Value::Float(f64::from_le_bytes(fixed_bytes(attr_type, buf)?))),
            AttrType::Dates => Ok(Value::Date(i32::from_le_bytes(fixed_bytes(attr_type, buf)?))),
            AttrType::Booleans => match fixed_bytes::<1>(attr_type, buf)?[0] {
                0 => Ok(Value::Boolean(false)),
                1 => Ok(Value::Boolean(true)),
                b => Err(RsqlError::StorageError(format!("Invalid byte {b} for booleans"))),
            },
            AttrType::Chars => {
                // truncate trailing zeros
                let value = String::from_utf8(buf.to_vec())
                    .map_err(|e| RsqlError::StorageError(e.to_string()))?
                    .trim_end_matches('\0')
                    .to_string();
                Ok(Value::Chars(value))
            }
            AttrType::Undefined => Ok(Value::Undefined),
        }
    }
}

fn write_fixed(buf: &mut [u8], bytes: &[u8]) -> RsqlResult<()> {
    if buf.len() != bytes.len() {
        return Err(RsqlError::StorageError(format!(
            "Payload of {} bytes does not fit field length {}",
            bytes.len(),
            buf.len()
        )));
    }
    buf.copy_from_slice(bytes);
    Ok(())
}

fn fixed_bytes<const N: usize>(attr_type: AttrType, buf: &[u8]) -> RsqlResult<[u8; N]> {
    buf.get(..N)
        .and_then(|b| <[u8; N]>::try_from(b).ok())
        .ok_or_else(|| {
            RsqlError::StorageError(format!(
                "Invalid payload length {} for {}",
                buf.len(),
                attr_type
            ))
        })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attr_type().rank().hash(state);
        match self {
            Value::Undefined => {}
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Chars(v) => v.hash(state),
            Value::Boolean(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("NULL"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Chars(v) => f.write_str(v),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{}-{:02}-{:02}", v / 10000, v % 10000 / 100, v % 100),
        }
    }
}
