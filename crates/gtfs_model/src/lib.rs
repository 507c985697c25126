use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod codes;
mod container;
mod entity;
mod route_type;

pub use codes::{
    Accessibility, ContinuousPickupDropOff, DirectionId, ExceptionType, LocationType,
    PathwayMode, PaymentMethod, PickupDropOffType, TransferType,
};
pub use container::{Container, EntityRef, Keyed};
pub use entity::{
    Agency, AgencyRef, Attribution, Fare, FareRef, FareRule, Frequency, Level, LevelRef, Pathway,
    Route, RouteRef, Service, ServiceRef, Shape, ShapePoint, ShapeRef, Stop, StopRef, StopTime,
    Transfer, Trip, TripRef,
};
pub use route_type::{RouteCategory, RouteType};

pub use compact_str::CompactString;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GtfsParseError {
    #[error("expected a date in the YYYYMMDD format, found '{0}' instead.")]
    InvalidDateFormat(String),
    #[error("'{0}' is not a valid calendar date.")]
    InvalidDateValue(String),
    #[error("expected a time in HH:MM:SS (or H:MM:SS) format, found '{value}' instead. ({detail})")]
    InvalidTime { value: String, detail: String },
    #[error("expected a 6-character hexadecimal color string, found '{0}' instead.")]
    InvalidColorFormat(String),
    #[error("route type '{0}' not supported.")]
    UnsupportedRouteType(i64),
}

/// A calendar day as written in GTFS files (`YYYYMMDD`).
///
/// The packed integer orders chronologically, so comparisons work without
/// going through a calendar. Values are not checked against the calendar on
/// construction; use [`ServiceDate::to_naive_date`] when a real date is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceDate {
    yyyymmdd: u32,
}

impl ServiceDate {
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        Self {
            yyyymmdd: year as u32 * 10_000 + month as u32 * 100 + day as u32,
        }
    }

    pub fn from_yyyymmdd(yyyymmdd: u32) -> Self {
        Self { yyyymmdd }
    }

    pub fn from_naive_date(date: NaiveDate) -> Self {
        Self::new(date.year() as u16, date.month() as u8, date.day() as u8)
    }

    pub fn parse(value: &str) -> Result<Self, GtfsParseError> {
        let trimmed = value.trim();
        if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GtfsParseError::InvalidDateFormat(value.to_string()));
        }
        let yyyymmdd: u32 = trimmed
            .parse()
            .map_err(|_| GtfsParseError::InvalidDateFormat(value.to_string()))?;
        Ok(Self { yyyymmdd })
    }

    /// Like [`ServiceDate::parse`], but also rejects days that do not exist.
    pub fn parse_checked(value: &str) -> Result<Self, GtfsParseError> {
        let date = Self::parse(value)?;
        if date.to_naive_date().is_none() {
            return Err(GtfsParseError::InvalidDateValue(value.to_string()));
        }
        Ok(date)
    }

    pub fn yyyymmdd(&self) -> u32 {
        self.yyyymmdd
    }

    pub fn year(&self) -> u16 {
        (self.yyyymmdd / 10_000) as u16
    }

    pub fn month(&self) -> u8 {
        (self.yyyymmdd / 100 % 100) as u8
    }

    pub fn day(&self) -> u8 {
        (self.yyyymmdd % 100) as u8
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year() as i32, self.month() as u32, self.day() as u32)
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.to_naive_date().map(|date| date.weekday())
    }

    pub fn checked_add_days(&self, days: u64) -> Option<Self> {
        self.to_naive_date()?
            .checked_add_days(Days::new(days))
            .map(Self::from_naive_date)
    }

    pub fn checked_sub_days(&self, days: u64) -> Option<Self> {
        self.to_naive_date()?
            .checked_sub_days(Days::new(days))
            .map(Self::from_naive_date)
    }
}

impl fmt::Display for ServiceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.yyyymmdd)
    }
}

impl Serialize for ServiceDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ServiceDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ServiceDateVisitor;

        impl<'de> Visitor<'de> for ServiceDateVisitor {
            type Value = ServiceDate;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a GTFS date in YYYYMMDD format")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ServiceDate, E> {
                ServiceDate::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ServiceDateVisitor)
    }
}

/// Time of day relative to the start of the service day.
///
/// Hours may exceed 23 for trips running past midnight. The default value,
/// `00:00:00`, doubles as the decoded form of an empty time cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GtfsTime {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl GtfsTime {
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Self {
        Self {
            hours,
            minutes: minutes % 60,
            seconds: seconds % 60,
        }
    }

    /// Parses `H:MM:SS` or `HH:MM:SS`, tolerating a missing seconds component,
    /// a minute value of 60 and second values of 60 and above (reduced
    /// modulo 60).
    pub fn parse(value: &str) -> Result<Self, GtfsParseError> {
        Self::parse_with(value, false)
    }

    /// Parses `H:MM:SS` or `HH:MM:SS` exactly.
    pub fn parse_strict(value: &str) -> Result<Self, GtfsParseError> {
        Self::parse_with(value, true)
    }

    fn parse_with(value: &str, strict: bool) -> Result<Self, GtfsParseError> {
        let fail = |detail: String| GtfsParseError::InvalidTime {
            value: value.to_string(),
            detail,
        };
        let trimmed = value.trim();
        let mut parts = trimmed.split(':');

        let hour_part = parts.next().unwrap_or("");
        if hour_part.is_empty() || !hour_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(fail("hour value is not a number".to_string()));
        }
        let hours: u64 = hour_part
            .parse()
            .map_err(|_| fail("hour value out of range".to_string()))?;
        if hours > u8::MAX as u64 {
            return Err(fail(format!(
                "only hour-values up to 255 are supported. (read {})",
                hours
            )));
        }

        let minute_part = parts
            .next()
            .ok_or_else(|| fail("missing minute value".to_string()))?;
        let minutes = two_digit_component(minute_part, "minute").map_err(fail)?;

        let seconds = match parts.next() {
            Some(second_part) => two_digit_component(second_part, "second").map_err(fail)?,
            None if strict => return Err(fail("missing second value".to_string())),
            None => 0,
        };

        if parts.next().is_some() {
            return Err(fail("too many components".to_string()));
        }
        let max_minutes = if strict { 59 } else { 60 };
        if minutes > max_minutes {
            return Err(fail(format!(
                "only minute-values up to {} are allowed. (read {})",
                max_minutes, minutes
            )));
        }
        if strict && seconds > 59 {
            return Err(fail(format!(
                "only second-values up to 59 are allowed. (read {})",
                seconds
            )));
        }

        Ok(Self::new(hours as u8, minutes, seconds))
    }

    pub fn from_seconds(total_seconds: u32) -> Self {
        let hours = (total_seconds / 3600).min(u8::MAX as u32) as u8;
        Self {
            hours,
            minutes: (total_seconds % 3600 / 60) as u8,
            seconds: (total_seconds % 60) as u8,
        }
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    pub fn total_seconds(&self) -> u32 {
        self.hours as u32 * 3600 + self.minutes as u32 * 60 + self.seconds as u32
    }
}

fn two_digit_component(part: &str, name: &str) -> Result<u8, String> {
    if !part.bytes().all(|b| b.is_ascii_digit()) || part.is_empty() {
        return Err(format!("{} value is not a number", name));
    }
    match part.len() {
        1 => Err(format!("one-digit {} values are not allowed.", name)),
        2 => part
            .parse()
            .map_err(|_| format!("{} value is not a number", name)),
        _ => Err(format!("{} values must have exactly two digits.", name)),
    }
}

impl fmt::Display for GtfsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

impl Serialize for GtfsTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for GtfsTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GtfsTimeVisitor;

        impl<'de> Visitor<'de> for GtfsTimeVisitor {
            type Value = GtfsTime;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a GTFS time in HH:MM:SS format")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<GtfsTime, E> {
                GtfsTime::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(GtfsTimeVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GtfsColor {
    rgb: u32,
}

impl GtfsColor {
    pub const WHITE: GtfsColor = GtfsColor { rgb: 0xFF_FF_FF };
    pub const BLACK: GtfsColor = GtfsColor { rgb: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            rgb: (r as u32) << 16 | (g as u32) << 8 | (b as u32),
        }
    }

    pub fn from_rgb(rgb: u32) -> Self {
        Self {
            rgb: rgb & 0xFF_FF_FF,
        }
    }

    pub fn parse(value: &str) -> Result<Self, GtfsParseError> {
        let trimmed = value.trim();
        if trimmed.len() != 6 || !trimmed.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(GtfsParseError::InvalidColorFormat(value.to_string()));
        }

        let rgb = u32::from_str_radix(trimmed, 16)
            .map_err(|_| GtfsParseError::InvalidColorFormat(value.to_string()))?;
        Ok(Self { rgb })
    }

    pub fn rgb(&self) -> u32 {
        self.rgb
    }
}

impl fmt::Display for GtfsColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.rgb)
    }
}

impl Serialize for GtfsColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for GtfsColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GtfsColorVisitor;

        impl<'de> Visitor<'de> for GtfsColorVisitor {
            type Value = GtfsColor;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 6-digit GTFS color hex string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<GtfsColor, E> {
                GtfsColor::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(GtfsColorVisitor)
    }
}

/// Weekly operating pattern of a service, one bit per weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ServiceDays(u8);

impl ServiceDays {
    pub const NEVER: ServiceDays = ServiceDays(0);
    pub const MONDAYS: ServiceDays = ServiceDays(1);
    pub const TUESDAYS: ServiceDays = ServiceDays(1 << 1);
    pub const WEDNESDAYS: ServiceDays = ServiceDays(1 << 2);
    pub const THURSDAYS: ServiceDays = ServiceDays(1 << 3);
    pub const FRIDAYS: ServiceDays = ServiceDays(1 << 4);
    pub const SATURDAYS: ServiceDays = ServiceDays(1 << 5);
    pub const SUNDAYS: ServiceDays = ServiceDays(1 << 6);
    pub const WEEKDAYS: ServiceDays = ServiceDays(0b001_1111);
    pub const WEEKENDS: ServiceDays = ServiceDays(0b110_0000);
    pub const ALL_WEEK: ServiceDays = ServiceDays(0b111_1111);

    /// Day flags in calendar.txt column order, Monday first.
    pub fn from_flags(flags: [bool; 7]) -> Self {
        flags
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .fold(Self::NEVER, |days, (index, _)| days | ServiceDays(1 << index))
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL_WEEK.0)
    }

    pub fn for_weekday(weekday: Weekday) -> Self {
        Self(1 << weekday.num_days_from_monday())
    }

    /// The single day bit for `date`, or [`ServiceDays::NEVER`] if the date
    /// does not exist.
    pub fn for_date(date: ServiceDate) -> Self {
        date.weekday().map(Self::for_weekday).unwrap_or(Self::NEVER)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: ServiceDays) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn runs_on(&self, weekday: Weekday) -> bool {
        self.contains(Self::for_weekday(weekday))
    }

    /// Flags in calendar.txt column order, Monday first.
    pub fn flags(&self) -> [bool; 7] {
        let mut flags = [false; 7];
        for (index, flag) in flags.iter_mut().enumerate() {
            *flag = self.0 & (1 << index) != 0;
        }
        flags
    }
}

impl BitOr for ServiceDays {
    type Output = ServiceDays;

    fn bitor(self, rhs: ServiceDays) -> ServiceDays {
        ServiceDays(self.0 | rhs.0)
    }
}

impl BitOrAssign for ServiceDays {
    fn bitor_assign(&mut self, rhs: ServiceDays) {
        self.0 |= rhs.0;
    }
}
