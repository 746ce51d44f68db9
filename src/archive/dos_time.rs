//! Packed legacy date/time codec.
//!
//! ZIP-family containers stamp entries with a packed 32-bit value: date
//! field in the high half, time in the low half. Field widths, from the
//! top: 7-bit year offset from 1980, 4-bit month, 5-bit day, 5-bit hour,
//! 6-bit minute, 5-bit half-seconds. The format cannot represent odd
//! seconds, sub-second precision, or years outside [1980, 2107].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Epoch floor of the packed format; earlier years are unrepresentable
pub const DOS_EPOCH_YEAR: i32 = 1980;

/// Decode a packed date/time value into a calendar timestamp.
///
/// Total over all inputs: field combinations that name no real calendar
/// date or time (month 0, day 30 in February, hour 25, ...) clamp to the
/// 1980-01-01 00:00:00 epoch floor instead of failing.
pub fn dos_to_datetime(packed: u32) -> NaiveDateTime {
    let year = ((packed >> 25) & 0x7f) as i32 + DOS_EPOCH_YEAR;
    let month = (packed >> 21) & 0x0f;
    let day = (packed >> 16) & 0x1f;
    let hour = (packed >> 11) & 0x1f;
    let minute = (packed >> 5) & 0x3f;
    let second = (packed & 0x1f) * 2;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .unwrap_or_else(epoch_floor)
}

/// Encode a calendar timestamp into the packed date/time value.
///
/// Timestamps before 1980 (the Unix epoch "no time" value included)
/// return `0`, the format's "unset" stamp; downstream consumers rely on
/// that value, so this is policy rather than an error. Odd seconds round
/// down and sub-second precision is dropped, both intrinsic to the
/// format. Years past 2107 wrap into the 7-bit year field.
pub fn datetime_to_dos(timestamp: NaiveDateTime) -> u32 {
    if timestamp.year() < DOS_EPOCH_YEAR {
        return 0;
    }

    let date = (((timestamp.year() - DOS_EPOCH_YEAR) as u32 & 0x7f) << 9)
        | (timestamp.month() << 5)
        | timestamp.day();
    let time =
        (timestamp.hour() << 11) | (timestamp.minute() << 5) | (timestamp.second() / 2);

    (date << 16) | time
}

fn epoch_floor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(DOS_EPOCH_YEAR, 1, 1)
        .unwrap_or_default()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
}
