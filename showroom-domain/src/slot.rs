//! Slot-time normalisation. A slot is identified by `(showroom_id, slot_time)`
//! where `slot_time` is UTC with seconds and sub-seconds discarded.

use chrono::{DateTime, TimeZone, Timelike, Utc};

use crate::error::{BookingError, BookingResult};

/// Convert to UTC and truncate to the minute.
pub fn normalize<Tz: TimeZone>(slot_time: DateTime<Tz>) -> DateTime<Utc> {
    let utc = slot_time.with_timezone(&Utc);
    // zero is always a valid second and nanosecond
    utc.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(utc)
}

/// Parse an RFC 3339 timestamp (e.g. `2026-03-01T10:15:00+02:00`) into a
/// normalised slot time.
pub fn parse(raw: &str) -> BookingResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(normalize)
        .map_err(|e| BookingError::InvalidSlotTime(format!("{raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_normalize_converts_offset_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2026, 5, 10, 12, 30, 45).unwrap();

        assert_eq!(normalize(local), Utc.with_ymd_and_hms(2026, 5, 10, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_normalize_drops_sub_seconds() {
        let t = Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 59).unwrap()
            + chrono::Duration::milliseconds(999);

        let slot = normalize(t);
        assert_eq!(slot, Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap());
        assert_eq!(slot.nanosecond(), 0);
    }

    #[test]
    fn test_same_minute_maps_to_same_slot() {
        let a = parse("2026-05-10T09:00:05Z").unwrap();
        let b = parse("2026-05-10T11:00:50.250+02:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse("next tuesday").unwrap_err();
        assert!(matches!(err, BookingError::InvalidSlotTime(_)));

        // no offset
        assert!(parse("2026-05-10T09:00:00").is_err());
    }
}
