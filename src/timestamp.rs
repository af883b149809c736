//! Generation ids.
//!
//! New ids look like `19-01-2026_21-15-31` (local wall-clock time, second
//! resolution). Archives written by older versions also contain epoch
//! milliseconds (`1768832131910`) and ISO-8601 strings with `:` and `.`
//! swapped for `-` (`2026-01-19T21-15-31-910Z`). None of these sort
//! correctly as plain strings, so history ordering always goes through
//! [`TimestampCodec::decode`].

use std::cmp::Ordering;
use std::fmt;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike, Utc,
};

const FILE_PREFIX: &str = "config-";
const FILE_SUFFIX: &str = ".json";
const CANONICAL_FORMAT: &str = "%d-%m-%Y_%H-%M-%S";

const MONTHS_ID: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// Identifier of an archived snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationId(String);

impl GenerationId {
    /// Accepts a bare id or an archive file name (`config-<id>.json`).
    /// Returns `None` for anything that could escape the archive directory.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let bare = input.strip_prefix(FILE_PREFIX).unwrap_or(input);
        let bare = bare.strip_suffix(FILE_SUFFIX).unwrap_or(bare);

        if bare.is_empty()
            || bare.contains(['/', '\\'])
            || bare.contains("..")
            || bare.chars().any(char::is_control)
        {
            return None;
        }
        Some(GenerationId(bare.to_string()))
    }

    /// Recovers the id from an archive file name; other files yield `None`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let bare = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
        GenerationId::parse(bare)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{FILE_PREFIX}{}{FILE_SUFFIX}", self.0)
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The id formats that have been written over time, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFormat {
    /// `DD-MM-YYYY_HH-mm-ss`, seconds optional, local time.
    Canonical,
    /// Ten or more digits of milliseconds since the epoch.
    EpochMillis,
    /// `YYYY-MM-DDTHH-mm-ss-fffZ`, seconds and millis optional, UTC.
    LegacyIso,
}

impl IdFormat {
    pub const ALL: [IdFormat; 3] = [IdFormat::Canonical, IdFormat::EpochMillis, IdFormat::LegacyIso];
}

/// Decoded instant of an id. `None` sorts before every real instant, so
/// undecodable ids land at the end of a newest-first listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decoded {
    pub instant: Option<DateTime<Utc>>,
}

impl Decoded {
    pub const OLDEST: Decoded = Decoded { instant: None };

    pub fn is_recognized(&self) -> bool {
        self.instant.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
enum Zone {
    Local,
    Fixed(FixedOffset),
}

/// Mints, decodes and displays generation ids in one time zone.
#[derive(Debug, Clone, Copy)]
pub struct TimestampCodec {
    zone: Zone,
}

impl Default for TimestampCodec {
    fn default() -> Self {
        TimestampCodec::local()
    }
}

impl TimestampCodec {
    /// Uses the host's local time zone, like the ids written by hand-run servers.
    pub fn local() -> Self {
        TimestampCodec { zone: Zone::Local }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        TimestampCodec { zone: Zone::Fixed(offset) }
    }

    fn to_wall(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self.zone {
            Zone::Local => instant.with_timezone(&Local).naive_local(),
            Zone::Fixed(offset) => instant.with_timezone(&offset).naive_local(),
        }
    }

    fn from_wall(&self, wall: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.zone {
            Zone::Local => Local
                .from_local_datetime(&wall)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::Fixed(offset) => offset
                .from_local_datetime(&wall)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Id for `now`.
    pub fn mint(&self, now: DateTime<Utc>) -> GenerationId {
        GenerationId(self.to_wall(now).format(CANONICAL_FORMAT).to_string())
    }

    /// Id for `now`, pushed forward so it decodes strictly after `latest`.
    pub fn mint_after(&self, now: DateTime<Utc>, latest: Option<DateTime<Utc>>) -> GenerationId {
        let now = truncate_seconds(now);
        let candidate = match latest.map(truncate_seconds) {
            Some(latest) if latest >= now => latest + Duration::seconds(1),
            _ => now,
        };
        self.mint(candidate)
    }

    pub fn decode(&self, raw: &str) -> Decoded {
        let instant = IdFormat::ALL
            .iter()
            .find_map(|format| self.decode_as(*format, raw));
        Decoded { instant }
    }

    /// Tries a single format.
    pub fn decode_as(&self, format: IdFormat, raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        match format {
            IdFormat::Canonical => parse_canonical(raw).and_then(|wall| self.from_wall(wall)),
            IdFormat::EpochMillis => parse_epoch_millis(raw),
            IdFormat::LegacyIso => parse_legacy_iso(raw),
        }
    }

    /// Newest first; equal instants fall back to the raw id text.
    pub fn compare_desc(&self, a: &str, b: &str) -> Ordering {
        self.decode(b)
            .cmp(&self.decode(a))
            .then_with(|| a.cmp(b))
    }

    /// `19 Januari 2026 21.15`, or the raw id with `_` as a space.
    pub fn display(&self, raw: &str) -> String {
        match self.decode(raw).instant {
            Some(instant) => long_date(self.to_wall(instant), false),
            None => raw.replace('_', " "),
        }
    }

    /// `19 Januari 2026 21.15.31`, used for audit lines.
    pub fn display_instant(&self, instant: DateTime<Utc>) -> String {
        long_date(self.to_wall(instant), true)
    }
}

fn truncate_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.with_nanosecond(0).unwrap_or(instant)
}

fn long_date(wall: NaiveDateTime, seconds: bool) -> String {
    let month = MONTHS_ID[wall.month0() as usize];
    let time = if seconds {
        format!("{:02}.{:02}.{:02}", wall.hour(), wall.minute(), wall.second())
    } else {
        format!("{:02}.{:02}", wall.hour(), wall.minute())
    };
    format!("{} {month} {} {time}", wall.day(), wall.year())
}

fn numbers<const N: usize>(parts: &[&str]) -> Option<[u32; N]> {
    let mut out = [0u32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    Some(out)
}

// hh-mm with optional seconds and millis
fn time_of_day(parts: &[&str]) -> Option<NaiveTime> {
    match parts.len() {
        2 => {
            let [h, m] = numbers::<2>(parts)?;
            NaiveTime::from_hms_opt(h, m, 0)
        }
        3 => {
            let [h, m, s] = numbers::<3>(parts)?;
            NaiveTime::from_hms_opt(h, m, s)
        }
        4 => {
            let [h, m, s, ms] = numbers::<4>(parts)?;
            NaiveTime::from_hms_milli_opt(h, m, s, ms)
        }
        _ => None,
    }
}

fn parse_canonical(raw: &str) -> Option<NaiveDateTime> {
    let (dmy, hms) = raw.split_once('_')?;
    let date: Vec<&str> = dmy.split('-').collect();
    if date.len() != 3 {
        return None;
    }
    let [d, m, y] = numbers::<3>(&date)?;
    let date = NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, m, d)?;

    let time: Vec<&str> = hms.split('-').collect();
    if time.len() > 3 {
        return None;
    }
    Some(date.and_time(time_of_day(&time)?))
}

fn parse_epoch_millis(raw: &str) -> Option<DateTime<Utc>> {
    if raw.len() < 10 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis: i64 = raw.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

fn parse_legacy_iso(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.strip_suffix(['Z', 'z']).unwrap_or(raw);
    let (ymd, hms) = raw.split_once(['T', 't'])?;

    let date: Vec<&str> = ymd.split('-').collect();
    if date.len() != 3 {
        return None;
    }
    let [y, m, d] = numbers::<3>(&date)?;
    let date = NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, m, d)?;

    let time: Vec<&str> = hms.split('-').collect();
    Some(date.and_time(time_of_day(&time)?).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_codec() -> TimestampCodec {
        TimestampCodec::with_offset(FixedOffset::east_opt(0).unwrap())
    }

    fn jakarta() -> TimestampCodec {
        TimestampCodec::with_offset(FixedOffset::east_opt(7 * 3600).unwrap())
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn decodes_all_three_formats() {
        let codec = utc_codec();
        let canonical = codec.decode("19-01-2026_21-15-31").instant.unwrap();
        let millis = codec.decode("1768857331910").instant.unwrap();
        let iso = codec.decode("2026-01-19T21-15-31-910Z").instant.unwrap();

        assert_eq!(canonical, at(2026, 1, 19, 21, 15, 31));
        assert_eq!(millis.timestamp_millis(), 1_768_857_331_910);
        assert_eq!(iso, at(2026, 1, 19, 21, 15, 31) + Duration::milliseconds(910));
        assert!(canonical < iso);
    }

    #[test]
    fn each_strategy_is_independent() {
        let codec = utc_codec();
        assert!(codec.decode_as(IdFormat::Canonical, "19-01-2026_21-15-31").is_some());
        assert!(codec.decode_as(IdFormat::EpochMillis, "19-01-2026_21-15-31").is_none());
        assert!(codec.decode_as(IdFormat::EpochMillis, "1768857331910").is_some());
        assert!(codec.decode_as(IdFormat::LegacyIso, "1768857331910").is_none());
        assert!(codec.decode_as(IdFormat::LegacyIso, "2026-01-19T21-15-31-910Z").is_some());
        assert!(codec.decode_as(IdFormat::Canonical, "2026-01-19T21-15-31-910Z").is_none());
    }

    #[test]
    fn missing_seconds_default_to_zero() {
        let codec = utc_codec();
        assert_eq!(codec.decode("19-01-2026_21-15").instant, Some(at(2026, 1, 19, 21, 15, 0)));
        assert_eq!(codec.decode("2026-01-19T21-15Z").instant, Some(at(2026, 1, 19, 21, 15, 0)));
    }

    #[test]
    fn canonical_is_local_wall_time() {
        let decoded = jakarta().decode("19-01-2026_21-15-31").instant.unwrap();
        assert_eq!(decoded, at(2026, 1, 19, 14, 15, 31));
    }

    #[test]
    fn garbage_decodes_to_oldest() {
        let codec = utc_codec();
        for raw in ["", "latest", "99-99-2026_10-00-00", "12345", "2026-01-19", "a_b", "19-01-2026_21-15-31-00-00"] {
            assert_eq!(codec.decode(raw), Decoded::OLDEST, "{raw}");
        }
        assert!(Decoded::OLDEST < codec.decode("1000000000000"));
    }

    #[test]
    fn mint_uses_canonical_format() {
        let id = jakarta().mint(at(2026, 1, 19, 14, 15, 31));
        assert_eq!(id.as_str(), "19-01-2026_21-15-31");
        assert_eq!(id.file_name(), "config-19-01-2026_21-15-31.json");
    }

    #[test]
    fn mint_after_moves_past_latest() {
        let codec = utc_codec();
        let now = at(2026, 1, 19, 21, 15, 31) + Duration::milliseconds(400);

        let same_second = codec.mint_after(now, Some(at(2026, 1, 19, 21, 15, 31)));
        assert_eq!(same_second.as_str(), "19-01-2026_21-15-32");

        let clock_behind = codec.mint_after(now, Some(at(2026, 1, 19, 22, 0, 0)));
        assert_eq!(clock_behind.as_str(), "19-01-2026_22-00-01");

        let fresh = codec.mint_after(now, Some(at(2026, 1, 19, 21, 15, 30)));
        assert_eq!(fresh.as_str(), "19-01-2026_21-15-31");
        assert_eq!(codec.mint_after(now, None).as_str(), "19-01-2026_21-15-31");
    }

    #[test]
    fn descending_order_across_formats() {
        let codec = utc_codec();
        let mut ids = vec![
            "garbage",
            "1704067200000",             // 2024-01-01
            "19-01-2026_21-15-31",
            "2025-06-01T08-00-00-000Z",
            "01-02-2026_00-00-00",
        ];
        ids.sort_by(|a, b| codec.compare_desc(a, b));
        assert_eq!(ids, vec![
            "01-02-2026_00-00-00",
            "19-01-2026_21-15-31",
            "2025-06-01T08-00-00-000Z",
            "1704067200000",
            "garbage",
        ]);
    }

    #[test]
    fn equal_instants_break_ties_lexically() {
        let codec = utc_codec();
        assert_eq!(codec.compare_desc("19-01-2026_21-15-31", "2026-01-19T21-15-31Z"), Ordering::Less);
        assert_eq!(codec.compare_desc("bbb", "aaa"), Ordering::Greater);
    }

    #[test]
    fn display_is_readable() {
        let codec = utc_codec();
        assert_eq!(codec.display("19-01-2026_21-15-31"), "19 Januari 2026 21.15");
        assert_eq!(codec.display("not_an_id"), "not an id");
        assert_eq!(codec.display_instant(at(2026, 8, 5, 7, 3, 9)), "5 Agustus 2026 07.03.09");
    }

    #[test]
    fn parse_accepts_file_names_and_rejects_paths() {
        assert_eq!(
            GenerationId::parse("config-19-01-2026_21-15-31.json").unwrap().as_str(),
            "19-01-2026_21-15-31"
        );
        assert_eq!(GenerationId::parse("1768857331910").unwrap().as_str(), "1768857331910");
        assert!(GenerationId::parse("../etc/passwd").is_none());
        assert!(GenerationId::parse("a/b").is_none());
        assert!(GenerationId::parse("").is_none());
    }

    #[test]
    fn from_file_name_ignores_foreign_files() {
        assert!(GenerationId::from_file_name("config-1768857331910.json").is_some());
        assert!(GenerationId::from_file_name("current.json").is_none());
        assert!(GenerationId::from_file_name("config-x.txt").is_none());
    }
}
