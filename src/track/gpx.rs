use std::fs;
use std::path::Path;

use chrono::DateTime;
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{Sample, Track};
use crate::TelesyncError;

#[derive(Clone, Copy, Debug, PartialEq)]
enum TrackPointField {
    Elevation,
    Time,
    Speed,
}

#[derive(Default)]
struct PendingPoint {
    lat: Option<f64>,
    lon: Option<f64>,
    elevation: Option<f64>,
    timestamp_ms: Option<f64>,
    speed: Option<f64>,
}

impl PendingPoint {
    fn from_start(e: &BytesStart) -> Self {
        let mut point = PendingPoint::default();
        for a in e.attributes().flatten() {
            let value = std::str::from_utf8(&a.value)
                .ok()
                .and_then(|x| x.trim().parse::<f64>().ok());
            match a.key.local_name().as_ref() {
                b"lat" => point.lat = value,
                b"lon" => point.lon = value,
                _ => {}
            }
        }
        point
    }

    fn set(&mut self, field: TrackPointField, text: &str) {
        let text = text.trim();
        match field {
            TrackPointField::Elevation => self.elevation = text.parse::<f64>().ok(),
            TrackPointField::Speed => self.speed = text.parse::<f64>().ok(),
            TrackPointField::Time => self.timestamp_ms = parse_timestamp_ms(text),
        }
    }
}

/// RFC 3339 timestamps as written by GPS devices, `Z` or explicit offset.
pub fn parse_timestamp_ms(text: &str) -> Option<f64> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.timestamp_millis() as f64)
}

/// Every `trkpt` of every track and segment, in document order. Points
/// without a usable time are dropped; points with bad coordinates are kept as
/// invalid samples.
pub fn parse_gpx_samples(s: &str) -> Result<Vec<Sample>, TelesyncError> {
    let mut reader = Reader::from_str(s);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut samples = Vec::new();
    let mut pending: Option<PendingPoint> = None;
    let mut field: Option<TrackPointField> = None;
    let mut untimed = 0usize;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| TelesyncError::GpxParseError { source: e })?
        {
            Event::Eof => break,
            Event::Start(e) => match e.local_name().as_ref() {
                b"trkpt" => pending = Some(PendingPoint::from_start(&e)),
                b"ele" if pending.is_some() => field = Some(TrackPointField::Elevation),
                b"time" if pending.is_some() => field = Some(TrackPointField::Time),
                b"speed" if pending.is_some() => field = Some(TrackPointField::Speed),
                _ => {}
            },
            // a self-closing trkpt has no time and cannot be placed on the timeline
            Event::Empty(e) if e.local_name().as_ref() == b"trkpt" => untimed += 1,
            Event::Text(t) => {
                if let (Some(point), Some(f)) = (pending.as_mut(), field) {
                    let text = t
                        .unescape()
                        .map_err(|e| TelesyncError::GpxParseError { source: e })?;
                    point.set(f, &text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let Some(point) = pending.take() {
                        match point.timestamp_ms {
                            Some(timestamp_ms) => samples.push(Sample::from_raw(
                                timestamp_ms,
                                point.lat,
                                point.lon,
                                point.elevation,
                                point.speed,
                            )),
                            None => untimed += 1,
                        }
                    }
                    field = None;
                }
                b"ele" | b"time" | b"speed" => field = None,
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    if untimed > 0 {
        debug!("Skipped {} GPX track points without a usable time", untimed);
    }
    debug!("Parsed {} GPX track points", samples.len());
    Ok(samples)
}

pub fn parse_gpx_from_str(s: &str) -> Result<Track, TelesyncError> {
    let samples = parse_gpx_samples(s)?;
    if samples.is_empty() {
        return Err(TelesyncError::MalformedTrack {
            reason: "no timed track points found in GPX data".to_string(),
        });
    }
    Track::load(samples)
}

pub fn parse_gpx_file<P: AsRef<Path>>(path: P) -> Result<Track, TelesyncError> {
    let s = fs::read_to_string(path).map_err(|e| TelesyncError::TrackIoError { source: e })?;
    parse_gpx_from_str(&s)
}
