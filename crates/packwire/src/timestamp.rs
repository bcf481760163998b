//! The predefined MessagePack timestamp extension (type -1).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use packwire_buffers::{Reader, Writer};

use crate::error::{MsgPackError, Result};

/// Extension type id reserved for timestamps.
pub const TIMESTAMP_EXT_TYPE: i8 = -1;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Seconds since the Unix epoch plus a nanosecond adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanoseconds: u32) -> Result<Self> {
        if nanoseconds >= NANOS_PER_SECOND {
            return Err(MsgPackError::InvalidTimestamp);
        }
        Ok(Self {
            seconds,
            nanoseconds,
        })
    }

    /// Encodes the payload in the smallest of the 32, 64 and 96-bit layouts.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::with_sizes(12, 12);
        if self.seconds >= 0 && self.seconds >> 34 == 0 {
            let seconds = self.seconds as u64;
            if self.nanoseconds == 0 && seconds <= u64::from(u32::MAX) {
                writer.u32(seconds as u32);
            } else {
                writer.u64((u64::from(self.nanoseconds) << 34) | seconds);
            }
        } else {
            writer.u32(self.nanoseconds);
            writer.i64(self.seconds);
        }
        writer.flush()
    }

    /// Decodes a 4, 8 or 12 byte timestamp payload.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        match data.len() {
            4 => Self::new(i64::from(reader.u32()?), 0),
            8 => {
                let packed = reader.u64()?;
                let nanoseconds = (packed >> 34) as u32;
                let seconds = (packed & 0x3_ffff_ffff) as i64;
                Self::new(seconds, nanoseconds)
            }
            12 => {
                let nanoseconds = reader.u32()?;
                let seconds = reader.i64()?;
                Self::new(seconds, nanoseconds)
            }
            _ => Err(MsgPackError::InvalidTimestamp),
        }
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self {
                seconds: after.as_secs() as i64,
                nanoseconds: after.subsec_nanos(),
            },
            Err(err) => {
                let before = err.duration();
                let mut seconds = -(before.as_secs() as i64);
                let mut nanoseconds = before.subsec_nanos();
                if nanoseconds > 0 {
                    seconds -= 1;
                    nanoseconds = NANOS_PER_SECOND - nanoseconds;
                }
                Self {
                    seconds,
                    nanoseconds,
                }
            }
        }
    }
}

impl TryFrom<Timestamp> for SystemTime {
    type Error = MsgPackError;

    fn try_from(ts: Timestamp) -> Result<Self> {
        let nanos = Duration::from_nanos(u64::from(ts.nanoseconds));
        let time = if ts.seconds >= 0 {
            UNIX_EPOCH.checked_add(Duration::from_secs(ts.seconds as u64))
        } else {
            UNIX_EPOCH.checked_sub(Duration::from_secs(ts.seconds.unsigned_abs()))
        };
        time.and_then(|t| t.checked_add(nanos))
            .ok_or(MsgPackError::InvalidTimestamp)
    }
}
