//! Permission bits
//!
//! [`Mode`] holds the permission bits of a file resource (`0..=0o7777`,
//! i.e. rwx for user/group/other plus setuid, setgid and sticky).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Highest valid permission value
pub const MAX_MODE: u32 = 0o7777;

/// rw-r--r--, given to new files whose mode is not managed
pub const DEFAULT_FILE_MODE: Mode = Mode(0o644);

/// Validated permission bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode(u32);

impl Mode {
    /// Validate raw permission bits
    ///
    /// # Errors
    /// Returns [`ModeError::OutOfRange`] when bits above `0o7777` are set
    pub const fn new(bits: u32) -> Result<Self, ModeError> {
        if bits > MAX_MODE {
            return Err(ModeError::OutOfRange(bits));
        }
        Ok(Self(bits))
    }

    /// Raw permission bits
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Keep only the permission bits of an `st_mode` value
    #[inline]
    #[must_use]
    pub const fn from_st_mode(st_mode: u32) -> Self {
        Self(st_mode & MAX_MODE)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// Parses octal notation as written in recipes: `644`, `0644`, `0o644`.
impl FromStr for Mode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0o")
            .or_else(|| trimmed.strip_prefix("0O"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(ModeError::Invalid(s.to_string()));
        }
        let bits = u32::from_str_radix(digits, 8).map_err(|_| ModeError::Invalid(s.to_string()))?;
        Self::new(bits)
    }
}

impl serde::Serialize for Mode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Accepts either an octal string (`"644"`) or an integer already holding the
/// bits (`0o644` in TOML, `420` in JSON).
impl<'de> serde::Deserialize<'de> for Mode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ModeVisitor;

        impl serde::de::Visitor<'_> for ModeVisitor {
            type Value = Mode;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("permission bits as an octal string or an integer")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(E::custom)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let bits = u32::try_from(value).map_err(|_| E::custom(ModeError::Invalid(value.to_string())))?;
                Mode::new(bits).map_err(E::custom)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let bits = u32::try_from(value).map_err(|_| E::custom(ModeError::Invalid(value.to_string())))?;
                Mode::new(bits).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ModeVisitor)
    }
}

/// Errors building a [`Mode`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    /// Not octal notation
    #[error("invalid mode '{0}': expected octal digits such as 644 or 0o644")]
    Invalid(String),

    /// Bits outside `0o7777`
    #[error("mode {0:o} out of range (max 7777)")]
    OutOfRange(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_recipe_notations() {
        assert_eq!("644".parse::<Mode>().unwrap().bits(), 0o644);
        assert_eq!("0644".parse::<Mode>().unwrap().bits(), 0o644);
        assert_eq!("0o600".parse::<Mode>().unwrap().bits(), 0o600);
        assert_eq!("4755".parse::<Mode>().unwrap().bits(), 0o4755);
    }

    #[test]
    fn rejects_non_octal_and_out_of_range() {
        assert!(matches!("689".parse::<Mode>(), Err(ModeError::Invalid(_))));
        assert!(matches!("".parse::<Mode>(), Err(ModeError::Invalid(_))));
        assert!(matches!("0o".parse::<Mode>(), Err(ModeError::Invalid(_))));
        assert_eq!("17777".parse::<Mode>(), Err(ModeError::OutOfRange(0o17777)));
    }

    #[test]
    fn strips_file_type_bits() {
        // regular file, rw-r--r--
        assert_eq!(Mode::from_st_mode(0o100_644).bits(), 0o644);
    }

    #[test]
    fn deserializes_string_and_integer() {
        #[derive(serde::Deserialize)]
        struct Holder {
            mode: Mode,
        }

        let from_str: Holder = toml::from_str(r#"mode = "644""#).unwrap();
        assert_eq!(from_str.mode.bits(), 0o644);
        let from_int: Holder = toml::from_str("mode = 0o755").unwrap();
        assert_eq!(from_int.mode.bits(), 0o755);
        let from_json: Holder = serde_json::from_str(r#"{"mode": 420}"#).unwrap();
        assert_eq!(from_json.mode.bits(), 0o644);
        assert!(serde_json::from_str::<Holder>(r#"{"mode": -1}"#).is_err());
    }

    proptest! {
        #[test]
        fn display_round_trips(bits in 0u32..=MAX_MODE) {
            let mode = Mode::new(bits).unwrap();
            prop_assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }

        #[test]
        fn out_of_range_bits_rejected(bits in (MAX_MODE + 1)..u32::MAX) {
            prop_assert!(Mode::new(bits).is_err());
        }
    }
}
