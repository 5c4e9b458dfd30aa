//! Resolution strings as they appear in limit tables and requests

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid resolution '{0}': expected WIDTHxHEIGHT or one of 720p, 1080p, 1440p, 4k, 8k")]
pub struct ParseResolutionError(pub String);

/// Pixel dimensions, parsed from `WxH` or a named preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are within `max`
    pub const fn fits_within(self, max: Self) -> bool {
        self.width <= max.width && self.height <= max.height
    }

    fn preset(name: &str) -> Option<Self> {
        match name {
            "720p" => Some(Self::new(1280, 720)),
            "1080p" => Some(Self::new(1920, 1080)),
            "1440p" => Some(Self::new(2560, 1440)),
            "4k" | "2160p" => Some(Self::new(3840, 2160)),
            "8k" | "4320p" => Some(Self::new(7680, 4320)),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ParseResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if let Some(preset) = Self::preset(&normalized) {
            return Ok(preset);
        }

        let invalid = || ParseResolutionError(s.to_string());
        let (width, height) = normalized.split_once('x').ok_or_else(invalid)?;
        let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = height.trim().parse::<u32>().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(
            "1024x1024".parse::<Resolution>().unwrap(),
            Resolution::new(1024, 1024)
        );
        assert_eq!(
            " 1920X1080 ".parse::<Resolution>().unwrap(),
            Resolution::new(1920, 1080)
        );
    }

    #[test]
    fn test_parse_presets() {
        assert_eq!("720p".parse::<Resolution>().unwrap(), Resolution::new(1280, 720));
        assert_eq!("1080P".parse::<Resolution>().unwrap(), Resolution::new(1920, 1080));
        assert_eq!("1440p".parse::<Resolution>().unwrap(), Resolution::new(2560, 1440));
        assert_eq!("4K".parse::<Resolution>().unwrap(), Resolution::new(3840, 2160));
        assert_eq!("8k".parse::<Resolution>().unwrap(), Resolution::new(7680, 4320));
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["", "1024", "x768", "1024x", "0x10", "big", "1024x-1"] {
            assert!(bad.parse::<Resolution>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_fits_within() {
        let max = Resolution::new(1024, 1024);
        assert!(Resolution::new(512, 1024).fits_within(max));
        assert!(!Resolution::new(1025, 10).fits_within(max));
        assert_eq!(Resolution::new(1920, 1080).to_string(), "1920x1080");
    }
}
