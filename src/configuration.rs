//! Link configuration.
//!
//! Settings are read from `KEY=VALUE` text, one entry per line. Numbers may
//! be decimal or `0x` prefixed hexadecimal. Keys that are not recognised are
//! ignored; missing keys keep their default.
//!
//! ```text
//! PROTOCOL_ID=0x01
//! EMI_ID=0x03
//! MANUFACTURER_CODE=0x0000
//! MAX_REPORTS_PER_RECEIVE=16
//! REJECT_SHORT_REPORTS=false
//! ```

use crate::error::{KnxHidError, Result};
use crate::protocol::constants::{EmiId, ProtocolId, STANDARD_MANUFACTURER_CODE};

/// Default configuration text, equivalent to [`LinkConfig::default`].
pub const CONFIG: &str = r#"
PROTOCOL_ID=0x01
EMI_ID=0x03
MANUFACTURER_CODE=0x0000
MAX_REPORTS_PER_RECEIVE=16
REJECT_SHORT_REPORTS=false
"#;

/// Settings for a [`KnxHidLink`](crate::usb::KnxHidLink).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkConfig {
    /// Protocol written into outgoing transfer headers
    pub protocol_id: ProtocolId,
    /// EMI format written into outgoing transfer headers
    pub emi_id: EmiId,
    /// Manufacturer code for outgoing transfer headers (0 for standard frames)
    pub manufacturer_code: u16,
    /// Upper bound on reports read by one receive call
    pub max_reports_per_receive: usize,
    /// Fail on reports shorter than 64 bytes instead of decoding them
    pub reject_short_reports: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            protocol_id: ProtocolId::KnxTunnel,
            emi_id: EmiId::CommonEmi,
            manufacturer_code: STANDARD_MANUFACTURER_CODE,
            max_reports_per_receive: 16,
            reject_short_reports: false,
        }
    }
}

impl LinkConfig {
    /// Parse `KEY=VALUE` configuration text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a recognised key has a value that
    /// is not a number or boolean, is out of range, or names an unknown
    /// protocol or EMI id.
    ///
    /// # Examples
    ///
    /// ```
    /// use knx_hid::configuration::LinkConfig;
    /// use knx_hid::protocol::EmiId;
    ///
    /// let config = LinkConfig::parse("EMI_ID=0x02\nMAX_REPORTS_PER_RECEIVE=8").unwrap();
    /// assert_eq!(config.emi_id, EmiId::Emi2);
    /// assert_eq!(config.max_reports_per_receive, 8);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(text, "PROTOCOL_ID") {
            let raw = parse_u8(value)?;
            config.protocol_id =
                ProtocolId::from_u8(raw).ok_or_else(|| KnxHidError::unknown_protocol_id(raw))?;
        }
        if let Some(value) = lookup(text, "EMI_ID") {
            let raw = parse_u8(value)?;
            config.emi_id = EmiId::from_u8(raw).ok_or_else(|| KnxHidError::unknown_emi_id(raw))?;
        }
        if let Some(value) = lookup(text, "MANUFACTURER_CODE") {
            config.manufacturer_code =
                u16::try_from(parse_number(value)?).map_err(|_overflow| KnxHidError::invalid_number())?;
        }
        if let Some(value) = lookup(text, "MAX_REPORTS_PER_RECEIVE") {
            let max = usize::try_from(parse_number(value)?)
                .map_err(|_overflow| KnxHidError::invalid_number())?;
            if max == 0 {
                return Err(KnxHidError::invalid_number());
            }
            config.max_reports_per_receive = max;
        }
        if let Some(value) = lookup(text, "REJECT_SHORT_REPORTS") {
            config.reject_short_reports = parse_bool(value)?;
        }

        hid_log!(debug, "link configuration: {:?}", config);
        Ok(config)
    }
}

/// Value of the first `KEY=` line, trimmed.
fn lookup<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(key)?.trim_start().strip_prefix('='))
        .map(str::trim)
}

fn parse_number(value: &str) -> Result<u32> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_parse| KnxHidError::invalid_number())
}

fn parse_u8(value: &str) -> Result<u8> {
    u8::try_from(parse_number(value)?).map_err(|_overflow| KnxHidError::invalid_number())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(KnxHidError::invalid_bool()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_text_matches_default() {
        assert_eq!(LinkConfig::parse(CONFIG).unwrap(), LinkConfig::default());
    }

    #[test]
    fn test_empty_text_is_default() {
        assert_eq!(LinkConfig::parse("").unwrap(), LinkConfig::default());
    }

    #[test]
    fn test_parse_all_keys() {
        let config = LinkConfig::parse(
            "PROTOCOL_ID=15\n  EMI_ID = 0x01\nMANUFACTURER_CODE=0x00C5\nMAX_REPORTS_PER_RECEIVE=5\nREJECT_SHORT_REPORTS=true",
        )
        .unwrap();
        assert_eq!(config.protocol_id, ProtocolId::BusAccessServerFeatureService);
        assert_eq!(config.emi_id, EmiId::Emi1);
        assert_eq!(config.manufacturer_code, 0x00C5);
        assert_eq!(config.max_reports_per_receive, 5);
        assert!(config.reject_short_reports);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = LinkConfig::parse("WIFI_NETWORK=home\nEMI_ID=2").unwrap();
        assert_eq!(config.emi_id, EmiId::Emi2);
    }

    #[test]
    fn test_invalid_number() {
        let err = LinkConfig::parse("MANUFACTURER_CODE=0xZZ").unwrap_err();
        assert!(matches!(&err, KnxHidError::Config(e) if e.is_invalid_number()));

        let err = LinkConfig::parse("MANUFACTURER_CODE=0x10000").unwrap_err();
        assert!(matches!(&err, KnxHidError::Config(e) if e.is_invalid_number()));

        assert!(LinkConfig::parse("MAX_REPORTS_PER_RECEIVE=0").is_err());
        assert!(LinkConfig::parse("PROTOCOL_ID=256").is_err());
    }

    #[test]
    fn test_unknown_ids() {
        let err = LinkConfig::parse("PROTOCOL_ID=0x07").unwrap_err();
        assert!(matches!(&err, KnxHidError::Config(e) if e.is_unknown_id()));

        let err = LinkConfig::parse("EMI_ID=4").unwrap_err();
        assert!(matches!(&err, KnxHidError::Config(e) if e.is_unknown_id()));
    }

    #[test]
    fn test_invalid_bool() {
        let err = LinkConfig::parse("REJECT_SHORT_REPORTS=maybe").unwrap_err();
        assert!(matches!(err, KnxHidError::Config(_)));
    }
}
