//! Frame codec: raw transport frames to [`ImuSample`].
//!
//! Serial frames are one line of six tab separated integers
//! `ax\tay\taz\tgx\tgy\tgz`. Network frames are JSON objects whose `values`
//! array carries at least the three accelerometer axes. Blank frames are not
//! errors, they simply carry no sample.

use serde_json::Value;

use common::constants::{N_ACCEL_AXES, N_AXES};
use common::ImuSample;

use crate::errors::FrameError;

const FIELD_SEPARATOR: char = '\t';
const VALUES: &str = "values";

/// Wire format spoken by a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameFormat {
    /// One line of six tab separated integers.
    TabSeparated,
    /// JSON object with a `values` array, accelerometer only.
    Json,
}

/// Decodes one raw frame. Returns `Ok(None)` for blank frames.
pub fn decode(format: FrameFormat, raw: &str) -> Result<Option<ImuSample>, FrameError> {
    match format {
        FrameFormat::TabSeparated => parse_serial_line(raw),
        FrameFormat::Json => {
            if raw.trim().is_empty() {
                return Ok(None);
            }
            parse_network_message(raw).map(Some)
        }
    }
}

/// Parses `ax\tay\taz\tgx\tgy\tgz`.
///
/// # Errors
/// - `Malformed` if the line does not hold exactly six fields
/// - `NotNumeric` if a field is not a base-10 integer that fits an axis value
pub fn parse_serial_line(raw: &str) -> Result<Option<ImuSample>, FrameError> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() != N_AXES {
        return Err(FrameError::Malformed(format!(
            "expected {} fields, got {}: {:?}",
            N_AXES,
            fields.len(),
            line
        )));
    }

    let axes = fields
        .iter()
        .map(|field| {
            field
                .trim()
                .parse::<i32>()
                .map_err(|_| FrameError::NotNumeric(format!("{:?} in {:?}", field, line)))
        })
        .collect::<Result<Vec<i32>, FrameError>>()?;

    ImuSample::try_from(axes.as_slice())
        .map(Some)
        .map_err(|e| FrameError::Malformed(e.to_string()))
}

/// Parses `{"values":[x, y, z, ...]}`. Gyroscope axes are always zero.
///
/// Integral values are taken as they are, fractional values are rounded to the
/// nearest integer.
///
/// # Errors
/// - `Malformed` if the message is not an object with a `values` array of at least three entries
/// - `NotNumeric` if one of the first three entries is not a number
/// - `OutOfRange` if one of them does not fit an axis value
pub fn parse_network_message(raw: &str) -> Result<ImuSample, FrameError> {
    let message: Value = serde_json::from_str(raw)
        .map_err(|e| FrameError::Malformed(format!("invalid JSON: {}", e)))?;

    let values = message
        .get(VALUES)
        .and_then(|v| v.as_array())
        .ok_or(FrameError::Malformed("missing values array".to_string()))?;

    if values.len() < N_ACCEL_AXES {
        return Err(FrameError::Malformed(format!(
            "expected at least {} values, got {}",
            N_ACCEL_AXES,
            values.len()
        )));
    }

    let mut accel = [0; N_ACCEL_AXES];
    for (axis, value) in accel.iter_mut().zip(values.iter()) {
        *axis = axis_value(value)?;
    }
    Ok(ImuSample::from_accel(accel))
}

fn axis_value(value: &Value) -> Result<i32, FrameError> {
    if let Some(integer) = value.as_i64() {
        return i32::try_from(integer).map_err(|_| FrameError::OutOfRange(integer.to_string()));
    }
    let number = value
        .as_f64()
        .ok_or_else(|| FrameError::NotNumeric(value.to_string()))?;
    let rounded = number.round();
    if !rounded.is_finite() || rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return Err(FrameError::OutOfRange(number.to_string()));
    }
    Ok(rounded as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serial_line() {
        let sample = parse_serial_line("100\t-200\t50\t0\t0\t0").unwrap().unwrap();
        assert_eq!(sample.axes(), [100, -200, 50, 0, 0, 0]);
    }

    #[test]
    fn test_parse_serial_line_zero_padding_and_newline() {
        let sample = parse_serial_line("007\t-0010\t0\t1\t-1\t00\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(sample.axes(), [7, -10, 0, 1, -1, 0]);
    }

    #[test]
    fn test_parse_serial_line_extremes() {
        let line = format!("{}\t{}\t0\t0\t0\t0", i32::MIN, i32::MAX);
        let sample = parse_serial_line(&line).unwrap().unwrap();
        assert_eq!(sample.accel(), [i32::MIN, i32::MAX, 0]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        for line in ["", "   ", "\r\n", "\t \n"] {
            assert_eq!(parse_serial_line(line), Ok(None), "line {:?}", line);
        }
    }

    #[test]
    fn test_wrong_field_count_is_malformed() {
        for line in [
            "1\t2\t3\t4\t5",
            "1\t2\t3\t4\t5\t6\t7",
            "1 2 3 4 5 6",
            "1,2,3,4,5,6",
            "1",
        ] {
            assert!(
                matches!(parse_serial_line(line), Err(FrameError::Malformed(_))),
                "line {:?}",
                line
            );
        }
    }

    #[test]
    fn test_non_integer_field_is_not_numeric() {
        for line in [
            "1\t2\t3\t4\t5\tx",
            "1.5\t2\t3\t4\t5\t6",
            "1\t\t3\t4\t5\t6",
            "1\t2\t3\t4\t5\t99999999999",
        ] {
            assert!(
                matches!(parse_serial_line(line), Err(FrameError::NotNumeric(_))),
                "line {:?}",
                line
            );
        }
    }

    #[test]
    fn test_parse_network_message() {
        let sample = parse_network_message(r#"{"values":[12,34,56]}"#).unwrap();
        assert_eq!(sample.axes(), [12, 34, 56, 0, 0, 0]);
    }

    #[test]
    fn test_network_message_ignores_extra_values() {
        let sample = parse_network_message(r#"{"values":[1,2,3,4,5,6],"accuracy":3}"#).unwrap();
        assert_eq!(sample.axes(), [1, 2, 3, 0, 0, 0]);
    }

    #[test]
    fn test_network_message_rounds_fractions() {
        let sample = parse_network_message(r#"{"values":[0.4,-9.81,9.5]}"#).unwrap();
        assert_eq!(sample.accel(), [0, -10, 10]);
    }

    #[test]
    fn test_network_message_malformed() {
        for raw in [
            "not json",
            "[1,2,3]",
            r#"{"value":[1,2,3]}"#,
            r#"{"values":[1,2]}"#,
            r#"{"values":"1,2,3"}"#,
        ] {
            assert!(
                matches!(parse_network_message(raw), Err(FrameError::Malformed(_))),
                "raw {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_network_message_not_numeric() {
        let result = parse_network_message(r#"{"values":[1,"2",3]}"#);
        assert!(matches!(result, Err(FrameError::NotNumeric(_))));
    }

    #[test]
    fn test_network_message_out_of_range() {
        let result = parse_network_message(r#"{"values":[1,2,3000000000]}"#);
        assert!(matches!(result, Err(FrameError::OutOfRange(_))));
        let result = parse_network_message(r#"{"values":[1e300,2,3]}"#);
        assert!(matches!(result, Err(FrameError::OutOfRange(_))));
    }

    #[test]
    fn test_decode_dispatches_on_format() {
        let serial = decode(FrameFormat::TabSeparated, "1\t2\t3\t4\t5\t6").unwrap();
        assert_eq!(serial.unwrap().axes(), [1, 2, 3, 4, 5, 6]);

        let network = decode(FrameFormat::Json, r#"{"values":[1,2,3]}"#).unwrap();
        assert_eq!(network.unwrap().axes(), [1, 2, 3, 0, 0, 0]);

        assert_eq!(decode(FrameFormat::Json, "  "), Ok(None));
    }
}
