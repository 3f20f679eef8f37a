//! Coercion of raw cell values to declared data types.

use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use xlsform_common::{cell_datetime, cell_text, format_numeric};
use xlsform_model::DataType;

/// A cell value coerced to its field's data type.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDateTime),
    /// Tokens of a `select_multiple` answer.
    Choices(Vec<String>),
}

impl Value {
    /// Text rendering used for `string-length`, `regex` and choice matching.
    pub(crate) fn text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(v) => v.to_string(),
            Value::Decimal(v) => format_numeric(*v),
            Value::Date(dt) if dt.time() == NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
            Value::Date(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::Choices(tokens) => tokens.join(" "),
        }
    }
}

/// Coerce a non-blank cell to a data type, or `None` when it does not fit.
pub(crate) fn coerce(cell: &Data, data_type: DataType) -> Option<Value> {
    match data_type {
        DataType::Text | DataType::SelectOne => {
            let text = cell_text(cell);
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| Value::Text(trimmed.to_string()))
        }
        DataType::Integer => to_integer(cell).map(Value::Integer),
        DataType::Decimal => to_decimal(cell).map(Value::Decimal),
        DataType::Date => to_datetime(cell).map(Value::Date),
        DataType::SelectMultiple => {
            let tokens = split_choices(&cell_text(cell));
            (!tokens.is_empty()).then_some(Value::Choices(tokens))
        }
    }
}

fn to_integer(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(v) => Some(*v),
        Data::Float(v) => float_to_integer(*v),
        Data::String(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                return Some(v);
            }
            // Accept "45.0" and "45.00" but not "45.5".
            let (whole, fraction) = s.split_once('.')?;
            if fraction.is_empty() || !fraction.chars().all(|c| c == '0') {
                return None;
            }
            whole.parse::<i64>().ok()
        }
        _ => None,
    }
}

fn float_to_integer(v: f64) -> Option<i64> {
    if !v.is_finite() || v.fract() != 0.0 || v.abs() > i64::MAX as f64 {
        return None;
    }
    Some(v as i64)
}

fn to_decimal(cell: &Data) -> Option<f64> {
    let value = match cell {
        Data::Int(v) => *v as f64,
        Data::Float(v) => *v,
        Data::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn to_datetime(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(_) => cell_datetime(cell),
        Data::DateTimeIso(s) | Data::String(s) => parse_date_text(s),
        _ => None,
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Parse a date written as text, with an optional `T` or space separated time.
pub(crate) fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let (date_part, time_part) = match text.split_once(['T', ' ']) {
        Some((date, time)) => (date, Some(time.trim())),
        None => (text, None),
    };
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())?;
    let time = match time_part {
        None => NaiveTime::MIN,
        Some(time) => TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(time, format).ok())?,
    };
    Some(date.and_time(time))
}

/// Split a `select_multiple` answer on whitespace and commas.
fn split_choices(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    #[test]
    fn test_integer() {
        assert_eq!(coerce(&Data::Float(45.0), DataType::Integer), Some(Value::Integer(45)));
        assert_eq!(coerce(&s(" 45 "), DataType::Integer), Some(Value::Integer(45)));
        assert_eq!(coerce(&s("45.0"), DataType::Integer), Some(Value::Integer(45)));
        assert_eq!(coerce(&s("-3"), DataType::Integer), Some(Value::Integer(-3)));
        assert_eq!(coerce(&Data::Float(45.5), DataType::Integer), None);
        assert_eq!(coerce(&s("45.5"), DataType::Integer), None);
        assert_eq!(coerce(&s("abc"), DataType::Integer), None);
        assert_eq!(coerce(&s("45."), DataType::Integer), None);
        assert_eq!(coerce(&Data::Bool(true), DataType::Integer), None);
    }

    #[test]
    fn test_decimal() {
        assert_eq!(coerce(&Data::Int(2), DataType::Decimal), Some(Value::Decimal(2.0)));
        assert_eq!(coerce(&s("2.75"), DataType::Decimal), Some(Value::Decimal(2.75)));
        assert_eq!(coerce(&s("NaN"), DataType::Decimal), None);
        assert_eq!(coerce(&s("inf"), DataType::Decimal), None);
        assert_eq!(coerce(&s("two"), DataType::Decimal), None);
    }

    #[test]
    fn test_date_strings() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for text in ["2024-03-09", "2024/03/09", "09/03/2024", "09-03-2024"] {
            assert_eq!(parse_date_text(text), Some(expected), "{text}");
        }
        let with_time = parse_date_text("2024-03-09T14:30:00").unwrap();
        assert_eq!(with_time.format("%H:%M").to_string(), "14:30");
        assert!(parse_date_text("2024-03-09 14:30:00").is_some());
        assert!(parse_date_text("2024-02-30").is_none());
        assert!(parse_date_text("March 9").is_none());
        assert!(coerce(&Data::Float(45_000.0), DataType::Date).is_none());
    }

    #[test]
    fn test_date_cells_follow_workbook_date_system() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};

        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mac = Data::DateTime(ExcelDateTime::new(43_898.0, ExcelDateTimeType::DateTime, true));
        let windows =
            Data::DateTime(ExcelDateTime::new(45_360.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(coerce(&mac, DataType::Date), Some(Value::Date(expected)));
        assert_eq!(coerce(&windows, DataType::Date), Some(Value::Date(expected)));
    }

    #[test]
    fn test_text_and_selects() {
        assert_eq!(
            coerce(&Data::Float(12.0), DataType::Text),
            Some(Value::Text("12".to_string()))
        );
        assert_eq!(
            coerce(&s("fever, rash  cough"), DataType::SelectMultiple),
            Some(Value::Choices(vec![
                "fever".to_string(),
                "rash".to_string(),
                "cough".to_string()
            ]))
        );
        assert_eq!(coerce(&s(" , ,"), DataType::SelectMultiple), None);
    }

    #[test]
    fn test_value_text() {
        assert_eq!(Value::Decimal(1.50).text(), "1.5");
        let date = parse_date_text("2024-01-02").unwrap();
        assert_eq!(Value::Date(date).text(), "2024-01-02");
    }
}
