/*
 * culture.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Locale data used when formatting numbers and dates.
//!
//! A [`FormatProvider`] supplies the separators, symbols, patterns and names
//! the formatter needs. [`Culture`] is the built-in provider, with data for
//! the invariant culture, `en` (`en-US`) and `ru` (`ru-RU`). Hosts that need
//! another locale can deserialize a [`Culture`] from their own configuration
//! or implement the trait directly.

use serde::{Deserialize, Serialize};

/// Source of locale-sensitive formatting data.
pub trait FormatProvider: Send + Sync {
    /// Culture name, e.g. `en-US`. Empty for the invariant culture.
    fn name(&self) -> &str;

    fn number_format(&self) -> &NumberFormat;

    fn datetime_format(&self) -> &DateTimeFormat;
}

/// Number formatting data.
///
/// The `*_pattern` fields describe where the number (`n`), the currency
/// symbol (`$`) and the negative sign (`-`) go, e.g. `"-n %"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NumberFormat {
    pub decimal_separator: String,
    pub group_separator: String,
    /// Digits per group, from the decimal point outward. The last size
    /// repeats; a trailing `0` stops grouping.
    pub group_sizes: Vec<usize>,
    pub negative_sign: String,
    pub positive_sign: String,
    pub percent_symbol: String,
    pub per_mille_symbol: String,
    pub currency_symbol: String,
    pub nan_symbol: String,
    pub positive_infinity_symbol: String,
    pub negative_infinity_symbol: String,
    pub number_decimal_digits: usize,
    pub currency_decimal_digits: usize,
    pub percent_decimal_digits: usize,
    pub currency_positive_pattern: String,
    pub currency_negative_pattern: String,
    pub percent_positive_pattern: String,
    pub percent_negative_pattern: String,
}

/// Date and time formatting data. Patterns use custom format syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DateTimeFormat {
    pub short_date_pattern: String,
    pub long_date_pattern: String,
    pub short_time_pattern: String,
    pub long_time_pattern: String,
    pub month_day_pattern: String,
    pub year_month_pattern: String,
    pub date_separator: String,
    pub time_separator: String,
    pub am_designator: String,
    pub pm_designator: String,
    /// Sunday first.
    pub day_names: [String; 7],
    pub abbreviated_day_names: [String; 7],
    pub month_names: [String; 12],
    pub abbreviated_month_names: [String; 12],
    /// Month names used when a day number is in the same pattern
    /// (`26 марта`). Empty when the language has no such form.
    #[serde(default)]
    pub month_genitive_names: Vec<String>,
}

/// A named set of formatting data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Culture {
    pub name: String,
    pub number: NumberFormat,
    pub datetime: DateTimeFormat,
}

impl FormatProvider for Culture {
    fn name(&self) -> &str {
        &self.name
    }

    fn number_format(&self) -> &NumberFormat {
        &self.number
    }

    fn datetime_format(&self) -> &DateTimeFormat {
        &self.datetime
    }
}

fn strings<const N: usize>(items: [&str; N]) -> [String; N] {
    items.map(str::to_string)
}

const NBSP: &str = "\u{a0}";

const ENGLISH_DAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
const ENGLISH_DAYS_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const ENGLISH_MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl Culture {
    /// Culture-independent data: `.` decimals, `,` groups, `MM/dd/yyyy`.
    pub fn invariant() -> Culture {
        Culture {
            name: String::new(),
            number: NumberFormat {
                decimal_separator: ".".to_string(),
                group_separator: ",".to_string(),
                group_sizes: vec![3],
                negative_sign: "-".to_string(),
                positive_sign: "+".to_string(),
                percent_symbol: "%".to_string(),
                per_mille_symbol: "\u{2030}".to_string(),
                currency_symbol: "\u{a4}".to_string(),
                nan_symbol: "NaN".to_string(),
                positive_infinity_symbol: "Infinity".to_string(),
                negative_infinity_symbol: "-Infinity".to_string(),
                number_decimal_digits: 2,
                currency_decimal_digits: 2,
                percent_decimal_digits: 2,
                currency_positive_pattern: "$n".to_string(),
                currency_negative_pattern: "($n)".to_string(),
                percent_positive_pattern: "n %".to_string(),
                percent_negative_pattern: "-n %".to_string(),
            },
            datetime: DateTimeFormat {
                short_date_pattern: "MM/dd/yyyy".to_string(),
                long_date_pattern: "dddd, dd MMMM yyyy".to_string(),
                short_time_pattern: "HH:mm".to_string(),
                long_time_pattern: "HH:mm:ss".to_string(),
                month_day_pattern: "MMMM dd".to_string(),
                year_month_pattern: "yyyy MMMM".to_string(),
                date_separator: "/".to_string(),
                time_separator: ":".to_string(),
                am_designator: "AM".to_string(),
                pm_designator: "PM".to_string(),
                day_names: strings(ENGLISH_DAYS),
                abbreviated_day_names: strings(ENGLISH_DAYS_SHORT),
                month_names: strings(ENGLISH_MONTHS),
                abbreviated_month_names: strings(ENGLISH_MONTHS_SHORT),
                month_genitive_names: Vec::new(),
            },
        }
    }

    /// English (United States).
    pub fn en() -> Culture {
        let mut culture = Culture::invariant();
        culture.name = "en-US".to_string();

        let number = &mut culture.number;
        number.currency_symbol = "$".to_string();
        number.currency_negative_pattern = "-$n".to_string();
        number.percent_positive_pattern = "n%".to_string();
        number.percent_negative_pattern = "-n%".to_string();
        number.positive_infinity_symbol = "\u{221e}".to_string();
        number.negative_infinity_symbol = "-\u{221e}".to_string();

        let datetime = &mut culture.datetime;
        datetime.short_date_pattern = "M/d/yyyy".to_string();
        datetime.long_date_pattern = "dddd, MMMM d, yyyy".to_string();
        datetime.short_time_pattern = "h:mm tt".to_string();
        datetime.long_time_pattern = "h:mm:ss tt".to_string();
        datetime.month_day_pattern = "MMMM d".to_string();
        datetime.year_month_pattern = "MMMM yyyy".to_string();
        culture
    }

    /// Russian (Russia).
    pub fn ru() -> Culture {
        Culture {
            name: "ru-RU".to_string(),
            number: NumberFormat {
                decimal_separator: ",".to_string(),
                group_separator: NBSP.to_string(),
                group_sizes: vec![3],
                negative_sign: "-".to_string(),
                positive_sign: "+".to_string(),
                percent_symbol: "%".to_string(),
                per_mille_symbol: "\u{2030}".to_string(),
                currency_symbol: "\u{20bd}".to_string(),
                nan_symbol: "\u{43d}\u{435} \u{447}\u{438}\u{441}\u{43b}\u{43e}".to_string(),
                positive_infinity_symbol: "\u{221e}".to_string(),
                negative_infinity_symbol: "-\u{221e}".to_string(),
                number_decimal_digits: 2,
                currency_decimal_digits: 2,
                percent_decimal_digits: 2,
                currency_positive_pattern: format!("n{NBSP}$"),
                currency_negative_pattern: format!("-n{NBSP}$"),
                percent_positive_pattern: format!("n{NBSP}%"),
                percent_negative_pattern: format!("-n{NBSP}%"),
            },
            datetime: DateTimeFormat {
                short_date_pattern: "dd.MM.yyyy".to_string(),
                long_date_pattern: "d MMMM yyyy 'г.'".to_string(),
                short_time_pattern: "HH:mm".to_string(),
                long_time_pattern: "HH:mm:ss".to_string(),
                month_day_pattern: "d MMMM".to_string(),
                year_month_pattern: "MMMM yyyy 'г.'".to_string(),
                date_separator: ".".to_string(),
                time_separator: ":".to_string(),
                am_designator: String::new(),
                pm_designator: String::new(),
                day_names: strings([
                    "воскресенье",
                    "понедельник",
                    "вторник",
                    "среда",
                    "четверг",
                    "пятница",
                    "суббота",
                ]),
                abbreviated_day_names: strings(["вс", "пн", "вт", "ср", "чт", "пт", "сб"]),
                month_names: strings([
                    "январь",
                    "февраль",
                    "март",
                    "апрель",
                    "май",
                    "июнь",
                    "июль",
                    "август",
                    "сентябрь",
                    "октябрь",
                    "ноябрь",
                    "декабрь",
                ]),
                abbreviated_month_names: strings([
                    "янв.", "февр.", "март", "апр.", "май", "июнь", "июль", "авг.", "сент.",
                    "окт.", "нояб.", "дек.",
                ]),
                month_genitive_names: [
                    "января",
                    "февраля",
                    "марта",
                    "апреля",
                    "мая",
                    "июня",
                    "июля",
                    "августа",
                    "сентября",
                    "октября",
                    "ноября",
                    "декабря",
                ]
                .map(str::to_string)
                .to_vec(),
            },
        }
    }

    /// Look up a built-in culture by name, ignoring case. Accepts the
    /// language (`ru`), the full name (`ru-RU`), and `""` or `invariant` for
    /// the invariant culture.
    pub fn get(name: &str) -> Option<Culture> {
        let name = name.trim().to_ascii_lowercase().replace('_', "-");
        match name.as_str() {
            "" | "invariant" => Some(Culture::invariant()),
            "en" | "en-us" => Some(Culture::en()),
            "ru" | "ru-ru" => Some(Culture::ru()),
            _ => None,
        }
    }
}

impl Default for Culture {
    fn default() -> Self {
        Culture::invariant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup() {
        assert_eq!(Culture::get("RU").map(|c| c.name), Some("ru-RU".to_string()));
        assert_eq!(Culture::get("en_US").map(|c| c.name), Some("en-US".to_string()));
        assert_eq!(Culture::get("").map(|c| c.name), Some(String::new()));
        assert_eq!(Culture::get("xx-YY"), None);
    }

    #[test]
    fn test_culture_data_from_config() {
        let mut culture = Culture::en();
        culture.name = "en-GB".to_string();
        culture.datetime.short_date_pattern = "dd/MM/yyyy".to_string();

        let json = serde_json::to_string(&culture).unwrap();
        assert!(json.contains("\"short-date-pattern\":\"dd/MM/yyyy\""));
        let parsed: Culture = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, culture);
    }
}
