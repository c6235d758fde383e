//! Regional formatting: currency, numbers, dates and measurement units.
//!
//! A `LocaleProfile` is keyed by a language-region id (`es-MX`). Every
//! supported language has a default profile; a country hint selects one of
//! the others.

use crate::i18n::Language;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use num_format::{CustomFormat, Grouping, ToFormattedString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub const LB_PER_KG: f64 = 2.20462;
pub const CM_PER_FT: f64 = 30.48;

#[derive(Debug, Error)]
pub enum RegionalError {
    #[error("invalid regional config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("default locale '{locale}' for '{language}' is not a known profile")]
    UnknownDefault { language: String, locale: String },

    #[error("profile '{locale}' belongs to '{language}', not '{expected}'")]
    LanguageMismatch {
        locale: String,
        language: String,
        expected: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    Cm,
    Ft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        })
    }
}

impl fmt::Display for HeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeightUnit::Cm => "cm",
            HeightUnit::Ft => "ft",
        })
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        })
    }
}

/// A converted value in the unit a locale displays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantity<U> {
    pub value: f64,
    pub unit: U,
}

impl<U: fmt::Display> fmt::Display for Quantity<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyFormat {
    /// ISO 4217 code
    pub code: String,
    pub symbol: String,
    pub fraction_digits: usize,
    pub position: SymbolPosition,
    /// Space between symbol and amount
    #[serde(default)]
    pub spaced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberFormat {
    pub group_separator: String,
    pub decimal_separator: String,
    /// Maximum fraction digits for plain numbers
    pub max_fraction_digits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleProfile {
    pub id: String,
    /// Supported language code the profile belongs to
    pub language: String,
    pub currency: CurrencyFormat,
    pub number: NumberFormat,
    /// strftime pattern
    pub date_pattern: String,
    /// strftime pattern; derived from `hour12` when absent
    #[serde(default)]
    pub time_pattern: Option<String>,
    #[serde(default)]
    pub hour12: bool,
    /// Fixed offset from UTC used for display
    pub utc_offset_minutes: i32,
    pub timezone: String,
    pub measurement: MeasurementSystem,
    pub weight_unit: WeightUnit,
    pub height_unit: HeightUnit,
    pub temperature_unit: TemperatureUnit,
}

impl LocaleProfile {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    fn time_pattern(&self) -> &str {
        match &self.time_pattern {
            Some(pattern) => pattern,
            None if self.hour12 => "%-I:%M %p",
            None => "%H:%M",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegionalConfig {
    #[serde(default)]
    profiles: Vec<LocaleProfile>,
    #[serde(default)]
    defaults: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct RegionalFormatProvider {
    profiles: Vec<LocaleProfile>,
    /// Language code -> default locale id
    defaults: HashMap<String, String>,
}

impl Default for RegionalFormatProvider {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RegionalFormatProvider {
    pub fn builtin() -> Self {
        let defaults = [
            ("ja", "ja-JP"),
            ("en", "en-US"),
            ("zh-CN", "zh-CN"),
            ("ko", "ko-KR"),
            ("es", "es-ES"),
        ]
        .into_iter()
        .map(|(lang, locale)| (lang.to_string(), locale.to_string()))
        .collect();

        Self {
            profiles: builtin_profiles(),
            defaults,
        }
    }

    /// Layer a regional config document `{ profiles: [...], defaults: {...} }`
    /// over the built-in profiles. Profiles with a known id replace it.
    pub fn from_json(value: Value) -> Result<Self, RegionalError> {
        let config: RegionalConfig = serde_json::from_value(value)?;
        let mut provider = Self::builtin();

        for profile in config.profiles {
            match provider.profiles.iter_mut().find(|p| p.id.eq_ignore_ascii_case(&profile.id)) {
                Some(existing) => *existing = profile,
                None => provider.profiles.push(profile),
            }
        }

        for (language, locale) in config.defaults {
            let profile = provider.profile(&locale).ok_or_else(|| RegionalError::UnknownDefault {
                language: language.clone(),
                locale: locale.clone(),
            })?;
            if profile.language != language {
                return Err(RegionalError::LanguageMismatch {
                    locale,
                    language: profile.language.clone(),
                    expected: language,
                });
            }
            provider.defaults.insert(language, locale);
        }

        debug!("Loaded {} locale profiles", provider.profiles.len());
        Ok(provider)
    }

    pub fn profiles(&self) -> &[LocaleProfile] {
        &self.profiles
    }

    /// Look up a profile by id, case-insensitively.
    pub fn profile(&self, id: &str) -> Option<&LocaleProfile> {
        self.profiles.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    /// Every profile of a language, in declaration order.
    pub fn locales_for(&self, language: Language) -> Vec<&LocaleProfile> {
        self.profiles
            .iter()
            .filter(|p| p.language == language.code())
            .collect()
    }

    /// Pick the profile for `language`, honoring a country hint (`MX`, or a
    /// full tag such as `es-MX`) when it names a known profile of that
    /// language.
    pub fn resolve_locale(&self, language: Language, country_hint: Option<&str>) -> &LocaleProfile {
        if let Some(profile) = country_hint.and_then(|hint| self.hinted(language, hint)) {
            return profile;
        }

        self.defaults
            .get(language.code())
            .and_then(|id| self.profile(id))
            .or_else(|| self.locales_for(language).into_iter().next())
            .unwrap_or(&self.profiles[0])
    }

    fn hinted(&self, language: Language, hint: &str) -> Option<&LocaleProfile> {
        let hint = hint.trim();
        let id = if hint.contains('-') || hint.contains('_') {
            hint.replace('_', "-")
        } else {
            let base = language.code().split('-').next().unwrap_or(language.code());
            format!("{}-{}", base, hint)
        };
        self.profile(&id).filter(|p| p.language == language.code())
    }

    /// Plain number with up to the locale's maximum fraction digits.
    pub fn format_number(&self, value: f64, locale: &LocaleProfile) -> String {
        format_decimal(value, locale.number.max_fraction_digits, true, &locale.number)
    }

    pub fn format_currency(&self, amount: f64, locale: &LocaleProfile) -> String {
        let currency = &locale.currency;
        let digits = format_decimal(amount.abs(), currency.fraction_digits, false, &locale.number);
        let sign = if amount < 0.0 && digits.chars().any(|c| c.is_ascii_digit() && c != '0') {
            "-"
        } else {
            ""
        };
        let space = if currency.spaced { " " } else { "" };

        match currency.position {
            SymbolPosition::Before => format!("{}{}{}{}", sign, currency.symbol, space, digits),
            SymbolPosition::After => format!("{}{}{}{}", sign, digits, space, currency.symbol),
        }
    }

    pub fn format_date(&self, at: DateTime<Utc>, locale: &LocaleProfile) -> String {
        at.with_timezone(&locale.offset())
            .format(&locale.date_pattern)
            .to_string()
    }

    pub fn format_time(&self, at: DateTime<Utc>, locale: &LocaleProfile) -> String {
        at.with_timezone(&locale.offset())
            .format(locale.time_pattern())
            .to_string()
    }

    /// Convert a weight into the locale's display unit.
    pub fn convert_weight(&self, value: f64, from: WeightUnit, locale: &LocaleProfile) -> Quantity<WeightUnit> {
        Quantity {
            value: convert_weight_between(value, from, locale.weight_unit),
            unit: locale.weight_unit,
        }
    }

    /// Convert a height into the locale's display unit.
    pub fn convert_height(&self, value: f64, from: HeightUnit, locale: &LocaleProfile) -> Quantity<HeightUnit> {
        Quantity {
            value: convert_height_between(value, from, locale.height_unit),
            unit: locale.height_unit,
        }
    }

    pub fn convert_temperature(
        &self,
        value: f64,
        from: TemperatureUnit,
        locale: &LocaleProfile,
    ) -> Quantity<TemperatureUnit> {
        Quantity {
            value: convert_temperature_between(value, from, locale.temperature_unit),
            unit: locale.temperature_unit,
        }
    }
}

/// Rounded to one decimal place.
pub fn convert_weight_between(value: f64, from: WeightUnit, to: WeightUnit) -> f64 {
    round1(match (from, to) {
        (WeightUnit::Kg, WeightUnit::Lb) => value * LB_PER_KG,
        (WeightUnit::Lb, WeightUnit::Kg) => value / LB_PER_KG,
        _ => value,
    })
}

/// Rounded to one decimal place.
pub fn convert_height_between(value: f64, from: HeightUnit, to: HeightUnit) -> f64 {
    round1(match (from, to) {
        (HeightUnit::Cm, HeightUnit::Ft) => value / CM_PER_FT,
        (HeightUnit::Ft, HeightUnit::Cm) => value * CM_PER_FT,
        _ => value,
    })
}

/// Rounded to one decimal place.
pub fn convert_temperature_between(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
    round1(match (from, to) {
        (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => value * 9.0 / 5.0 + 32.0,
        (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => (value - 32.0) * 5.0 / 9.0,
        _ => value,
    })
}

/// Region subtag of a BCP 47 tag: `es-MX` -> `MX`.
pub fn country_hint(tag: &str) -> Option<&str> {
    tag.split(['-', '_'])
        .skip(1)
        .find(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn format_decimal(value: f64, digits: usize, trim: bool, number: &NumberFormat) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.*}", digits, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = if trim { frac_part.trim_end_matches('0') } else { frac_part };

    // Beyond u64 the digits are printed ungrouped
    let grouped = match int_part.parse::<u64>() {
        Ok(int_value) => group_digits(int_value, &number.group_separator),
        Err(_) => int_part.to_string(),
    };

    let nonzero = |digits: &str| digits.chars().any(|c| c != '0');
    let negative = value < 0.0 && (nonzero(int_part) || nonzero(frac_part));
    let mut out = String::with_capacity(grouped.len() + frac_part.len() + 2);
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push_str(&number.decimal_separator);
        out.push_str(frac_part);
    }
    out
}

fn group_digits(value: u64, separator: &str) -> String {
    if separator.is_empty() {
        return value.to_string();
    }
    match CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator(separator)
        .build()
    {
        Ok(format) => value.to_formatted_string(&format),
        Err(_) => value.to_string(),
    }
}

struct Units {
    measurement: MeasurementSystem,
    weight: WeightUnit,
    height: HeightUnit,
    temperature: TemperatureUnit,
}

const METRIC: Units = Units {
    measurement: MeasurementSystem::Metric,
    weight: WeightUnit::Kg,
    height: HeightUnit::Cm,
    temperature: TemperatureUnit::Celsius,
};

const IMPERIAL: Units = Units {
    measurement: MeasurementSystem::Imperial,
    weight: WeightUnit::Lb,
    height: HeightUnit::Ft,
    temperature: TemperatureUnit::Fahrenheit,
};

fn currency(code: &str, symbol: &str, fraction_digits: usize, position: SymbolPosition, spaced: bool) -> CurrencyFormat {
    CurrencyFormat {
        code: code.to_string(),
        symbol: symbol.to_string(),
        fraction_digits,
        position,
        spaced,
    }
}

fn number(group: &str, decimal: &str) -> NumberFormat {
    NumberFormat {
        group_separator: group.to_string(),
        decimal_separator: decimal.to_string(),
        max_fraction_digits: 3,
    }
}

#[allow(clippy::too_many_arguments)]
fn profile(
    id: &str,
    language: &str,
    currency: CurrencyFormat,
    number: NumberFormat,
    date_pattern: &str,
    hour12: bool,
    utc_offset_minutes: i32,
    timezone: &str,
    units: Units,
) -> LocaleProfile {
    LocaleProfile {
        id: id.to_string(),
        language: language.to_string(),
        currency,
        number,
        date_pattern: date_pattern.to_string(),
        time_pattern: None,
        hour12,
        utc_offset_minutes,
        timezone: timezone.to_string(),
        measurement: units.measurement,
        weight_unit: units.weight,
        height_unit: units.height,
        temperature_unit: units.temperature,
    }
}

fn builtin_profiles() -> Vec<LocaleProfile> {
    use SymbolPosition::{After, Before};

    vec![
        profile(
            "ja-JP",
            "ja",
            currency("JPY", "¥", 0, Before, false),
            number(",", "."),
            "%Y/%m/%d",
            false,
            9 * 60,
            "Asia/Tokyo",
            METRIC,
        ),
        profile(
            "en-US",
            "en",
            currency("USD", "$", 2, Before, false),
            number(",", "."),
            "%m/%d/%Y",
            true,
            -5 * 60,
            "America/New_York",
            IMPERIAL,
        ),
        profile(
            "en-GB",
            "en",
            currency("GBP", "£", 2, Before, false),
            number(",", "."),
            "%d/%m/%Y",
            false,
            0,
            "Europe/London",
            METRIC,
        ),
        profile(
            "zh-CN",
            "zh-CN",
            currency("CNY", "¥", 2, Before, false),
            number(",", "."),
            "%Y/%m/%d",
            false,
            8 * 60,
            "Asia/Shanghai",
            METRIC,
        ),
        profile(
            "ko-KR",
            "ko",
            currency("KRW", "₩", 0, Before, false),
            number(",", "."),
            "%Y. %m. %d.",
            false,
            9 * 60,
            "Asia/Seoul",
            METRIC,
        ),
        profile(
            "es-ES",
            "es",
            currency("EUR", "€", 2, After, true),
            number(".", ","),
            "%d/%m/%Y",
            false,
            60,
            "Europe/Madrid",
            METRIC,
        ),
        profile(
            "es-MX",
            "es",
            currency("MXN", "$", 2, Before, false),
            number(",", "."),
            "%d/%m/%Y",
            false,
            -6 * 60,
            "America/Mexico_City",
            METRIC,
        ),
        profile(
            "es-AR",
            "es",
            currency("ARS", "$", 2, Before, true),
            number(".", ","),
            "%d/%m/%Y",
            false,
            -3 * 60,
            "America/Argentina/Buenos_Aires",
            METRIC,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    fn provider() -> RegionalFormatProvider {
        RegionalFormatProvider::builtin()
    }

    #[test]
    fn test_every_enabled_language_has_a_default_profile() {
        let regional = provider();
        for config in crate::i18n::LanguageRegistry::get().list_enabled() {
            let language = Language::from_code(config.code).unwrap();
            let profile = regional.resolve_locale(language, None);
            assert_eq!(profile.language, language.code());
        }
    }

    #[test]
    fn test_resolve_locale_with_country_hint() {
        let regional = provider();
        assert_eq!(regional.resolve_locale(Language::SPANISH, None).id, "es-ES");
        assert_eq!(regional.resolve_locale(Language::SPANISH, Some("MX")).id, "es-MX");
        assert_eq!(regional.resolve_locale(Language::SPANISH, Some("es-AR")).id, "es-AR");
        assert_eq!(regional.resolve_locale(Language::ENGLISH, Some("gb")).id, "en-GB");
        assert_eq!(regional.resolve_locale(Language::CHINESE_SIMPLIFIED, Some("CN")).id, "zh-CN");
    }

    #[test]
    fn test_unknown_or_foreign_hint_uses_default() {
        let regional = provider();
        assert_eq!(regional.resolve_locale(Language::SPANISH, Some("CO")).id, "es-ES");
        // es-MX exists but is not an English profile
        assert_eq!(regional.resolve_locale(Language::ENGLISH, Some("es-MX")).id, "en-US");
    }

    #[test]
    fn test_format_number() {
        let regional = provider();
        let us = regional.resolve_locale(Language::ENGLISH, None);
        let es = regional.resolve_locale(Language::SPANISH, None);

        assert_eq!(regional.format_number(1234567.5, us), "1,234,567.5");
        assert_eq!(regional.format_number(1234567.5, es), "1.234.567,5");
        assert_eq!(regional.format_number(12.0, us), "12");
        assert_eq!(regional.format_number(-0.0001, us), "0");
        assert_eq!(regional.format_number(-1500.25, us), "-1,500.25");
    }

    #[test]
    fn test_format_number_out_of_range() {
        let regional = provider();
        let us = regional.resolve_locale(Language::ENGLISH, None);

        assert_eq!(regional.format_number(f64::NAN, us), "NaN");
        assert_eq!(regional.format_number(f64::INFINITY, us), "inf");
        assert_eq!(regional.format_number(f64::NEG_INFINITY, us), "-inf");
        assert_eq!(regional.format_number(1e20, us), "100000000000000000000");
        assert_eq!(regional.format_number(-1e20, us), "-100000000000000000000");
        assert_eq!(regional.format_number(18446744073709549568.0, us), "18,446,744,073,709,549,568");
    }

    #[test]
    fn test_format_currency() {
        let regional = provider();
        let by_id = |id: &str| regional.profile(id).unwrap().clone();

        assert_eq!(regional.format_currency(1234.6, &by_id("ja-JP")), "¥1,235");
        assert_eq!(regional.format_currency(1234.5, &by_id("en-US")), "$1,234.50");
        assert_eq!(regional.format_currency(1234.5, &by_id("es-ES")), "1.234,50 €");
        assert_eq!(regional.format_currency(1234.5, &by_id("es-AR")), "$ 1.234,50");
        assert_eq!(regional.format_currency(50000.0, &by_id("ko-KR")), "₩50,000");
        assert_eq!(regional.format_currency(-5.0, &by_id("en-GB")), "-£5.00");
    }

    #[test]
    fn test_format_date_and_time_in_locale_offset() {
        let regional = provider();
        let at = Utc.with_ymd_and_hms(2024, 3, 31, 18, 5, 0).unwrap();

        let ja = regional.resolve_locale(Language::JAPANESE, None);
        assert_eq!(regional.format_date(at, ja), "2024/04/01");
        assert_eq!(regional.format_time(at, ja), "03:05");

        let us = regional.resolve_locale(Language::ENGLISH, None);
        assert_eq!(regional.format_date(at, us), "03/31/2024");
        assert_eq!(regional.format_time(at, us), "1:05 PM");

        let ko = regional.resolve_locale(Language::KOREAN, None);
        assert_eq!(regional.format_date(at, ko), "2024. 04. 01.");
    }

    #[test]
    fn test_convert_to_locale_units() {
        let regional = provider();
        let us = regional.resolve_locale(Language::ENGLISH, None);
        let ja = regional.resolve_locale(Language::JAPANESE, None);

        let weight = regional.convert_weight(70.0, WeightUnit::Kg, us);
        assert_eq!(weight, Quantity { value: 154.3, unit: WeightUnit::Lb });
        assert_eq!(weight.to_string(), "154.3 lb");

        let height = regional.convert_height(170.0, HeightUnit::Cm, us);
        assert_eq!(height.value, 5.6);
        assert_eq!(height.unit, HeightUnit::Ft);

        let same = regional.convert_weight(62.345, WeightUnit::Kg, ja);
        assert_eq!(same, Quantity { value: 62.3, unit: WeightUnit::Kg });

        let temperature = regional.convert_temperature(100.0, TemperatureUnit::Celsius, us);
        assert_eq!(temperature.value, 212.0);
        assert_eq!(temperature.to_string(), "212 °F");
    }

    #[test]
    fn test_from_json_layers_over_builtins() {
        let regional = RegionalFormatProvider::from_json(json!({
            "profiles": [{
                "id": "es-CO",
                "language": "es",
                "currency": {"code": "COP", "symbol": "$", "fractionDigits": 0, "position": "before", "spaced": true},
                "number": {"groupSeparator": ".", "decimalSeparator": ",", "maxFractionDigits": 2},
                "datePattern": "%d/%m/%Y",
                "utcOffsetMinutes": -300,
                "timezone": "America/Bogota",
                "measurement": "metric",
                "weightUnit": "kg",
                "heightUnit": "cm",
                "temperatureUnit": "celsius"
            }],
            "defaults": {"es": "es-CO"}
        }))
        .unwrap();

        let profile = regional.resolve_locale(Language::SPANISH, None);
        assert_eq!(profile.id, "es-CO");
        assert_eq!(regional.format_currency(25000.0, profile), "$ 25.000");
        assert_eq!(regional.resolve_locale(Language::SPANISH, Some("MX")).id, "es-MX");
        assert_eq!(regional.locales_for(Language::SPANISH).len(), 4);
    }

    #[test]
    fn test_from_json_rejects_bad_defaults() {
        let unknown = RegionalFormatProvider::from_json(json!({"defaults": {"es": "es-PE"}}));
        assert!(matches!(unknown, Err(RegionalError::UnknownDefault { .. })));

        let mismatch = RegionalFormatProvider::from_json(json!({"defaults": {"en": "es-MX"}}));
        assert!(matches!(mismatch, Err(RegionalError::LanguageMismatch { .. })));

        let malformed = RegionalFormatProvider::from_json(json!({"profiles": [{"id": 3}]}));
        assert!(matches!(malformed, Err(RegionalError::Config(_))));
    }

    #[test]
    fn test_country_hint() {
        assert_eq!(country_hint("es-MX"), Some("MX"));
        assert_eq!(country_hint("zh-Hans-CN"), Some("CN"));
        assert_eq!(country_hint("en_GB"), Some("GB"));
        assert_eq!(country_hint("ja"), None);
    }

    proptest! {
        #[test]
        fn weight_round_trip_is_close(kg in 0.0f64..500.0) {
            let lb = convert_weight_between(kg, WeightUnit::Kg, WeightUnit::Lb);
            let back = convert_weight_between(lb, WeightUnit::Lb, WeightUnit::Kg);
            prop_assert!((back - round1(kg)).abs() <= 0.2);
        }

        #[test]
        fn height_round_trip_is_close(ft in 0.0f64..10.0) {
            let cm = convert_height_between(ft, HeightUnit::Ft, HeightUnit::Cm);
            let back = convert_height_between(cm, HeightUnit::Cm, HeightUnit::Ft);
            prop_assert!((back - round1(ft)).abs() <= 0.2);
        }

        #[test]
        fn conversion_rounds_to_one_decimal(value in -1000.0f64..1000.0) {
            let lb = convert_weight_between(value, WeightUnit::Kg, WeightUnit::Lb);
            prop_assert!(((lb * 10.0).round() - lb * 10.0).abs() < 1e-6);
        }
    }
}
