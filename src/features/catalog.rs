//! The static feature table: every input the models expect, with its unit and
//! the domain random values are drawn from.
//!
//! Order matters: it is the form layout order and the JSON key order.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::FeatureValue;

/// Where a feature's random values come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureDomain {
    /// Uniform pick from a fixed list of labels.
    Categorical(&'static [&'static str]),
    /// 0 or 1.
    Binary,
    /// Uniform integer in `min..=max`.
    Integer { min: i64, max: i64 },
    /// Uniform real in `[min, max)`, rounded to `precision` decimals.
    Decimal { min: f64, max: f64, precision: u32 },
}

impl FeatureDomain {
    /// Domain used for features without a specific rule.
    pub const FALLBACK: FeatureDomain = FeatureDomain::Integer { min: 0, max: 9 };

    pub fn is_categorical(&self) -> bool {
        matches!(self, FeatureDomain::Categorical(_))
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> FeatureValue {
        match *self {
            FeatureDomain::Categorical(options) => {
                let pick = options.choose(rng).copied().unwrap_or_default();
                FeatureValue::Text(pick.to_string())
            }
            FeatureDomain::Binary => FeatureValue::Number(rng.gen_range(0..=1) as f64),
            FeatureDomain::Integer { min, max } => {
                FeatureValue::Number(rng.gen_range(min..=max) as f64)
            }
            FeatureDomain::Decimal { min, max, precision } => {
                let u: f64 = rng.r#gen();
                FeatureValue::Number(round_to(min + u * (max - min), precision))
            }
        }
    }

    /// Whether `value` could have been produced by [`FeatureDomain::sample`].
    pub fn contains(&self, value: &FeatureValue) -> bool {
        match (*self, value) {
            (FeatureDomain::Categorical(options), FeatureValue::Text(s)) => {
                options.contains(&s.as_str())
            }
            (FeatureDomain::Binary, FeatureValue::Number(v)) => *v == 0.0 || *v == 1.0,
            (FeatureDomain::Integer { min, max }, FeatureValue::Number(v)) => {
                v.fract() == 0.0 && *v >= min as f64 && *v <= max as f64
            }
            (FeatureDomain::Decimal { min, max, precision }, FeatureValue::Number(v)) => {
                *v >= min && *v <= max && round_to(*v, precision) == *v
            }
            _ => false,
        }
    }

    /// Short human-readable description, e.g. `int 40..=79`.
    pub fn describe(&self) -> String {
        match *self {
            FeatureDomain::Categorical(options) => options.join(" | "),
            FeatureDomain::Binary => "0 | 1".to_string(),
            FeatureDomain::Integer { min, max } => format!("int {min}..={max}"),
            FeatureDomain::Decimal { min, max, precision } => {
                let p = precision as usize;
                format!("{min:.p$}..={max:.p$} ({precision} dp)")
            }
        }
    }
}

fn round_to(v: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (v * scale).round() / scale
}

/// One row of the feature table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSpec {
    pub name: &'static str,
    /// Display unit; empty when the value is unitless.
    pub unit: &'static str,
    pub domain: FeatureDomain,
}

impl FeatureSpec {
    /// Form label: underscores become spaces and each word is capitalized,
    /// with the unit appended in parentheses.
    ///
    /// `heart_rate_max` → `Heart Rate Max (bpm)`.
    pub fn label(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + self.unit.len() + 3);
        let mut at_word_start = true;
        for ch in self.name.chars() {
            if ch == '_' {
                out.push(' ');
                at_word_start = true;
                continue;
            }
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            at_word_start = false;
        }
        if !self.unit.is_empty() {
            out.push_str(" (");
            out.push_str(self.unit);
            out.push(')');
        }
        out
    }
}

const GENDERS: &[&str] = &["M", "F"];
const RACES: &[&str] = &["WHITE", "BLACK", "HISPANIC", "ASIAN", "OTHER"];
const LANGUAGES: &[&str] = &["ENGLISH", "SPANISH", "CHINESE", "OTHER"];
const MARITAL_STATUSES: &[&str] = &["MARRIED", "SINGLE", "DIVORCED", "WIDOWED"];
const INSURANCES: &[&str] = &["MEDICARE", "MEDICAID", "PRIVATE", "SELF PAY"];
const ADMISSION_TYPES: &[&str] = &["EMERGENCY", "ELECTIVE", "URGENT"];
const ADMISSION_LOCATIONS: &[&str] = &["EMERGENCY ROOM", "CLINIC", "TRANSFER", "PHYSICIAN REFERRAL"];

const DOSE: FeatureDomain = FeatureDomain::Integer { min: 0, max: 10 };
const GLUCOSE: FeatureDomain = FeatureDomain::Integer { min: 70, max: 369 };
const TEMPERATURE: FeatureDomain = FeatureDomain::Decimal { min: 35.0, max: 40.0, precision: 1 };
const SODIUM: FeatureDomain = FeatureDomain::Integer { min: 130, max: 149 };
const POTASSIUM: FeatureDomain = FeatureDomain::Decimal { min: 3.0, max: 5.0, precision: 1 };

const fn spec(name: &'static str, unit: &'static str, domain: FeatureDomain) -> FeatureSpec {
    FeatureSpec { name, unit, domain }
}

const fn categorical(name: &'static str, options: &'static [&'static str]) -> FeatureSpec {
    spec(name, "", FeatureDomain::Categorical(options))
}

const fn flag(name: &'static str) -> FeatureSpec {
    spec(name, "binary", FeatureDomain::Binary)
}

const fn int(name: &'static str, unit: &'static str, min: i64, max: i64) -> FeatureSpec {
    spec(name, unit, FeatureDomain::Integer { min, max })
}

const fn dec(name: &'static str, unit: &'static str, min: f64, max: f64) -> FeatureSpec {
    spec(name, unit, FeatureDomain::Decimal { min, max, precision: 1 })
}

/// Number of features every `FeatureSet` carries.
pub const FEATURE_COUNT: usize = 57;

pub static CATALOG: [FeatureSpec; FEATURE_COUNT] = [
    // Demographics and admission.
    categorical("gender", GENDERS),
    categorical("race", RACES),
    categorical("language", LANGUAGES),
    categorical("marital_status", MARITAL_STATUSES),
    categorical("insurance", INSURANCES),
    categorical("admission_type", ADMISSION_TYPES),
    categorical("admission_location", ADMISSION_LOCATIONS),
    int("age_at_admission", "years", 18, 97),
    // Renal replacement and vasoactive support.
    flag("rrt_first24h"),
    spec("norepinephrine_0_24h", "mcg/kg/min", DOSE),
    spec("epinephrine_0_24h", "mcg/kg/min", DOSE),
    spec("phenylephrine_0_24h", "mcg/kg/min", DOSE),
    spec("vasopressin_0_24h", "units/hr", DOSE),
    spec("dopamine_0_24h", "mcg/kg/min", DOSE),
    spec("dobutamine_0_24h", "mcg/kg/min", DOSE),
    spec("angiotensinII_0_24h", "ng/kg/min", DOSE),
    spec("milrinone_0_24h", "mcg/kg/min", DOSE),
    flag("any_vaso_inotrope_0_24h"),
    // Vital signs.
    int("mbp_min", "mmHg", 40, 79),
    int("sbp_min", "mmHg", 60, 119),
    int("dbp_min", "mmHg", 30, 69),
    int("spo2_min", "%", 80, 99),
    int("heart_rate_max", "bpm", 60, 159),
    int("resp_rate_max", "breaths/min", 10, 39),
    spec("temperature_min", "°C", TEMPERATURE),
    spec("temperature_max", "°C", TEMPERATURE),
    spec("vs_glucose_min", "mg/dL", GLUCOSE),
    spec("vs_glucose_max", "mg/dL", GLUCOSE),
    // Labs.
    dec("hemoglobin_min", "g/dL", 6.0, 14.0),
    int("platelets_min", "K/μL", 100, 399),
    dec("wbc_max", "K/μL", 4.0, 19.0),
    dec("albumin_min", "g/dL", 2.0, 4.0),
    int("aniongap_max", "mEq/L", 8, 22),
    int("bicarbonate_min", "mEq/L", 18, 27),
    int("bun_max", "mg/dL", 7, 46),
    dec("creatinine_max", "mg/dL", 0.5, 3.5),
    spec("lab_glucose_min", "mg/dL", GLUCOSE),
    spec("lab_glucose_max", "mg/dL", GLUCOSE),
    spec("sodium_min", "mEq/L", SODIUM),
    spec("sodium_max", "mEq/L", SODIUM),
    spec("potassium_min", "mEq/L", POTASSIUM),
    spec("potassium_max", "mEq/L", POTASSIUM),
    int("chloride_min", "mEq/L", 95, 114),
    dec("calcium_min", "mg/dL", 8.0, 10.0),
    int("urine_output_24h", "mL", 500, 2499),
    // Medications given in the first 24h.
    flag("heparin_0_24h"),
    flag("metoprolol_tartrate_0_24h"),
    flag("metoprolol_succinate_xl_0_24h"),
    flag("aspirin_0_24h"),
    flag("warfarin_0_24h"),
    flag("amiodarone_0_24h"),
    flag("diltiazem_0_24h"),
    flag("digoxin_0_24h"),
    flag("esmolol_0_24h"),
    flag("labetalol_0_24h"),
    flag("propranolol_0_24h"),
    // Scores.
    spec("charlson_comorbidity_index", "", FeatureDomain::FALLBACK),
];

/// Position of `key` in [`CATALOG`].
pub fn catalog_index(key: &str) -> Option<usize> {
    CATALOG.iter().position(|spec| spec.name == key)
}

/// Catalog entry for `key`.
pub fn lookup(key: &str) -> Option<&'static FeatureSpec> {
    CATALOG.iter().find(|spec| spec.name == key)
}

/// Generation domain for `key`; keys without an entry use [`FeatureDomain::FALLBACK`].
pub fn domain_of(key: &str) -> FeatureDomain {
    lookup(key).map(|spec| spec.domain).unwrap_or(FeatureDomain::FALLBACK)
}
