//! Feature vector builder.
//!
//! The feature names here are the contract with the model artifact: the
//! artifact records the order it was fitted with and serving projects onto
//! that order by name, never by position.

use serde::{Deserialize, Serialize};

use crate::data::model::{MONTHS, Record};
use crate::error::{Error, Result};

pub const FEATURE_COUNT: usize = 26;

/// Builder output order (the order the scoring form lays fields out in).
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "LIMIT_BAL",
    "GENDER",
    "EDUCATION_HIGHSCHOOL",
    "EDUCATION_GRADUATE",
    "EDUCATION_POSTGRAD",
    "MARRIAGE_MARRIED",
    "MARRIAGE_SINGLE",
    "AGE",
    "PAY_STATUS_SEP05",
    "PAY_STATUS_AUG05",
    "PAY_STATUS_JUL05",
    "PAY_STATUS_JUN05",
    "PAY_STATUS_MAY05",
    "PAY_STATUS_APR05",
    "BILL_AMT_SEP05",
    "BILL_AMT_AUG05",
    "BILL_AMT_JUL05",
    "BILL_AMT_JUN05",
    "BILL_AMT_MAY05",
    "BILL_AMT_APR05",
    "PAY_AMT_SEP05",
    "PAY_AMT_AUG05",
    "PAY_AMT_JUL05",
    "PAY_AMT_JUN05",
    "PAY_AMT_MAY05",
    "PAY_AMT_APR05",
];

const PAY_STATUS_OFFSET: usize = 8;
const BILL_AMOUNT_OFFSET: usize = PAY_STATUS_OFFSET + MONTHS;
const PAY_AMOUNT_OFFSET: usize = BILL_AMOUNT_OFFSET + MONTHS;

// ---------------------------------------------------------------------------
// Categorical attributes and the raw-code codebook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sex {
    #[default]
    Female,
    Male,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Female, Sex::Male];

    /// Source codes: 1 = male, 2 = female. Anything else is rejected.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Sex::Male),
            2 => Ok(Sex::Female),
            _ => Err(Error::UnknownCode { field: "SEX", code }),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaritalStatus {
    #[default]
    Married,
    Single,
    /// Codes outside the codebook; both indicators stay 0.
    Other,
}

impl MaritalStatus {
    /// The choices offered by the scoring form.
    pub const FORM_CHOICES: [MaritalStatus; 2] = [MaritalStatus::Married, MaritalStatus::Single];

    /// Source codes: 1 = married, 2 = single, anything else = other.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MaritalStatus::Married,
            2 => MaritalStatus::Single,
            _ => MaritalStatus::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaritalStatus::Married => "Married",
            MaritalStatus::Single => "Single",
            MaritalStatus::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Education {
    #[default]
    None,
    HighSchool,
    Graduate,
    Postgraduate,
}

impl Education {
    pub const ALL: [Education; 4] = [
        Education::None,
        Education::HighSchool,
        Education::Graduate,
        Education::Postgraduate,
    ];

    /// Source codes: 1 = graduate school, 2 = university, 3 = high school;
    /// 0 and 4–6 (others/unknown) carry no indicator.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Education::Postgraduate,
            2 => Education::Graduate,
            3 => Education::HighSchool,
            _ => Education::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Education::None => "None",
            Education::HighSchool => "High School",
            Education::Graduate => "Graduate",
            Education::Postgraduate => "Postgraduate",
        }
    }
}

// ---------------------------------------------------------------------------
// CustomerProfile – the raw attributes
// ---------------------------------------------------------------------------

/// Raw customer attributes as entered on the form or read from a record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub credit_limit: f64,
    pub age: u32,
    pub sex: Sex,
    pub marital_status: MaritalStatus,
    pub education: Education,
    pub pay_status: [i64; MONTHS],
    pub bill_amount: [f64; MONTHS],
    pub pay_amount: [f64; MONTHS],
}

impl CustomerProfile {
    /// Interpret a record's raw codes through the codebook.
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            credit_limit: record.credit_limit,
            age: record.age,
            sex: Sex::from_code(record.sex)?,
            marital_status: MaritalStatus::from_code(record.marriage),
            education: Education::from_code(record.education),
            pay_status: record.pay_status,
            bill_amount: record.bill_amount,
            pay_amount: record.pay_amount,
        })
    }
}

// ---------------------------------------------------------------------------
// FeatureVector
// ---------------------------------------------------------------------------

/// Every named feature, in [`FEATURE_NAMES`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

fn indicator(on: bool) -> f64 {
    if on { 1.0 } else { 0.0 }
}

/// Expand a profile into the full feature vector. Total over the input
/// domain: every slot is written.
pub fn build(profile: &CustomerProfile) -> FeatureVector {
    let p = profile;
    let head = [
        p.credit_limit,
        indicator(p.sex == Sex::Male),
        indicator(p.education == Education::HighSchool),
        indicator(p.education == Education::Graduate),
        indicator(p.education == Education::Postgraduate),
        indicator(p.marital_status == MaritalStatus::Married),
        indicator(p.marital_status == MaritalStatus::Single),
        f64::from(p.age),
    ];

    let mut values = [0.0; FEATURE_COUNT];
    values[..PAY_STATUS_OFFSET].copy_from_slice(&head);
    for m in 0..MONTHS {
        values[PAY_STATUS_OFFSET + m] = p.pay_status[m] as f64;
        values[BILL_AMOUNT_OFFSET + m] = p.bill_amount[m];
        values[PAY_AMOUNT_OFFSET + m] = p.pay_amount[m];
    }
    FeatureVector { values }
}

impl FeatureVector {
    pub fn names() -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_NAMES
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    /// Re-order and select the values onto a declared name order.
    ///
    /// A declared name the builder does not produce is a
    /// [`Error::FeatureMismatch`]; it is never filled with a default.
    pub fn project<S: AsRef<str>>(&self, order: &[S]) -> Result<Vec<f64>> {
        order
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).ok_or_else(|| Error::FeatureMismatch {
                    feature: name.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(sex: Sex, marital_status: MaritalStatus, education: Education) -> CustomerProfile {
        CustomerProfile {
            credit_limit: 90_000.0,
            age: 41,
            sex,
            marital_status,
            education,
            pay_status: [2, 1, 0, -1, -2, 0],
            bill_amount: [10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            pay_amount: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        }
    }

    #[test]
    fn test_feature_names_unique() {
        let mut names = FEATURE_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_male_single_graduate() {
        let fv = build(&profile(Sex::Male, MaritalStatus::Single, Education::Graduate));
        assert_eq!(fv.get("GENDER"), Some(1.0));
        assert_eq!(fv.get("MARRIAGE_SINGLE"), Some(1.0));
        assert_eq!(fv.get("MARRIAGE_MARRIED"), Some(0.0));
        assert_eq!(fv.get("EDUCATION_GRADUATE"), Some(1.0));
        assert_eq!(fv.get("EDUCATION_HIGHSCHOOL"), Some(0.0));
        assert_eq!(fv.get("EDUCATION_POSTGRAD"), Some(0.0));
    }

    #[test]
    fn test_numeric_fields_pass_through() {
        let fv = build(&profile(Sex::Female, MaritalStatus::Married, Education::None));
        assert_eq!(fv.get("LIMIT_BAL"), Some(90_000.0));
        assert_eq!(fv.get("AGE"), Some(41.0));
        assert_eq!(fv.get("GENDER"), Some(0.0));
        assert_eq!(fv.get("PAY_STATUS_SEP05"), Some(2.0));
        assert_eq!(fv.get("PAY_STATUS_MAY05"), Some(-2.0));
        assert_eq!(fv.get("BILL_AMT_JUL05"), Some(30.0));
        assert_eq!(fv.get("PAY_AMT_APR05"), Some(6.0));
    }

    #[test]
    fn test_every_category_combination() {
        for education in Education::ALL {
            for marital_status in MaritalStatus::FORM_CHOICES {
                for sex in Sex::ALL {
                    let fv = build(&profile(sex, marital_status, education));
                    assert_eq!(fv.iter().count(), FEATURE_COUNT);

                    let edu: f64 = ["EDUCATION_HIGHSCHOOL", "EDUCATION_GRADUATE", "EDUCATION_POSTGRAD"]
                        .iter()
                        .map(|n| fv.get(n).unwrap())
                        .sum();
                    let expected_edu = if education == Education::None { 0.0 } else { 1.0 };
                    assert_eq!(edu, expected_edu, "{education:?}");

                    let marriage = fv.get("MARRIAGE_MARRIED").unwrap() + fv.get("MARRIAGE_SINGLE").unwrap();
                    assert_eq!(marriage, 1.0);

                    let gender = fv.get("GENDER").unwrap();
                    assert!(gender == 0.0 || gender == 1.0);
                }
            }
        }
    }

    #[test]
    fn test_other_marital_status_is_all_zero() {
        let fv = build(&profile(Sex::Male, MaritalStatus::Other, Education::None));
        assert_eq!(fv.get("MARRIAGE_MARRIED"), Some(0.0));
        assert_eq!(fv.get("MARRIAGE_SINGLE"), Some(0.0));
    }

    #[test]
    fn test_project_reorders_and_selects() {
        let fv = build(&profile(Sex::Male, MaritalStatus::Single, Education::Postgraduate));
        let projected = fv.project(&["AGE", "EDUCATION_POSTGRAD", "LIMIT_BAL"]).unwrap();
        assert_eq!(projected, vec![41.0, 1.0, 90_000.0]);
    }

    #[test]
    fn test_project_missing_feature() {
        let fv = build(&CustomerProfile::default());
        match fv.project(&["AGE", "INCOME"]) {
            Err(Error::FeatureMismatch { feature }) => assert_eq!(feature, "INCOME"),
            other => panic!("expected FeatureMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_codebook() {
        assert_eq!(Sex::from_code(1).unwrap(), Sex::Male);
        assert_eq!(Sex::from_code(2).unwrap(), Sex::Female);
        assert!(matches!(Sex::from_code(0), Err(Error::UnknownCode { field: "SEX", code: 0 })));
        assert_eq!(Education::from_code(1), Education::Postgraduate);
        assert_eq!(Education::from_code(3), Education::HighSchool);
        assert_eq!(Education::from_code(5), Education::None);
        assert_eq!(MaritalStatus::from_code(3), MaritalStatus::Other);
    }
}
