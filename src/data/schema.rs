//! Binding of raw source columns to typed [`Record`] fields.
//!
//! The dashboard workbook uses the original UCI column names with raw category
//! codes. The training extract spells the monthly columns out
//! (`PAY_STATUS_SEP05`, ...) and carries the categories already encoded:
//! `GENDER` as 0/1 and one-hot `EDUCATION_*` / `MARRIAGE_*` indicators. Both
//! layouts bind to the same [`Record`]; encoded categories are mapped back
//! onto the raw codebook. The first name listed for a field is the canonical one.

use super::model::{CellValue, Dataset, MONTHS, RawTable, Record};
use crate::error::{Error, Result};

/// A required column and the alternative headers it may appear under.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

const fn col(name: &'static str, aliases: &'static [&'static str]) -> ColumnSpec {
    ColumnSpec { name, aliases }
}

impl ColumnSpec {
    /// Index of the first header matching the canonical name or an alias.
    pub fn find(&self, table: &RawTable) -> Option<usize> {
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .find_map(|name| table.column_index(name))
    }
}

pub const CREDIT_LIMIT: ColumnSpec = col("LIMIT_BAL", &[]);
pub const SEX: ColumnSpec = col("SEX", &[]);
pub const EDUCATION: ColumnSpec = col("EDUCATION", &[]);
pub const MARRIAGE: ColumnSpec = col("MARRIAGE", &[]);
pub const AGE: ColumnSpec = col("AGE", &[]);

/// 1 = male, 0 = female.
pub const GENDER: ColumnSpec = col("GENDER", &[]);

/// One-hot education columns, in codebook order (codes 1, 2, 3).
pub const EDUCATION_INDICATORS: [ColumnSpec; 3] = [
    col("EDUCATION_POSTGRAD", &[]),
    col("EDUCATION_GRADUATE", &[]),
    col("EDUCATION_HIGHSCHOOL", &[]),
];

/// One-hot marriage columns, in codebook order (codes 1, 2).
pub const MARRIAGE_INDICATORS: [ColumnSpec; 2] =
    [col("MARRIAGE_MARRIED", &[]), col("MARRIAGE_SINGLE", &[])];

/// Category code for "not recorded": no indicator set, or no marriage column.
/// Falls outside the codebook, so it reads as `None` / `Other`.
pub const UNRECORDED_CODE: i64 = 0;

const MALE_CODE: i64 = 1;
const FEMALE_CODE: i64 = 2;

pub const PAY_STATUS: [ColumnSpec; MONTHS] = [
    col("PAY_0", &["PAY_1", "PAY_STATUS_SEP05"]),
    col("PAY_2", &["PAY_STATUS_AUG05"]),
    col("PAY_3", &["PAY_STATUS_JUL05"]),
    col("PAY_4", &["PAY_STATUS_JUN05"]),
    col("PAY_5", &["PAY_STATUS_MAY05"]),
    col("PAY_6", &["PAY_STATUS_APR05"]),
];

pub const BILL_AMOUNT: [ColumnSpec; MONTHS] = [
    col("BILL_AMT1", &["BILL_AMT_SEP05"]),
    col("BILL_AMT2", &["BILL_AMT_AUG05"]),
    col("BILL_AMT3", &["BILL_AMT_JUL05"]),
    col("BILL_AMT4", &["BILL_AMT_JUN05"]),
    col("BILL_AMT5", &["BILL_AMT_MAY05"]),
    col("BILL_AMT6", &["BILL_AMT_APR05"]),
];

pub const PAY_AMOUNT: [ColumnSpec; MONTHS] = [
    col("PAY_AMT1", &["PAY_AMT_SEP05"]),
    col("PAY_AMT2", &["PAY_AMT_AUG05"]),
    col("PAY_AMT3", &["PAY_AMT_JUL05"]),
    col("PAY_AMT4", &["PAY_AMT_JUN05"]),
    col("PAY_AMT5", &["PAY_AMT_MAY05"]),
    col("PAY_AMT6", &["PAY_AMT_APR05"]),
];

pub const DEFAULT_LABEL: ColumnSpec = col(
    "default payment next month",
    &["DEFAULT_NEXT_MONTH", "default.payment.next.month"],
);

/// Canonical header row, in the order the sample generator writes it.
pub fn canonical_headers() -> Vec<&'static str> {
    let mut headers = vec![CREDIT_LIMIT.name, SEX.name, EDUCATION.name, MARRIAGE.name, AGE.name];
    headers.extend(PAY_STATUS.iter().map(|c| c.name));
    headers.extend(BILL_AMOUNT.iter().map(|c| c.name));
    headers.extend(PAY_AMOUNT.iter().map(|c| c.name));
    headers.push(DEFAULT_LABEL.name);
    headers
}

impl Record {
    /// Cell texts in [`canonical_headers`] order.
    pub fn canonical_cells(&self) -> Vec<String> {
        let mut cells = vec![
            self.credit_limit.to_string(),
            self.sex.to_string(),
            self.education.to_string(),
            self.marriage.to_string(),
            self.age.to_string(),
        ];
        cells.extend(self.pay_status.iter().map(|v| v.to_string()));
        cells.extend(self.bill_amount.iter().map(|v| v.to_string()));
        cells.extend(self.pay_amount.iter().map(|v| v.to_string()));
        cells.push(u8::from(self.defaulted).to_string());
        cells
    }
}

// ---------------------------------------------------------------------------
// Column binding
// ---------------------------------------------------------------------------

/// Where the sex code is read from.
#[derive(Debug)]
enum SexColumn {
    Code(usize),
    Gender(usize),
}

/// Where a categorical code is read from.
#[derive(Debug)]
enum CategoryColumns<const N: usize> {
    Code(usize),
    /// Indicator `i` set means code `i + 1`.
    OneHot([usize; N]),
    Absent,
}

impl<const N: usize> CategoryColumns<N> {
    /// The raw code column wins; otherwise every indicator must be present.
    fn find(table: &RawTable, code: &ColumnSpec, indicators: &[ColumnSpec; N]) -> Option<Self> {
        if let Some(idx) = code.find(table) {
            return Some(Self::Code(idx));
        }
        let found: Vec<usize> = indicators.iter().filter_map(|c| c.find(table)).collect();
        <[usize; N]>::try_from(found).ok().map(Self::OneHot)
    }
}

/// Resolved column indices for every record field.
struct Binding {
    credit_limit: usize,
    age: usize,
    education: CategoryColumns<3>,
    sex: SexColumn,
    marriage: CategoryColumns<2>,
    pay_status: [usize; MONTHS],
    bill_amount: [usize; MONTHS],
    pay_amount: [usize; MONTHS],
    label: usize,
}

impl Binding {
    fn resolve(table: &RawTable) -> Result<Self> {
        let mut missing: Vec<&'static str> = Vec::new();

        let sex = match (SEX.find(table), GENDER.find(table)) {
            (Some(idx), _) => Some(SexColumn::Code(idx)),
            (None, Some(idx)) => Some(SexColumn::Gender(idx)),
            (None, None) => None,
        };
        if sex.is_none() {
            missing.push("SEX (or GENDER)");
        }
        let education = CategoryColumns::find(table, &EDUCATION, &EDUCATION_INDICATORS);
        if education.is_none() {
            missing.push("EDUCATION (or EDUCATION_POSTGRAD, EDUCATION_GRADUATE, EDUCATION_HIGHSCHOOL)");
        }
        let marriage = CategoryColumns::find(table, &MARRIAGE, &MARRIAGE_INDICATORS)
            .unwrap_or(CategoryColumns::Absent);

        let mut find = |spec: &ColumnSpec| {
            spec.find(table).unwrap_or_else(|| {
                missing.push(spec.name);
                usize::MAX
            })
        };
        let credit_limit = find(&CREDIT_LIMIT);
        let age = find(&AGE);
        let pay_status: [usize; MONTHS] = std::array::from_fn(|m| find(&PAY_STATUS[m]));
        let bill_amount: [usize; MONTHS] = std::array::from_fn(|m| find(&BILL_AMOUNT[m]));
        let pay_amount: [usize; MONTHS] = std::array::from_fn(|m| find(&PAY_AMOUNT[m]));
        let label = find(&DEFAULT_LABEL);

        match (sex, education) {
            (Some(sex), Some(education)) if missing.is_empty() => Ok(Binding {
                credit_limit,
                age,
                education,
                sex,
                marriage,
                pay_status,
                bill_amount,
                pay_amount,
                label,
            }),
            _ => Err(Error::SchemaMismatch(format!(
                "missing column(s): {}",
                missing.join(", ")
            ))),
        }
    }

    /// Convert one data row. `row` is 1-based (the first row after the header).
    fn record(&self, table: &RawTable, cells: &[CellValue], row: usize) -> Result<Record> {
        let reader = RowReader { table, cells, row };
        let mut pay_status = [0; MONTHS];
        let mut bill_amount = [0.0; MONTHS];
        let mut pay_amount = [0.0; MONTHS];
        for m in 0..MONTHS {
            pay_status[m] = reader.code(self.pay_status[m])?;
            bill_amount[m] = reader.number(self.bill_amount[m])?;
            pay_amount[m] = reader.number(self.pay_amount[m])?;
        }
        let sex = match self.sex {
            SexColumn::Code(idx) => reader.code(idx)?,
            SexColumn::Gender(idx) => {
                if reader.flag(idx, "GENDER must be 0 or 1")? {
                    MALE_CODE
                } else {
                    FEMALE_CODE
                }
            }
        };
        Ok(Record {
            credit_limit: reader.number(self.credit_limit)?,
            age: reader.age(self.age)?,
            education: reader.category(&self.education)?,
            sex,
            marriage: reader.category(&self.marriage)?,
            pay_status,
            bill_amount,
            pay_amount,
            defaulted: reader.flag(self.label, "outcome label must be 0 or 1")?,
        })
    }
}

struct RowReader<'a> {
    table: &'a RawTable,
    cells: &'a [CellValue],
    row: usize,
}

impl RowReader<'_> {
    fn cell(&self, idx: usize) -> &CellValue {
        self.cells.get(idx).unwrap_or(&CellValue::Null)
    }

    fn invalid(&self, idx: usize, reason: &str) -> Error {
        Error::InvalidRow {
            row: self.row,
            column: self.table.headers.get(idx).cloned().unwrap_or_default(),
            reason: format!("{reason}, got '{}'", self.cell(idx)),
        }
    }

    fn number(&self, idx: usize) -> Result<f64> {
        self.cell(idx)
            .as_f64()
            .ok_or_else(|| self.invalid(idx, "expected a number"))
    }

    fn code(&self, idx: usize) -> Result<i64> {
        self.cell(idx)
            .as_i64()
            .ok_or_else(|| self.invalid(idx, "expected an integer code"))
    }

    fn age(&self, idx: usize) -> Result<u32> {
        self.cell(idx)
            .as_i64()
            .and_then(|a| u32::try_from(a).ok())
            .ok_or_else(|| self.invalid(idx, "expected a non-negative whole number"))
    }

    fn flag(&self, idx: usize, reason: &str) -> Result<bool> {
        match self.cell(idx) {
            CellValue::Bool(b) => Ok(*b),
            other => match other.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(self.invalid(idx, reason)),
            },
        }
    }

    fn category<const N: usize>(&self, columns: &CategoryColumns<N>) -> Result<i64> {
        match columns {
            CategoryColumns::Code(idx) => self.code(*idx),
            CategoryColumns::OneHot(indicators) => {
                let mut code = UNRECORDED_CODE;
                for (i, &idx) in indicators.iter().enumerate() {
                    if !self.flag(idx, "indicator must be 0 or 1")? {
                        continue;
                    }
                    if code != UNRECORDED_CODE {
                        return Err(self.invalid(idx, "more than one indicator set"));
                    }
                    code = i as i64 + 1;
                }
                Ok(code)
            }
            CategoryColumns::Absent => Ok(UNRECORDED_CODE),
        }
    }
}

impl Dataset {
    /// Bind a raw table to the record schema.
    ///
    /// Fails with [`Error::SchemaMismatch`] naming every absent column, or
    /// with [`Error::InvalidRow`] on the first cell that does not fit its field.
    pub fn from_table(table: &RawTable) -> Result<Self> {
        let binding = Binding::resolve(table)?;
        table
            .rows
            .iter()
            .enumerate()
            .map(|(i, cells)| binding.record(table, cells, i + 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    fn canonical_row(age: i64, label: CellValue) -> Vec<CellValue> {
        let mut row = vec![
            CellValue::Integer(80_000),
            CellValue::Integer(1),
            CellValue::Integer(2),
            CellValue::Integer(1),
            CellValue::Integer(age),
        ];
        row.extend((0..MONTHS).map(|m| CellValue::Integer(m as i64 - 1)));
        row.extend((0..MONTHS).map(|m| CellValue::Float(1000.0 * m as f64)));
        row.extend((0..MONTHS).map(|_| CellValue::String("250.5".into())));
        row.push(label);
        row
    }

    #[test]
    fn test_from_table_canonical() {
        let table = table_with(
            &canonical_headers(),
            vec![canonical_row(31, CellValue::Integer(1))],
        );
        let ds = Dataset::from_table(&table).unwrap();
        assert_eq!(ds.len(), 1);
        let r = ds.records[0];
        assert_eq!(r.credit_limit, 80_000.0);
        assert_eq!(r.age, 31);
        assert_eq!((r.sex, r.education, r.marriage), (1, 2, 1));
        assert_eq!(r.pay_status, [-1, 0, 1, 2, 3, 4]);
        assert_eq!(r.bill_amount[5], 5000.0);
        assert_eq!(r.pay_amount, [250.5; MONTHS]);
        assert!(r.defaulted);
    }

    /// Header row of the training extract, `ID` column included.
    fn extract_headers() -> Vec<&'static str> {
        vec![
            "ID", "LIMIT_BAL", "GENDER", "EDUCATION_POSTGRAD", "EDUCATION_GRADUATE",
            "EDUCATION_HIGHSCHOOL", "MARRIAGE_MARRIED", "MARRIAGE_SINGLE", "AGE",
            "PAY_STATUS_SEP05", "PAY_STATUS_AUG05", "PAY_STATUS_JUL05", "PAY_STATUS_JUN05",
            "PAY_STATUS_MAY05", "PAY_STATUS_APR05", "BILL_AMT_SEP05", "BILL_AMT_AUG05",
            "BILL_AMT_JUL05", "BILL_AMT_JUN05", "BILL_AMT_MAY05", "BILL_AMT_APR05",
            "PAY_AMT_SEP05", "PAY_AMT_AUG05", "PAY_AMT_JUL05", "PAY_AMT_JUN05",
            "PAY_AMT_MAY05", "PAY_AMT_APR05", "DEFAULT_NEXT_MONTH",
        ]
    }

    /// `gender`, then the education and marriage indicators.
    fn extract_row(id: i64, gender: i64, education: [i64; 3], marriage: [i64; 2], label: i64) -> Vec<CellValue> {
        let mut row = vec![
            CellValue::Integer(id),
            CellValue::Integer(20_000),
            CellValue::Integer(gender),
        ];
        row.extend(education.iter().map(|&v| CellValue::Integer(v)));
        row.extend(marriage.iter().map(|&v| CellValue::Integer(v)));
        row.push(CellValue::Integer(24));
        row.extend((0..MONTHS).map(|m| CellValue::Integer(2 - m as i64)));
        row.extend((0..MONTHS).map(|_| CellValue::Float(3913.0)));
        row.extend((0..MONTHS).map(|m| CellValue::Integer(if m == 1 { 689 } else { 0 })));
        row.push(CellValue::Integer(label));
        row
    }

    #[test]
    fn test_from_table_training_extract() {
        let table = table_with(
            &extract_headers(),
            vec![
                extract_row(1, 0, [0, 1, 0], [1, 0], 1),
                extract_row(2, 1, [1, 0, 0], [0, 1], 0),
                extract_row(3, 1, [0, 0, 1], [0, 0], 0),
                extract_row(4, 0, [0, 0, 0], [0, 1], 1),
            ],
        );
        let ds = Dataset::from_table(&table).unwrap();
        let codes: Vec<_> = ds.iter().map(|r| (r.sex, r.education, r.marriage)).collect();
        assert_eq!(
            codes,
            vec![
                (FEMALE_CODE, 2, 1),
                (MALE_CODE, 1, 2),
                (MALE_CODE, 3, UNRECORDED_CODE),
                (FEMALE_CODE, UNRECORDED_CODE, 2),
            ]
        );
        let r = ds.records[0];
        assert_eq!(r.credit_limit, 20_000.0);
        assert_eq!(r.age, 24);
        assert_eq!(r.pay_status, [2, 1, 0, -1, -2, -3]);
        assert_eq!(r.pay_amount[1], 689.0);
        assert!(r.defaulted);
    }

    #[test]
    fn test_extract_rows_map_through_codebook() {
        use crate::scoring::{CustomerProfile, Education, MaritalStatus, Sex};

        let table = table_with(&extract_headers(), vec![extract_row(1, 1, [0, 0, 1], [0, 0], 0)]);
        let ds = Dataset::from_table(&table).unwrap();
        let profile = CustomerProfile::from_record(&ds.records[0]).unwrap();
        assert_eq!(profile.sex, Sex::Male);
        assert_eq!(profile.education, Education::HighSchool);
        assert_eq!(profile.marital_status, MaritalStatus::Other);
    }

    #[test]
    fn test_conflicting_indicators_rejected() {
        let table = table_with(
            &extract_headers(),
            vec![extract_row(1, 1, [1, 1, 0], [1, 0], 0)],
        );
        match Dataset::from_table(&table) {
            Err(Error::InvalidRow { row, column, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "EDUCATION_GRADUATE");
            }
            other => panic!("expected InvalidRow, got {other:?}"),
        }

        let table = table_with(&extract_headers(), vec![extract_row(1, 2, [1, 0, 0], [1, 0], 0)]);
        assert!(matches!(
            Dataset::from_table(&table),
            Err(Error::InvalidRow { ref column, .. }) if column == "GENDER"
        ));
    }

    #[test]
    fn test_marriage_column_is_optional() {
        let headers: Vec<&str> = canonical_headers()
            .into_iter()
            .filter(|h| *h != MARRIAGE.name)
            .collect();
        let mut row = canonical_row(52, CellValue::Integer(0));
        row.remove(3);
        let ds = Dataset::from_table(&table_with(&headers, vec![row])).unwrap();
        assert_eq!(ds.records[0].marriage, UNRECORDED_CODE);
        assert_eq!((ds.records[0].sex, ds.records[0].education), (1, 2));
    }

    #[test]
    fn test_partial_indicator_set_is_missing() {
        let headers: Vec<&str> = extract_headers()
            .into_iter()
            .filter(|h| *h != "EDUCATION_HIGHSCHOOL")
            .collect();
        match Dataset::from_table(&table_with(&headers, vec![])) {
            Err(Error::SchemaMismatch(msg)) => {
                assert!(msg.contains("EDUCATION_HIGHSCHOOL"));
                assert!(!msg.contains("GENDER)"));
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_canonical_cells_bind_back() {
        let mut r = crate::data::model::fixtures::record(33, 20_000.0, true);
        r.pay_status[2] = -2;
        r.bill_amount[0] = 1234.5;
        let row = r.canonical_cells().iter().map(|c| CellValue::guess(c)).collect();
        let ds = Dataset::from_table(&table_with(&canonical_headers(), vec![row])).unwrap();
        assert_eq!(ds.records[0], r);
    }

    #[test]
    fn test_missing_columns_are_all_reported() {
        let table = table_with(&["LIMIT_BAL", "AGE"], vec![]);
        match Dataset::from_table(&table) {
            Err(Error::SchemaMismatch(msg)) => {
                assert!(msg.contains("SEX"));
                assert!(msg.contains("PAY_AMT6"));
                assert!(msg.contains("default payment next month"));
                assert!(!msg.contains("LIMIT_BAL"));
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_label_rejected() {
        let table = table_with(
            &canonical_headers(),
            vec![
                canonical_row(30, CellValue::Integer(0)),
                canonical_row(30, CellValue::Integer(2)),
            ],
        );
        match Dataset::from_table(&table) {
            Err(Error::InvalidRow { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "default payment next month");
            }
            other => panic!("expected InvalidRow, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_age_rejected() {
        let table = table_with(&canonical_headers(), vec![canonical_row(-3, CellValue::Integer(0))]);
        assert!(matches!(
            Dataset::from_table(&table),
            Err(Error::InvalidRow { ref column, .. }) if column == "AGE"
        ));
    }
}
