//! Lookup helpers for asserting on collected frames whose row order is
//! unspecified (anything coming out of a `group_by`).

use polars::prelude::*;

/// Index of the first row whose integer `column` equals `value`.
pub fn row_where_i64(df: &DataFrame, column: &str, value: i64) -> usize {
    let keys = df.column(column).unwrap().cast(&DataType::Int64).unwrap();
    let row = keys
        .i64()
        .unwrap()
        .into_iter()
        .position(|k| k == Some(value))
        .unwrap_or_else(|| panic!("no row with {column} == {value}"));
    row
}

/// Index of the first row whose string `column` equals `value`.
pub fn row_where_str(df: &DataFrame, column: &str, value: &str) -> usize {
    df.column(column)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .position(|k| k == Some(value))
        .unwrap_or_else(|| panic!("no row with {column} == {value}"))
}

pub fn f64_at(df: &DataFrame, column: &str, row: usize) -> f64 {
    df.column(column)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .get(row)
        .unwrap()
}

pub fn u32_at(df: &DataFrame, column: &str, row: usize) -> u32 {
    df.column(column)
        .unwrap()
        .cast(&DataType::UInt32)
        .unwrap()
        .u32()
        .unwrap()
        .get(row)
        .unwrap()
}

pub fn str_at(df: &DataFrame, column: &str, row: usize) -> Option<String> {
    df.column(column)
        .unwrap()
        .str()
        .unwrap()
        .get(row)
        .map(str::to_string)
}
