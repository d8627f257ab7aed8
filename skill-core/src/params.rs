//! Typed parameter parsing with aggregated errors.
//!
//! A [`ParamReader`] records every field failure instead of stopping at the
//! first one. Required getters return a placeholder value on failure, so
//! values read from a reader are only meaningful once [`ParamReader::finish`]
//! has returned `Ok`.

use std::ops::RangeInclusive;

use serde_json::{Map, Value};

use crate::envelope::Params;
use crate::error::{FieldError, SkillError};

/// Longest string accepted by default for free-text fields.
pub const DEFAULT_MAX_LEN: usize = 100_000;

/// Reads and validates fields from an action's params.
#[derive(Debug)]
pub struct ParamReader<'a> {
    params: &'a Params,
    errors: Vec<FieldError>,
}

impl<'a> ParamReader<'a> {
    #[must_use]
    pub fn new(params: &'a Params) -> Self {
        Self { params, errors: Vec::new() }
    }

    /// Records a failure for `field`.
    pub fn reject(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.push(FieldError::new(field, reason));
    }

    /// Returns `true` when `field` is present and not `null`.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.present(field).is_some()
    }

    /// Ends validation.
    ///
    /// # Errors
    /// Returns [`SkillError::InvalidParams`] carrying every recorded failure.
    pub fn finish(self) -> Result<(), SkillError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(SkillError::InvalidParams(self.errors))
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.params.get(field).filter(|v| !v.is_null())
    }

    fn missing(&mut self, field: &str) {
        self.reject(field, "is required");
    }

    // ── strings ──────────────────────────────────────────────────────────────

    /// A required non-empty string of at most [`DEFAULT_MAX_LEN`] characters.
    pub fn string(&mut self, field: &str) -> String {
        self.string_max(field, DEFAULT_MAX_LEN)
    }

    /// A required non-empty string of at most `max` characters.
    pub fn string_max(&mut self, field: &str, max: usize) -> String {
        match self.opt_string_max(field, max) {
            Some(s) => s,
            None => {
                if !self.has(field) {
                    self.missing(field);
                }
                String::new()
            }
        }
    }

    /// An optional non-empty string of at most [`DEFAULT_MAX_LEN`] characters.
    pub fn opt_string(&mut self, field: &str) -> Option<String> {
        self.opt_string_max(field, DEFAULT_MAX_LEN)
    }

    /// An optional non-empty string of at most `max` characters.
    pub fn opt_string_max(&mut self, field: &str, max: usize) -> Option<String> {
        let value = self.present(field)?;
        let Some(s) = value.as_str() else {
            self.reject(field, "must be a string");
            return None;
        };
        if s.trim().is_empty() {
            self.reject(field, "must not be empty");
            return None;
        }
        if s.chars().count() > max {
            self.reject(field, format!("must be at most {max} characters"));
            return None;
        }
        Some(s.to_owned())
    }

    // ── identifiers ──────────────────────────────────────────────────────────

    /// A required string parsed by `parse` into its canonical form.
    pub fn id<T: Default>(&mut self, field: &str, parse: impl Fn(&str) -> Result<T, String>) -> T {
        match self.opt_id(field, parse) {
            Some(v) => v,
            None => {
                if !self.has(field) {
                    self.missing(field);
                }
                T::default()
            }
        }
    }

    /// An optional string parsed by `parse` into its canonical form.
    pub fn opt_id<T>(&mut self, field: &str, parse: impl Fn(&str) -> Result<T, String>) -> Option<T> {
        let value = self.present(field)?;
        let Some(s) = value.as_str() else {
            self.reject(field, "must be a string");
            return None;
        };
        match parse(s) {
            Ok(v) => Some(v),
            Err(reason) => {
                self.reject(field, reason);
                None
            }
        }
    }

    /// A required non-empty array of strings, each parsed by `parse`.
    pub fn id_list<T>(
        &mut self,
        field: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Vec<T> {
        match self.opt_id_list(field, parse) {
            Some(v) if !v.is_empty() => v,
            Some(_) => {
                self.reject(field, "must not be empty");
                Vec::new()
            }
            None => {
                if !self.has(field) {
                    self.missing(field);
                }
                Vec::new()
            }
        }
    }

    /// An optional array of strings, each parsed by `parse`.
    ///
    /// Element failures are reported as `field[index]`.
    pub fn opt_id_list<T>(
        &mut self,
        field: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Option<Vec<T>> {
        let value = self.present(field)?;
        let Some(items) = value.as_array() else {
            self.reject(field, "must be an array of strings");
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let parsed = item
                .as_str()
                .ok_or_else(|| "must be a string".to_owned())
                .and_then(&parse);
            match parsed {
                Ok(v) => out.push(v),
                Err(reason) => {
                    self.reject(&format!("{field}[{i}]"), reason);
                    ok = false;
                }
            }
        }
        ok.then_some(out)
    }

    /// A required array of non-empty strings with between `len.start()` and
    /// `len.end()` elements.
    pub fn string_list(&mut self, field: &str, len: RangeInclusive<usize>) -> Vec<String> {
        let Some(value) = self.present(field) else {
            self.missing(field);
            return Vec::new();
        };
        let Some(items) = value.as_array() else {
            self.reject(field, "must be an array of strings");
            return Vec::new();
        };
        if !len.contains(&items.len()) {
            self.reject(
                field,
                format!("must contain between {} and {} items", len.start(), len.end()),
            );
            return Vec::new();
        }
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) if !s.trim().is_empty() => out.push(s.to_owned()),
                _ => self.reject(&format!("{field}[{i}]"), "must be a non-empty string"),
            }
        }
        out
    }

    // ── enums ────────────────────────────────────────────────────────────────

    /// An optional string restricted to `allowed`.
    pub fn opt_one_of(&mut self, field: &str, allowed: &[&'static str]) -> Option<&'static str> {
        let value = self.present(field)?;
        let found = value
            .as_str()
            .and_then(|s| allowed.iter().copied().find(|a| *a == s));
        if found.is_none() {
            self.reject(field, format!("must be one of: {}", allowed.join(", ")));
        }
        found
    }

    // ── numbers and booleans ─────────────────────────────────────────────────

    /// An optional integer inside `range`. Values outside the range, fractional
    /// numbers and numeric strings are rejected, never clamped.
    pub fn opt_int(&mut self, field: &str, range: RangeInclusive<i64>) -> Option<i64> {
        let value = self.present(field)?;
        let Some(n) = value.as_i64() else {
            self.reject(field, "must be an integer");
            return None;
        };
        if !range.contains(&n) {
            self.reject(
                field,
                format!("must be between {} and {}", range.start(), range.end()),
            );
            return None;
        }
        Some(n)
    }

    /// Like [`Self::opt_int`] but falls back to `default` when absent.
    pub fn int_or(&mut self, field: &str, range: RangeInclusive<i64>, default: i64) -> i64 {
        self.opt_int(field, range).unwrap_or(default)
    }

    /// An optional boolean.
    pub fn opt_bool(&mut self, field: &str) -> Option<bool> {
        let value = self.present(field)?;
        let b = value.as_bool();
        if b.is_none() {
            self.reject(field, "must be a boolean");
        }
        b
    }

    // ── structured values ────────────────────────────────────────────────────

    /// A required JSON object.
    pub fn object(&mut self, field: &str) -> Map<String, Value> {
        match self.opt_object(field) {
            Some(m) => m,
            None => {
                if !self.has(field) {
                    self.missing(field);
                }
                Map::new()
            }
        }
    }

    /// An optional JSON object.
    pub fn opt_object(&mut self, field: &str) -> Option<Map<String, Value>> {
        let value = self.present(field)?;
        let map = value.as_object().cloned();
        if map.is_none() {
            self.reject(field, "must be an object");
        }
        map
    }

    /// An optional JSON array, passed through untouched.
    pub fn opt_array(&mut self, field: &str) -> Option<Vec<Value>> {
        let value = self.present(field)?;
        let items = value.as_array().cloned();
        if items.is_none() {
            self.reject(field, "must be an array");
        }
        items
    }

    /// An optional value of any JSON type except `null`.
    #[must_use]
    pub fn opt_value(&self, field: &str) -> Option<Value> {
        self.present(field).cloned()
    }
}
