//! Declarative field validation
//!
//! An endpoint describes the fields it reads as a list of
//! [`FieldDescriptor`]s. [`validate_all`] runs the required ones in order and
//! stops at the first failure. The outcome is binary: callers learn whether
//! the request is acceptable, never which field was wrong.

use super::extractors::{Extractor, FieldSource};
use super::validators::Validator;

/// Whether an endpoint needs a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// One request field: where to read it and how to judge it
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor<'a> {
    pub name: &'static str,
    pub extractor: Extractor,
    pub validator: Option<Validator<'a>>,
    pub required: bool,
    pub allow_empty: bool,
}

impl<'a> FieldDescriptor<'a> {
    /// Optional field, empty allowed. Use [`with_presence`](Self::with_presence)
    /// to mark it required.
    pub fn new(name: &'static str, extractor: Extractor, validator: Validator<'a>) -> Self {
        Self {
            name,
            extractor,
            validator: Some(validator),
            required: false,
            allow_empty: true,
        }
    }

    /// `required` and `allow_empty` are always complementary here.
    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.required = presence == Presence::Required;
        self.allow_empty = !self.required;
        self
    }

    pub fn extract<'s, S>(&self, source: &'s S) -> &'s str
    where
        S: FieldSource + ?Sized,
    {
        self.extractor.extract(self.name, source)
    }

    fn accepts(&self, raw: &str) -> bool {
        match self.validator {
            Some(validator) => validator.validate(raw, self.allow_empty),
            // no rule to apply: only emptiness can fail
            None => self.allow_empty || !raw.is_empty(),
        }
    }
}

/// Marker for a request that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected;

/// Raw values of every descriptor, in descriptor order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    entries: Vec<(&'static str, String)>,
}

impl ValidatedFields {
    /// Value of the named field, `""` when the field was absent.
    pub fn value(&self, name: &str) -> &str {
        self.entries
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default()
    }

    pub fn values(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, value)| value.as_str()).collect()
    }
}

pub type ValidationOutcome = Result<ValidatedFields, Rejected>;

/// Validate every required descriptor against `source`.
///
/// When every required field tolerates emptiness and `allow_all_empty` is
/// false, a request that leaves all of them empty is rejected up front.
pub fn validate_all<S>(
    descriptors: &[FieldDescriptor<'_>],
    source: &S,
    allow_all_empty: bool,
) -> ValidationOutcome
where
    S: FieldSource + ?Sized,
{
    let required = || descriptors.iter().filter(|field| field.required);

    let all_allow_empty = required().all(|field| field.allow_empty);
    if all_allow_empty && !allow_all_empty {
        let all_empty = required().all(|field| field.extract(source).is_empty());
        if all_empty {
            return Err(Rejected);
        }
    }

    for field in required() {
        if !field.accepts(field.extract(source)) {
            tracing::debug!(
                field = field.name,
                validator = field.validator.map_or("non_empty", |v| v.name()),
                "field rejected"
            );
            return Err(Rejected);
        }
    }

    Ok(ValidatedFields {
        entries: descriptors
            .iter()
            .map(|field| (field.name, field.extract(source).to_owned()))
            .collect(),
    })
}

/// Single-field form of [`validate_all`].
pub fn validate_data<S>(descriptor: FieldDescriptor<'_>, source: &S) -> ValidationOutcome
where
    S: FieldSource + ?Sized,
{
    validate_all(&[descriptor], source, descriptor.allow_empty)
}
