use std::cmp::Ordering;

use crate::{
    config::Config,
    models::property::{Property, PropertyFilter},
};

/// Property attributes that can be filtered and sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyField {
    Location,
    Price,
    Bedrooms,
    Bathrooms,
    Size,
    Amenities,
}

impl PropertyField {
    /// Unknown names resolve to `None`, callers skip the filter or sort.
    pub fn from_name(name: &str) -> Option<PropertyField> {
        match name {
            "location" => Some(PropertyField::Location),
            "price" => Some(PropertyField::Price),
            "bedrooms" => Some(PropertyField::Bedrooms),
            "bathrooms" => Some(PropertyField::Bathrooms),
            "size" => Some(PropertyField::Size),
            "amenities" => Some(PropertyField::Amenities),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
    Tags(&'a [String]),
}

impl Property {
    pub fn field_value(&self, field: PropertyField) -> Option<FieldValue<'_>> {
        match field {
            PropertyField::Location => Some(FieldValue::Text(&self.location)),
            PropertyField::Price => Some(FieldValue::Number(self.price)),
            PropertyField::Bedrooms => self.bedrooms.map(|b| FieldValue::Number(b.into())),
            PropertyField::Bathrooms => self.bathrooms.map(|b| FieldValue::Number(b.into())),
            PropertyField::Size => self.size.map(|s| FieldValue::Number(s.into())),
            PropertyField::Amenities => self.amenities.as_deref().map(FieldValue::Tags),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Min(f64),
    Max(f64),
    Equals(f64),
    Contains { needle: String, case_sensitive: bool },
    ContainsAll(Vec<String>),
}

impl Comparison {
    /// A value of the wrong shape for the comparison never matches.
    pub fn matches(&self, value: &FieldValue<'_>) -> bool {
        match (self, value) {
            (Comparison::Min(threshold), FieldValue::Number(v)) => v >= threshold,
            (Comparison::Max(threshold), FieldValue::Number(v)) => v <= threshold,
            (Comparison::Equals(expected), FieldValue::Number(v)) => v == expected,
            (
                Comparison::Contains {
                    needle,
                    case_sensitive,
                },
                FieldValue::Text(text),
            ) => {
                if *case_sensitive {
                    text.contains(needle.as_str())
                } else {
                    text.to_lowercase().contains(&needle.to_lowercase())
                }
            }
            (Comparison::ContainsAll(required), FieldValue::Tags(tags)) => {
                let present: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
                required
                    .iter()
                    .all(|r| present.contains(&r.to_lowercase()))
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterStep {
    pub field: PropertyField,
    pub comparison: Comparison,
}

impl PropertyFilter {
    /// The constraints of this filter in their fixed application order:
    /// location, min price, max price, bedrooms, bathrooms, min size, amenities.
    pub fn steps(&self, case_sensitive_location: bool) -> Vec<FilterStep> {
        let mut steps = Vec::new();

        if let Some(location) = self.location.as_ref().filter(|l| !l.is_empty()) {
            steps.push(FilterStep {
                field: PropertyField::Location,
                comparison: Comparison::Contains {
                    needle: location.clone(),
                    case_sensitive: case_sensitive_location,
                },
            });
        }
        if let Some(min_price) = self.min_price {
            steps.push(FilterStep {
                field: PropertyField::Price,
                comparison: Comparison::Min(min_price),
            });
        }
        if let Some(max_price) = self.max_price {
            steps.push(FilterStep {
                field: PropertyField::Price,
                comparison: Comparison::Max(max_price),
            });
        }
        if let Some(bedrooms) = self.bedrooms {
            steps.push(FilterStep {
                field: PropertyField::Bedrooms,
                comparison: Comparison::Equals(bedrooms.into()),
            });
        }
        if let Some(bathrooms) = self.bathrooms {
            steps.push(FilterStep {
                field: PropertyField::Bathrooms,
                comparison: Comparison::Equals(bathrooms.into()),
            });
        }
        if let Some(min_size) = self.min_size {
            steps.push(FilterStep {
                field: PropertyField::Size,
                comparison: Comparison::Min(min_size.into()),
            });
        }
        if let Some(amenities) = self.amenities.as_ref().filter(|a| !a.is_empty()) {
            steps.push(FilterStep {
                field: PropertyField::Amenities,
                comparison: Comparison::ContainsAll(amenities.clone()),
            });
        }

        steps
    }
}

/// Keeps the properties that have the step's attribute and satisfy its comparison.
pub fn apply_filter(properties: Vec<Property>, step: &FilterStep) -> Vec<Property> {
    properties
        .into_iter()
        .filter(|p| {
            p.field_value(step.field)
                .map(|value| step.comparison.matches(&value))
                .unwrap_or(false)
        })
        .collect()
}

pub fn filter_properties(
    properties: &[Property],
    filter: &PropertyFilter,
    case_sensitive_location: bool,
) -> Vec<Property> {
    filter
        .steps(case_sensitive_location)
        .iter()
        .fold(properties.to_vec(), apply_filter)
}

/// Case-insensitive substring match against title, location and amenities.
pub fn text_search(properties: Vec<Property>, query: &str) -> Vec<Property> {
    let query = query.to_lowercase();
    properties
        .into_iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&query)
                || p.location.to_lowercase().contains(&query)
                || p.amenity_list()
                    .iter()
                    .any(|a| a.to_lowercase().contains(&query))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, PartialOrd)]
enum SortValue {
    Missing,
    Number(f64),
    Text(String),
}

fn sort_value(property: &Property, field: PropertyField) -> SortValue {
    match property.field_value(field) {
        Some(FieldValue::Number(n)) => SortValue::Number(n),
        Some(FieldValue::Text(t)) => SortValue::Text(t.to_string()),
        Some(FieldValue::Tags(tags)) => SortValue::Text(tags.join(", ")),
        None => SortValue::Missing,
    }
}

/// Stable sort; properties without the attribute sort first in ascending order.
pub fn sort_properties(properties: &mut [Property], field: PropertyField, order: SortOrder) {
    properties.sort_by(|a, b| {
        let (a, b) = (sort_value(a, field), sort_value(b, field));
        let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery<'a> {
    pub text: Option<&'a str>,
    pub filter: Option<&'a PropertyFilter>,
    pub sort_by: Option<&'a str>,
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
}

/// Filter, text search, sort and limit over the merged properties.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    default_limit: usize,
    max_limit: usize,
    case_sensitive_location: bool,
}

impl SearchEngine {
    pub fn new(config: &Config) -> Self {
        SearchEngine {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            case_sensitive_location: config.case_sensitive_location,
        }
    }

    pub fn search(&self, properties: &[Property], query: &SearchQuery<'_>) -> Vec<Property> {
        let mut results = match query.filter {
            Some(filter) => filter_properties(properties, filter, self.case_sensitive_location),
            None => properties.to_vec(),
        };

        if let Some(text) = query.text.filter(|t| !t.is_empty()) {
            results = text_search(results, text);
        }

        if let Some(field) = query.sort_by.and_then(PropertyField::from_name) {
            sort_properties(&mut results, field, query.sort_order);
        }

        results.truncate(self.effective_limit(query.limit));
        results
    }

    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|l| *l > 0)
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}
