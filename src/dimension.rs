//! Dimension descriptors handed over by the query layer.

use serde::{Deserialize, Serialize};

/// Kind of a report field.
///
/// Unknown kinds deserialize to [`FieldType::Unsupported`] instead of failing, so
/// a request with an unexpected split type reaches validation and is reported
/// there as [`Error::InvalidSplitType`](crate::Error::InvalidSplitType).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Datetime,
    #[default]
    Fixed,
    Optional,
    Label,
    Tag,
    ProjectLabel,
    SystemLabel,
    Attribution,
    AttributionGroup,
    Gke,
    GkeLabel,
    #[serde(other)]
    Unsupported,
}

/// One dimension of the row layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimension {
    /// Opaque id, e.g. `fixed:country` or `attribution_group:teams`.
    pub id: String,
    /// Field key, e.g. `country`.
    pub key: String,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    /// Human readable label, e.g. `Country`.
    #[serde(default)]
    pub label: String,
    /// Plural caption used for "Other" groups, e.g. `countries`.
    #[serde(default)]
    pub plural: Option<String>,
}

impl Dimension {
    /// A fixed dimension with the given id and key.
    pub fn new<I: Into<String>, K: Into<String>>(id: I, key: K) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    #[must_use]
    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_plural<S: Into<String>>(mut self, plural: S) -> Self {
        self.plural = Some(plural.into());
        self
    }

    /// Caption used for this dimension's "Other" group.
    ///
    /// Attribution groups are captioned with their own label. Other dimensions use
    /// their declared plural and fall back to the standard report fields.
    #[must_use]
    pub fn plural_caption(&self) -> String {
        if self.field_type == FieldType::AttributionGroup {
            return self.label.clone();
        }
        self.plural
            .clone()
            .or_else(|| standard_plural(&self.key).map(str::to_string))
            .unwrap_or_default()
    }
}

/// Plural caption of a standard report field key.
#[must_use]
pub fn standard_plural(key: &str) -> Option<&'static str> {
    let plural = match key {
        "year" => "years",
        "quarter" => "quarters",
        "month" => "months",
        "week" => "weeks",
        "day" => "days",
        "hour" => "hours",
        "week_day" => "weekdays",
        "cloud_provider" => "cloud providers",
        "billing_account_id" => "billing accounts",
        "project_ancestry_names" => "folders",
        "project_id" => "Project/Account ids",
        "project_number" => "Project/Account numbers",
        "project_name" => "Project/Account names",
        "service_description" => "services",
        "sku_description" => "SKUs",
        "service_id" => "service ids",
        "sku_id" => "SKU ids",
        "operation" => "Operations",
        "resource_id" => "Resources",
        "resource_global_id" => "Global Resources",
        "country" => "countries",
        "region" => "regions",
        "zone" => "zones",
        "cost_type" => "cost types",
        "pricing_unit" => "pricing units",
        "credit" => "credits",
        "savings_description" => "Savings types",
        "customer_type" => "customer types",
        "is_marketplace" => "Marketplace",
        _ => return None,
    };
    Some(plural)
}

/// Position of the dimension with `id` in `dimensions`.
#[must_use]
pub fn position_of(dimensions: &[Dimension], id: &str) -> Option<usize> {
    dimensions.iter().position(|d| d.id == id)
}
