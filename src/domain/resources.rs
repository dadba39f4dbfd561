//! Resource kinds managed by the dashboard and their list DTOs.
//!
//! Every listing screen is parameterised by a [`ResourceKind`]. Rows coming
//! back from the backend are decoded into the closed [`Record`] set, and each
//! DTO declares its own typed table columns through [`Tabular`], so a column
//! can only read fields that its resource actually has.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::RentAdminError;
use crate::domain::offer::offer_countdown;
use crate::domain::status::{ApprovalStatus, ReviewFlow};

/// Filter key the status tabs write into.
pub const APPROVAL_STATUS_FILTER: &str = "approvalStatus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Vehicles,
    Companies,
    Brands,
    Categories,
    Locations,
    Blogs,
    Promotions,
    MetaData,
    Coupons,
    CareerApplications,
    VehicleSeries,
}

impl ResourceKind {
    pub const ALL: [Self; 11] = [
        Self::Vehicles,
        Self::Companies,
        Self::Brands,
        Self::Categories,
        Self::Locations,
        Self::Blogs,
        Self::Promotions,
        Self::MetaData,
        Self::Coupons,
        Self::CareerApplications,
        Self::VehicleSeries,
    ];

    /// Listing name, used in endpoint paths and cache keys.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Vehicles => "vehicles",
            Self::Companies => "companies",
            Self::Brands => "brands",
            Self::Categories => "categories",
            Self::Locations => "locations",
            Self::Blogs => "blogs",
            Self::Promotions => "promotions",
            Self::MetaData => "meta-data",
            Self::Coupons => "coupons",
            Self::CareerApplications => "career-applications",
            Self::VehicleSeries => "vehicle-series",
        }
    }

    /// Heading shown above the table.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Vehicles => "Vehicles",
            Self::Companies => "Companies",
            Self::Brands => "Brands",
            Self::Categories => "Categories",
            Self::Locations => "Locations",
            Self::Blogs => "Blogs",
            Self::Promotions => "Promotions",
            Self::MetaData => "Meta Data",
            Self::Coupons => "Coupons",
            Self::CareerApplications => "Career Applications",
            Self::VehicleSeries => "Vehicle Series",
        }
    }

    /// Plural noun used in messages such as "No vehicles found".
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Vehicles => "vehicles",
            Self::Companies => "companies",
            Self::Brands => "brands",
            Self::Categories => "categories",
            Self::Locations => "locations",
            Self::Blogs => "blogs",
            Self::Promotions => "promotions",
            Self::MetaData => "meta data entries",
            Self::Coupons => "coupons",
            Self::CareerApplications => "career applications",
            Self::VehicleSeries => "vehicle series",
        }
    }

    /// Filter keys that must be non-empty before the list may be fetched.
    #[must_use]
    pub const fn required_filters(self) -> &'static [&'static str] {
        match self {
            Self::Locations => &["stateId"],
            Self::VehicleSeries => &["brandId"],
            _ => &[],
        }
    }

    /// Whether rows of this resource carry an approval status.
    #[must_use]
    pub const fn has_approval(self) -> bool {
        matches!(self, Self::Vehicles | Self::Companies)
    }

    /// Column headers and widths of the listing table.
    #[must_use]
    pub fn headers(self) -> Vec<ColumnHeader> {
        match self {
            Self::Vehicles => column_headers::<Vehicle>(),
            Self::Companies => column_headers::<Company>(),
            Self::Brands => column_headers::<Brand>(),
            Self::Categories => column_headers::<Category>(),
            Self::Locations => column_headers::<Location>(),
            Self::Blogs => column_headers::<Blog>(),
            Self::Promotions => column_headers::<Promotion>(),
            Self::MetaData => column_headers::<MetaData>(),
            Self::Coupons => column_headers::<Coupon>(),
            Self::CareerApplications => column_headers::<CareerApplication>(),
            Self::VehicleSeries => column_headers::<VehicleSeries>(),
        }
    }

    /// Decodes one list item returned by the backend.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the item does not match the DTO shape.
    pub fn decode(self, value: serde_json::Value) -> Result<Record, serde_json::Error> {
        Ok(match self {
            Self::Vehicles => Record::Vehicle(serde_json::from_value(value)?),
            Self::Companies => Record::Company(serde_json::from_value(value)?),
            Self::Brands => Record::Brand(serde_json::from_value(value)?),
            Self::Categories => Record::Category(serde_json::from_value(value)?),
            Self::Locations => Record::Location(serde_json::from_value(value)?),
            Self::Blogs => Record::Blog(serde_json::from_value(value)?),
            Self::Promotions => Record::Promotion(serde_json::from_value(value)?),
            Self::MetaData => Record::MetaData(serde_json::from_value(value)?),
            Self::Coupons => Record::Coupon(serde_json::from_value(value)?),
            Self::CareerApplications => Record::CareerApplication(serde_json::from_value(value)?),
            Self::VehicleSeries => Record::VehicleSeries(serde_json::from_value(value)?),
        })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ResourceKind {
    type Err = RentAdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let normalized = match normalized.as_str() {
            "agents" => "companies",
            "series" | "supplier-central" => "vehicle-series",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| RentAdminError::Config(format!("unknown resource '{s}'")))
    }
}

/// Values a cell renderer may need besides the row itself.
#[derive(Debug, Clone, Copy)]
pub struct CellContext {
    pub now: DateTime<Utc>,
}

impl CellContext {
    #[must_use]
    pub fn now() -> Self {
        Self { now: Utc::now() }
    }
}

/// A typed column definition for rows of type `T`.
pub struct Column<T> {
    pub header: &'static str,
    pub width: usize,
    /// Whether search matches are highlighted in this column.
    pub searchable: bool,
    pub cell: fn(&T, &CellContext) -> String,
}

/// Implemented by every list DTO to declare its table layout.
pub trait Tabular: Sized + 'static {
    const COLUMNS: &'static [Column<Self>];

    fn cells(&self, ctx: &CellContext) -> Vec<String> {
        Self::COLUMNS.iter().map(|column| (column.cell)(self, ctx)).collect()
    }
}

/// Untyped header information handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub title: &'static str,
    pub width: usize,
    pub searchable: bool,
}

fn column_headers<T: Tabular>() -> Vec<ColumnHeader> {
    T::COLUMNS
        .iter()
        .map(|column| ColumnHeader {
            title: column.header,
            width: column.width,
            searchable: column.searchable,
        })
        .collect()
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string())
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub model_name: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    pub approval_status: ApprovalStatus,
    /// Set when an approved listing has edits awaiting review.
    #[serde(default)]
    pub is_modified: bool,
}

impl Tabular for Vehicle {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |v, _| v.id.clone() },
        Column { header: "MODEL", width: 24, searchable: true, cell: |v, _| v.model_name.clone() },
        Column { header: "BRAND", width: 14, searchable: false, cell: |v, _| or_dash(v.brand_name.as_deref()) },
        Column {
            header: "REG. NO",
            width: 12,
            searchable: false,
            cell: |v, _| or_dash(v.registration_number.as_deref()),
        },
        Column { header: "COMPANY", width: 20, searchable: false, cell: |v, _| or_dash(v.company_name.as_deref()) },
        Column { header: "STATUS", width: 14, searchable: false, cell: |v, _| v.approval_status.to_string() },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub company_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    pub approval_status: ApprovalStatus,
    #[serde(default)]
    pub is_modified: bool,
}

impl Tabular for Company {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |c, _| c.id.clone() },
        Column { header: "COMPANY", width: 24, searchable: true, cell: |c, _| c.company_name.clone() },
        Column { header: "EMAIL", width: 24, searchable: false, cell: |c, _| or_dash(c.email.as_deref()) },
        Column { header: "PHONE", width: 14, searchable: false, cell: |c, _| or_dash(c.phone.as_deref()) },
        Column { header: "CITY", width: 12, searchable: false, cell: |c, _| or_dash(c.city.as_deref()) },
        Column { header: "STATUS", width: 14, searchable: false, cell: |c, _| c.approval_status.to_string() },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: String,
    pub brand_name: String,
    #[serde(default)]
    pub vehicle_category: Option<String>,
    #[serde(default)]
    pub brand_logo: Option<String>,
}

impl Tabular for Brand {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |b, _| b.id.clone() },
        Column { header: "BRAND", width: 24, searchable: true, cell: |b, _| b.brand_name.clone() },
        Column {
            header: "CATEGORY",
            width: 18,
            searchable: false,
            cell: |b, _| or_dash(b.vehicle_category.as_deref()),
        },
        Column { header: "LOGO", width: 6, searchable: false, cell: |b, _| yes_no(b.brand_logo.is_some()) },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

impl Tabular for Category {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |c, _| c.id.clone() },
        Column { header: "NAME", width: 28, searchable: true, cell: |c, _| c.name.clone() },
        Column { header: "ACTIVE", width: 8, searchable: false, cell: |c, _| yes_no(c.is_active) },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default)]
    pub is_popular: bool,
}

impl Tabular for Location {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |l, _| l.id.clone() },
        Column { header: "LOCATION", width: 24, searchable: true, cell: |l, _| l.name.clone() },
        Column { header: "STATE", width: 18, searchable: false, cell: |l, _| or_dash(l.state_name.as_deref()) },
        Column { header: "POPULAR", width: 8, searchable: false, cell: |l, _| yes_no(l.is_popular) },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Tabular for Blog {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |b, _| b.id.clone() },
        Column { header: "TITLE", width: 36, searchable: true, cell: |b, _| b.title.clone() },
        Column { header: "AUTHOR", width: 16, searchable: false, cell: |b, _| or_dash(b.author.as_deref()) },
        Column { header: "PUBLISHED", width: 11, searchable: false, cell: |b, _| date(b.published_at) },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Tabular for Promotion {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |p, _| p.id.clone() },
        Column { header: "TITLE", width: 28, searchable: true, cell: |p, _| p.title.clone() },
        Column { header: "COMPANY", width: 20, searchable: false, cell: |p, _| or_dash(p.company_name.as_deref()) },
        Column {
            header: "OFFER ENDS",
            width: 14,
            searchable: false,
            cell: |p, ctx| offer_countdown(p.ends_at, ctx.now),
        },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub id: String,
    pub page: String,
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: Option<String>,
}

impl Tabular for MetaData {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |m, _| m.id.clone() },
        Column { header: "PAGE", width: 20, searchable: true, cell: |m, _| m.page.clone() },
        Column { header: "META TITLE", width: 36, searchable: false, cell: |m, _| m.meta_title.clone() },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub discount_percentage: u32,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Tabular for Coupon {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |c, _| c.id.clone() },
        Column { header: "CODE", width: 16, searchable: true, cell: |c, _| c.code.clone() },
        Column { header: "DISCOUNT", width: 9, searchable: false, cell: |c, _| format!("{}%", c.discount_percentage) },
        Column {
            header: "VALIDITY",
            width: 14,
            searchable: false,
            cell: |c, ctx| offer_countdown(c.expires_at, ctx.now),
        },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerApplication {
    pub id: String,
    pub applicant_name: String,
    pub email: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
}

impl Tabular for CareerApplication {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |a, _| a.id.clone() },
        Column { header: "APPLICANT", width: 22, searchable: true, cell: |a, _| a.applicant_name.clone() },
        Column { header: "EMAIL", width: 24, searchable: false, cell: |a, _| a.email.clone() },
        Column { header: "POSITION", width: 18, searchable: false, cell: |a, _| or_dash(a.position.as_deref()) },
        Column { header: "APPLIED", width: 11, searchable: false, cell: |a, _| date(a.applied_at) },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSeries {
    pub id: String,
    pub series_name: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
}

impl Tabular for VehicleSeries {
    const COLUMNS: &'static [Column<Self>] = &[
        Column { header: "ID", width: 10, searchable: false, cell: |s, _| s.id.clone() },
        Column { header: "SERIES", width: 24, searchable: true, cell: |s, _| s.series_name.clone() },
        Column { header: "BRAND", width: 16, searchable: false, cell: |s, _| or_dash(s.brand_name.as_deref()) },
        Column { header: "CATEGORY", width: 16, searchable: false, cell: |s, _| or_dash(s.category_name.as_deref()) },
    ];
}

/// One listing row, tagged by resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Vehicle(Vehicle),
    Company(Company),
    Brand(Brand),
    Category(Category),
    Location(Location),
    Blog(Blog),
    Promotion(Promotion),
    MetaData(MetaData),
    Coupon(Coupon),
    CareerApplication(CareerApplication),
    VehicleSeries(VehicleSeries),
}

impl Record {
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Vehicle(_) => ResourceKind::Vehicles,
            Self::Company(_) => ResourceKind::Companies,
            Self::Brand(_) => ResourceKind::Brands,
            Self::Category(_) => ResourceKind::Categories,
            Self::Location(_) => ResourceKind::Locations,
            Self::Blog(_) => ResourceKind::Blogs,
            Self::Promotion(_) => ResourceKind::Promotions,
            Self::MetaData(_) => ResourceKind::MetaData,
            Self::Coupon(_) => ResourceKind::Coupons,
            Self::CareerApplication(_) => ResourceKind::CareerApplications,
            Self::VehicleSeries(_) => ResourceKind::VehicleSeries,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Vehicle(r) => &r.id,
            Self::Company(r) => &r.id,
            Self::Brand(r) => &r.id,
            Self::Category(r) => &r.id,
            Self::Location(r) => &r.id,
            Self::Blog(r) => &r.id,
            Self::Promotion(r) => &r.id,
            Self::MetaData(r) => &r.id,
            Self::Coupon(r) => &r.id,
            Self::CareerApplication(r) => &r.id,
            Self::VehicleSeries(r) => &r.id,
        }
    }

    /// The value shown in the searchable column.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Vehicle(r) => &r.model_name,
            Self::Company(r) => &r.company_name,
            Self::Brand(r) => &r.brand_name,
            Self::Category(r) => &r.name,
            Self::Location(r) => &r.name,
            Self::Blog(r) => &r.title,
            Self::Promotion(r) => &r.title,
            Self::MetaData(r) => &r.page,
            Self::Coupon(r) => &r.code,
            Self::CareerApplication(r) => &r.applicant_name,
            Self::VehicleSeries(r) => &r.series_name,
        }
    }

    #[must_use]
    pub const fn approval_status(&self) -> Option<ApprovalStatus> {
        match self {
            Self::Vehicle(r) => Some(r.approval_status),
            Self::Company(r) => Some(r.approval_status),
            _ => None,
        }
    }

    /// Review flow a status change on this record belongs to.
    #[must_use]
    pub const fn review_flow(&self) -> ReviewFlow {
        let modified = match self {
            Self::Vehicle(r) => r.is_modified,
            Self::Company(r) => r.is_modified,
            _ => false,
        };
        if modified {
            ReviewFlow::Modification
        } else {
            ReviewFlow::Registration
        }
    }

    #[must_use]
    pub fn cells(&self, ctx: &CellContext) -> Vec<String> {
        match self {
            Self::Vehicle(r) => r.cells(ctx),
            Self::Company(r) => r.cells(ctx),
            Self::Brand(r) => r.cells(ctx),
            Self::Category(r) => r.cells(ctx),
            Self::Location(r) => r.cells(ctx),
            Self::Blog(r) => r.cells(ctx),
            Self::Promotion(r) => r.cells(ctx),
            Self::MetaData(r) => r.cells(ctx),
            Self::Coupon(r) => r.cells(ctx),
            Self::CareerApplication(r) => r.cells(ctx),
            Self::VehicleSeries(r) => r.cells(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_vehicle_rows() {
        let value = serde_json::json!({
            "id": "v-1",
            "modelName": "Corolla",
            "brandName": "Toyota",
            "approvalStatus": "UNDER_REVIEW",
            "isModified": true
        });
        let record = ResourceKind::Vehicles.decode(value).unwrap();
        assert_eq!(record.id(), "v-1");
        assert_eq!(record.display_name(), "Corolla");
        assert_eq!(record.approval_status(), Some(ApprovalStatus::UnderReview));
        assert_eq!(record.review_flow(), ReviewFlow::Modification);
    }

    #[test]
    fn decode_rejects_mismatched_shapes() {
        let value = serde_json::json!({"id": "b-1"});
        assert!(ResourceKind::Brands.decode(value).is_err());
    }

    #[test]
    fn cells_line_up_with_headers() {
        let ctx = CellContext::now();
        let record = Record::Coupon(Coupon {
            id: "c-1".to_string(),
            code: "SUMMER10".to_string(),
            discount_percentage: 10,
            expires_at: None,
        });
        let cells = record.cells(&ctx);
        assert_eq!(cells.len(), ResourceKind::Coupons.headers().len());
        assert_eq!(cells[2], "10%");
        assert_eq!(cells[3], "no expiry");
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("agents".parse::<ResourceKind>().ok(), Some(ResourceKind::Companies));
        assert_eq!("meta_data".parse::<ResourceKind>().ok(), Some(ResourceKind::MetaData));
        assert!("invoices".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn prerequisites_are_declared_per_resource() {
        assert_eq!(ResourceKind::Locations.required_filters(), &["stateId"]);
        assert!(ResourceKind::Vehicles.required_filters().is_empty());
    }
}
