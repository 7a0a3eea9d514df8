//! Database rows and request/response payloads.
//!
//! Every monetary amount is an integer number of cents.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Supplier,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Supplier => "Supplier",
            Role::Client => "Client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Supplier" => Ok(Role::Supplier),
            "Client" => Ok(Role::Client),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub pwd_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Shared shape of the two catalog tables. Lets the catalog queries and
/// handlers be written once for parfums and components.
pub trait CatalogItem:
    for<'r> FromRow<'r, SqliteRow> + Serialize + Send + Unpin + 'static
{
    const TABLE: &'static str;
    const LABEL: &'static str;
    /// Child table and column holding order references to this row.
    const REFERENCED_BY: (&'static str, &'static str);

    fn id(&self) -> i64;
    fn supplier_id(&self) -> i64;
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Parfum {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub available_quantity: i64,
    pub image_url: Option<String>,
    pub supplier_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl CatalogItem for Parfum {
    const TABLE: &'static str = "parfums";
    const LABEL: &'static str = "Parfum";
    const REFERENCED_BY: (&'static str, &'static str) = ("order_items", "parfum_id");

    fn id(&self) -> i64 {
        self.id
    }

    fn supplier_id(&self) -> i64 {
        self.supplier_id
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Component {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Price per unit.
    pub price: i64,
    pub available_quantity: i64,
    pub image_url: Option<String>,
    pub supplier_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl CatalogItem for Component {
    const TABLE: &'static str = "components";
    const LABEL: &'static str = "Component";
    const REFERENCED_BY: (&'static str, &'static str) =
        ("custom_parfum_components", "component_id");

    fn id(&self) -> i64 {
        self.id
    }

    fn supplier_id(&self) -> i64 {
        self.supplier_id
    }
}

/// Body of catalog create and update requests.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CatalogInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub available_quantity: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "PascalCase")]
pub enum OrderStatus {
    #[serde(alias = "Pending")]
    Awaiting,
    Production,
    Delivered,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "PascalCase")]
pub enum OrderType {
    Standard,
    Custom,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub created_date: String,
    pub status: OrderStatus,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub total_price: i64,
}

/// An order line joined with the parfum it snapshots.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct OrderItemLine {
    pub id: i64,
    pub order_id: i64,
    pub parfum_id: i64,
    pub parfum_name: String,
    pub supplier_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct CustomParfum {
    pub id: i64,
    pub order_id: i64,
    pub name: String,
    pub price: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct CustomParfumComponentLine {
    pub id: i64,
    pub custom_parfum_id: i64,
    pub component_id: i64,
    pub component_name: String,
    pub supplier_id: i64,
    pub quantity: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CustomParfumDetails {
    #[serde(flatten)]
    pub custom_parfum: CustomParfum,
    pub components: Vec<CustomParfumComponentLine>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemLine>,
    pub custom_parfum: Option<CustomParfumDetails>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OrderLineRequest {
    #[serde(alias = "parfumId")]
    pub parfum_id: i64,
    pub quantity: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StandardOrderRequest {
    pub items: Vec<OrderLineRequest>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ComponentLineRequest {
    #[serde(alias = "componentId")]
    pub component_id: i64,
    pub quantity: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CustomOrderRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub components: Vec<ComponentLineRequest>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PriceUpdate {
    pub price: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default, alias = "fullName")]
    pub full_name: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RegisterQuery {
    #[serde(rename = "userType", alias = "user_type")]
    pub user_type: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<Role>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserInfo,
    pub token: String,
}
