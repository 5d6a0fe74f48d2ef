//! CRM-side wire types.

use serde::{Deserialize, Serialize};

/// Reference to a record owner by external id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerRef {
    pub id: String,
}

/// A CRM user eligible to own leads.
#[derive(Debug, Clone, Deserialize)]
pub struct CrmUser {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<RoleRef>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRef {
    #[serde(default)]
    pub name: String,
}

impl CrmUser {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.name.as_str())
    }
}

/// An existing CRM lead as returned by phone-number search.
#[derive(Debug, Clone, Deserialize)]
pub struct CrmLead {
    pub id: String,
    #[serde(rename = "First_Name", default)]
    pub first_name: Option<String>,
    #[serde(rename = "Last_Name", default)]
    pub last_name: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Lead_Source", default)]
    pub lead_source: Option<String>,
    #[serde(rename = "Lead_Status", default)]
    pub lead_status: Option<String>,
    #[serde(rename = "Owner", default)]
    pub owner: Option<OwnerRef>,
}

/// Payload for creating a new CRM lead.
#[derive(Debug, Clone, Serialize)]
pub struct NewLead {
    #[serde(rename = "First_Name")]
    pub first_name: String,
    #[serde(rename = "Last_Name")]
    pub last_name: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Lead_Source")]
    pub lead_source: String,
    #[serde(rename = "Lead_Status")]
    pub lead_status: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Owner")]
    pub owner: OwnerRef,
}
