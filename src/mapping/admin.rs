use super::{text, Entity, MappingContext};
use crate::domain::model::{BrandingSettings, User};
use crate::domain::table::Table;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub user_id: String,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub mobile_phone: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    #[serde(rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active_legacy: Option<bool>,
    pub background_check_status: Option<String>,
    pub expires_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for User {
    type Row = UserRow;
    const TABLE: Table = Table::Users;

    fn id(&self) -> &str {
        &self.user_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: UserRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.user_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        User {
            name: text(scope.prefer("name", row.name, "display_name", row.display_name)),
            email: text(row.email),
            mobile_phone: row.mobile_phone,
            role: text(row.role),
            is_active: scope
                .prefer("is_active", row.is_active, "isActive", row.is_active_legacy)
                .unwrap_or(true),
            background_check_status: row.background_check_status,
            expires_at: row.expires_at,
            user_id: row.user_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> UserRow {
        UserRow {
            user_id: self.user_id.clone(),
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            mobile_phone: self.mobile_phone.clone(),
            role: Some(self.role.clone()),
            is_active: Some(self.is_active),
            background_check_status: self.background_check_status.clone(),
            expires_at: self.expires_at.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandingSettingsRow {
    pub setting_id: String,
    pub org_id: Option<String>,
    pub app_name: Option<String>,
    #[serde(rename = "appName", skip_serializing_if = "Option::is_none")]
    pub app_name_legacy: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub use_logo_only: Option<bool>,
    #[serde(rename = "useLogoOnly", skip_serializing_if = "Option::is_none")]
    pub use_logo_only_legacy: Option<bool>,
    pub primary_color: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for BrandingSettings {
    type Row = BrandingSettingsRow;
    const TABLE: Table = Table::BrandingSettings;

    fn id(&self) -> &str {
        &self.setting_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: BrandingSettingsRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.setting_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        BrandingSettings {
            org_id: row.org_id.unwrap_or_else(|| "default".to_string()),
            app_name: text(scope.prefer("app_name", row.app_name, "appName", row.app_name_legacy)),
            description: row.description,
            logo_url: row.logo_url,
            use_logo_only: scope
                .prefer(
                    "use_logo_only",
                    row.use_logo_only,
                    "useLogoOnly",
                    row.use_logo_only_legacy,
                )
                .unwrap_or(false),
            primary_color: row.primary_color,
            setting_id: row.setting_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> BrandingSettingsRow {
        BrandingSettingsRow {
            setting_id: self.setting_id.clone(),
            org_id: Some(self.org_id.clone()),
            app_name: Some(self.app_name.clone()),
            description: self.description.clone(),
            logo_url: self.logo_url.clone(),
            use_logo_only: Some(self.use_logo_only),
            primary_color: self.primary_color.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}
