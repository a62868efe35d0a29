use super::{nullable, text, Entity, MappingContext};
use crate::domain::model::{Child, Guardian, Household};
use crate::domain::table::Table;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HouseholdRow {
    pub household_id: String,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub household_name: Option<String>,
    pub address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub primary_email: Option<String>,
    pub primary_phone: Option<String>,
    pub preferred_scripture_translation: Option<String>,
    #[serde(
        rename = "preferredScriptureTranslation",
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_scripture_translation_legacy: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for Household {
    type Row = HouseholdRow;
    const TABLE: Table = Table::Households;

    fn id(&self) -> &str {
        &self.household_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: HouseholdRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.household_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        Household {
            name: scope.prefer("name", row.name, "household_name", row.household_name),
            address_line1: text(scope.prefer(
                "address_line1",
                row.address_line1,
                "address",
                row.address,
            )),
            address_line2: text(row.address_line2),
            city: text(row.city),
            state: text(row.state),
            zip: text(row.zip),
            primary_email: row.primary_email,
            primary_phone: row.primary_phone,
            preferred_scripture_translation: scope.prefer(
                "preferred_scripture_translation",
                row.preferred_scripture_translation,
                "preferredScriptureTranslation",
                row.preferred_scripture_translation_legacy,
            ),
            photo_url: row.photo_url,
            household_id: row.household_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> HouseholdRow {
        HouseholdRow {
            household_id: self.household_id.clone(),
            name: self.name.clone(),
            address_line1: nullable(&self.address_line1),
            address_line2: nullable(&self.address_line2),
            city: nullable(&self.city),
            state: nullable(&self.state),
            zip: nullable(&self.zip),
            primary_email: self.primary_email.clone(),
            primary_phone: self.primary_phone.clone(),
            preferred_scripture_translation: self.preferred_scripture_translation.clone(),
            photo_url: self.photo_url.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardianRow {
    pub guardian_id: String,
    pub household_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile_phone: Option<String>,
    pub email: Option<String>,
    pub relationship: Option<String>,
    pub is_primary: Option<bool>,
    #[serde(rename = "isPrimary", skip_serializing_if = "Option::is_none")]
    pub is_primary_legacy: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for Guardian {
    type Row = GuardianRow;
    const TABLE: Table = Table::Guardians;

    fn id(&self) -> &str {
        &self.guardian_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: GuardianRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.guardian_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        Guardian {
            household_id: text(row.household_id),
            first_name: text(row.first_name),
            last_name: text(row.last_name),
            mobile_phone: text(row.mobile_phone),
            email: row.email,
            relationship: text(row.relationship),
            is_primary: scope
                .prefer("is_primary", row.is_primary, "isPrimary", row.is_primary_legacy)
                .unwrap_or(false),
            guardian_id: row.guardian_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> GuardianRow {
        GuardianRow {
            guardian_id: self.guardian_id.clone(),
            household_id: Some(self.household_id.clone()),
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            mobile_phone: Some(self.mobile_phone.clone()),
            email: self.email.clone(),
            relationship: Some(self.relationship.clone()),
            is_primary: Some(self.is_primary),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildRow {
    pub child_id: String,
    pub household_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    pub grade: Option<String>,
    pub child_mobile: Option<String>,
    pub allergies: Option<String>,
    pub medical_notes: Option<String>,
    pub special_needs: Option<bool>,
    pub special_needs_notes: Option<String>,
    pub is_active: Option<bool>,
    #[serde(rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active_legacy: Option<bool>,
    pub photo_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for Child {
    type Row = ChildRow;
    const TABLE: Table = Table::Children;

    fn id(&self) -> &str {
        &self.child_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: ChildRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.child_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        Child {
            household_id: text(row.household_id),
            first_name: text(row.first_name),
            last_name: text(row.last_name),
            dob: scope.prefer("dob", row.dob, "birth_date", row.birth_date),
            grade: row.grade,
            child_mobile: row.child_mobile,
            allergies: row.allergies,
            medical_notes: row.medical_notes,
            special_needs: row.special_needs.unwrap_or(false),
            special_needs_notes: row.special_needs_notes,
            is_active: scope
                .prefer("is_active", row.is_active, "isActive", row.is_active_legacy)
                .unwrap_or(true),
            photo_url: row.photo_url,
            child_id: row.child_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> ChildRow {
        ChildRow {
            child_id: self.child_id.clone(),
            household_id: Some(self.household_id.clone()),
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            dob: self.dob.clone(),
            grade: self.grade.clone(),
            child_mobile: self.child_mobile.clone(),
            allergies: self.allergies.clone(),
            medical_notes: self.medical_notes.clone(),
            special_needs: Some(self.special_needs),
            special_needs_notes: self.special_needs_notes.clone(),
            is_active: Some(self.is_active),
            photo_url: self.photo_url.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}
