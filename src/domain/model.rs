//! Canonical domain objects.
//!
//! Field names here are the canonical column names on both backends. Optional
//! semantic fields are `Option` and are omitted from serialized output when
//! absent; address and display text fields are plain `String` and use `""` for
//! "present but blank".

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON object used for create payloads and update patches.
pub type Document = serde_json::Map<String, Value>;

fn default_true() -> bool {
    true
}

fn default_enrolled() -> String {
    "enrolled".to_string()
}

fn default_assigned() -> String {
    "assigned".to_string()
}

fn default_severity() -> String {
    "low".to_string()
}

fn default_org() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Household {
    pub household_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_scripture_translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Guardian {
    pub guardian_id: String,
    pub household_id: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub relationship: String,
    pub is_primary: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Child {
    pub child_id: String,
    pub household_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,
    pub special_needs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_needs_notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ministry {
    pub ministry_id: String,
    pub name: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub allows_checkin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_questions: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_consent_text: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MinistryEnrollment {
    pub enrollment_id: String,
    pub child_id: String,
    pub cycle_id: String,
    pub ministry_id: String,
    #[serde(default = "default_enrolled")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationCycle {
    pub cycle_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attendance {
    pub attendance_id: String,
    pub event_id: String,
    pub child_id: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeslot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_out_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_method: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Incident {
    pub incident_id: String,
    pub child_id: String,
    pub child_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub description: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    pub leader_id: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_acknowledged_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BibleBeeCycle {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Division {
    pub id: String,
    pub bible_bee_cycle_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub min_scriptures: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_grade: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_grade: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scripture {
    pub id: String,
    pub bible_bee_cycle_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripture_number: Option<String>,
    pub scripture_order: i32,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texts: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentScripture {
    pub id: String,
    pub child_id: String,
    pub bible_bee_cycle_id: String,
    pub scripture_id: String,
    #[serde(default = "default_assigned")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EssayPrompt {
    pub id: String,
    pub bible_bee_cycle_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division_name: Option<String>,
    pub title: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentEssay {
    pub id: String,
    pub child_id: String,
    pub bible_bee_cycle_id: String,
    pub essay_prompt_id: String,
    #[serde(default = "default_assigned")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    pub role: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_check_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingSettings {
    pub setting_id: String,
    #[serde(default = "default_org")]
    pub org_id: String,
    pub app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub use_logo_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
