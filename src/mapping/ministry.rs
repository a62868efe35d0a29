use super::{text, Entity, MappingContext};
use crate::domain::model::{Attendance, Incident, Ministry, MinistryEnrollment, RegistrationCycle};
use crate::domain::table::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinistryRow {
    pub ministry_id: String,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    #[serde(rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active_legacy: Option<bool>,
    pub allows_checkin: Option<bool>,
    pub email: Option<String>,
    pub custom_questions: Option<Value>,
    pub optional_consent_text: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for Ministry {
    type Row = MinistryRow;
    const TABLE: Table = Table::Ministries;

    fn id(&self) -> &str {
        &self.ministry_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: MinistryRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.ministry_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        Ministry {
            name: text(scope.prefer("name", row.name, "label", row.label)),
            code: text(row.code),
            description: row.description,
            is_active: scope
                .prefer("is_active", row.is_active, "isActive", row.is_active_legacy)
                .unwrap_or(true),
            allows_checkin: row.allows_checkin.unwrap_or(false),
            email: row.email,
            custom_questions: row.custom_questions,
            optional_consent_text: row.optional_consent_text,
            ministry_id: row.ministry_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> MinistryRow {
        MinistryRow {
            ministry_id: self.ministry_id.clone(),
            name: Some(self.name.clone()),
            code: Some(self.code.clone()),
            description: self.description.clone(),
            is_active: Some(self.is_active),
            allows_checkin: Some(self.allows_checkin),
            email: self.email.clone(),
            custom_questions: self.custom_questions.clone(),
            optional_consent_text: self.optional_consent_text.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinistryEnrollmentRow {
    pub enrollment_id: String,
    pub child_id: Option<String>,
    pub cycle_id: Option<String>,
    pub ministry_id: Option<String>,
    pub status: Option<String>,
    pub custom_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<Value>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for MinistryEnrollment {
    type Row = MinistryEnrollmentRow;
    const TABLE: Table = Table::MinistryEnrollments;

    fn id(&self) -> &str {
        &self.enrollment_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: MinistryEnrollmentRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.enrollment_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        MinistryEnrollment {
            child_id: text(row.child_id),
            cycle_id: text(row.cycle_id),
            ministry_id: text(row.ministry_id),
            status: row.status.unwrap_or_else(|| "enrolled".to_string()),
            custom_fields: scope.prefer(
                "custom_fields",
                row.custom_fields,
                "custom_data",
                row.custom_data,
            ),
            notes: row.notes,
            enrollment_id: row.enrollment_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> MinistryEnrollmentRow {
        MinistryEnrollmentRow {
            enrollment_id: self.enrollment_id.clone(),
            child_id: Some(self.child_id.clone()),
            cycle_id: Some(self.cycle_id.clone()),
            ministry_id: Some(self.ministry_id.clone()),
            status: Some(self.status.clone()),
            custom_fields: self.custom_fields.clone(),
            notes: self.notes.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationCycleRow {
    pub cycle_id: String,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_active: Option<bool>,
    #[serde(rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active_legacy: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for RegistrationCycle {
    type Row = RegistrationCycleRow;
    const TABLE: Table = Table::RegistrationCycles;

    fn id(&self) -> &str {
        &self.cycle_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: RegistrationCycleRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.cycle_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        RegistrationCycle {
            name: scope.prefer("name", row.name, "label", row.label),
            start_date: text(row.start_date),
            end_date: text(row.end_date),
            is_active: scope
                .prefer("is_active", row.is_active, "isActive", row.is_active_legacy)
                .unwrap_or(false),
            cycle_id: row.cycle_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> RegistrationCycleRow {
        RegistrationCycleRow {
            cycle_id: self.cycle_id.clone(),
            name: self.name.clone(),
            start_date: Some(self.start_date.clone()),
            end_date: Some(self.end_date.clone()),
            is_active: Some(self.is_active),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub attendance_id: String,
    pub event_id: Option<String>,
    pub child_id: Option<String>,
    pub date: Option<String>,
    pub timeslot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeslot: Option<String>,
    pub check_in_at: Option<String>,
    pub checked_in_by: Option<String>,
    pub check_out_at: Option<String>,
    pub checked_out_by: Option<String>,
    pub picked_up_by: Option<String>,
    pub pickup_method: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for Attendance {
    type Row = AttendanceRow;
    const TABLE: Table = Table::Attendance;

    fn id(&self) -> &str {
        &self.attendance_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: AttendanceRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.attendance_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        Attendance {
            event_id: text(row.event_id),
            child_id: text(row.child_id),
            date: text(row.date),
            timeslot_id: scope.prefer("timeslot_id", row.timeslot_id, "timeslot", row.timeslot),
            check_in_at: row.check_in_at,
            checked_in_by: row.checked_in_by,
            check_out_at: row.check_out_at,
            checked_out_by: row.checked_out_by,
            picked_up_by: row.picked_up_by,
            pickup_method: row.pickup_method,
            attendance_id: row.attendance_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> AttendanceRow {
        AttendanceRow {
            attendance_id: self.attendance_id.clone(),
            event_id: Some(self.event_id.clone()),
            child_id: Some(self.child_id.clone()),
            date: Some(self.date.clone()),
            timeslot_id: self.timeslot_id.clone(),
            check_in_at: self.check_in_at.clone(),
            checked_in_by: self.checked_in_by.clone(),
            check_out_at: self.check_out_at.clone(),
            checked_out_by: self.checked_out_by.clone(),
            picked_up_by: self.picked_up_by.clone(),
            pickup_method: self.pickup_method.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentRow {
    pub incident_id: String,
    pub child_id: Option<String>,
    pub child_name: Option<String>,
    pub event_id: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub leader_id: Option<String>,
    pub timestamp: Option<String>,
    pub admin_acknowledged_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for Incident {
    type Row = IncidentRow;
    const TABLE: Table = Table::Incidents;

    fn id(&self) -> &str {
        &self.incident_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: IncidentRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.incident_id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        Incident {
            child_id: text(row.child_id),
            child_name: text(row.child_name),
            event_id: row.event_id,
            description: text(row.description),
            severity: row.severity.unwrap_or_else(|| "low".to_string()),
            leader_id: text(row.leader_id),
            timestamp: text(row.timestamp),
            admin_acknowledged_at: scope.prefer(
                "admin_acknowledged_at",
                row.admin_acknowledged_at,
                "acknowledged_at",
                row.acknowledged_at,
            ),
            incident_id: row.incident_id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> IncidentRow {
        IncidentRow {
            incident_id: self.incident_id.clone(),
            child_id: Some(self.child_id.clone()),
            child_name: Some(self.child_name.clone()),
            event_id: self.event_id.clone(),
            description: Some(self.description.clone()),
            severity: Some(self.severity.clone()),
            leader_id: Some(self.leader_id.clone()),
            timestamp: Some(self.timestamp.clone()),
            admin_acknowledged_at: self.admin_acknowledged_at.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}
