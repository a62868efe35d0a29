use crate::utils::error::DataError;
use std::fmt;
use std::str::FromStr;

/// Every persisted entity kind, keyed by its backend table/collection name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Households,
    Guardians,
    Children,
    Ministries,
    MinistryEnrollments,
    RegistrationCycles,
    Attendance,
    Incidents,
    BibleBeeCycles,
    Divisions,
    Scriptures,
    StudentScriptures,
    EssayPrompts,
    StudentEssays,
    Users,
    BrandingSettings,
}

impl Table {
    pub const ALL: [Table; 16] = [
        Table::Households,
        Table::Guardians,
        Table::Children,
        Table::Ministries,
        Table::MinistryEnrollments,
        Table::RegistrationCycles,
        Table::Attendance,
        Table::Incidents,
        Table::BibleBeeCycles,
        Table::Divisions,
        Table::Scriptures,
        Table::StudentScriptures,
        Table::EssayPrompts,
        Table::StudentEssays,
        Table::Users,
        Table::BrandingSettings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Households => "households",
            Table::Guardians => "guardians",
            Table::Children => "children",
            Table::Ministries => "ministries",
            Table::MinistryEnrollments => "ministry_enrollments",
            Table::RegistrationCycles => "registration_cycles",
            Table::Attendance => "attendance",
            Table::Incidents => "incidents",
            Table::BibleBeeCycles => "bible_bee_cycles",
            Table::Divisions => "divisions",
            Table::Scriptures => "scriptures",
            Table::StudentScriptures => "student_scriptures",
            Table::EssayPrompts => "essay_prompts",
            Table::StudentEssays => "student_essays",
            Table::Users => "users",
            Table::BrandingSettings => "branding_settings",
        }
    }

    pub fn id_column(self) -> &'static str {
        match self {
            Table::Households => "household_id",
            Table::Guardians => "guardian_id",
            Table::Children => "child_id",
            Table::Ministries => "ministry_id",
            Table::MinistryEnrollments => "enrollment_id",
            Table::RegistrationCycles => "cycle_id",
            Table::Attendance => "attendance_id",
            Table::Incidents => "incident_id",
            Table::Users => "user_id",
            Table::BrandingSettings => "setting_id",
            Table::BibleBeeCycles
            | Table::Divisions
            | Table::Scriptures
            | Table::StudentScriptures
            | Table::EssayPrompts
            | Table::StudentEssays => "id",
        }
    }

    /// Foreign-key-shaped columns the local store keeps secondary indices on.
    pub fn indexes(self) -> &'static [&'static str] {
        match self {
            Table::Guardians | Table::Children => &["household_id"],
            Table::MinistryEnrollments => &["child_id", "cycle_id", "ministry_id"],
            Table::Attendance => &["child_id", "event_id", "date"],
            Table::Incidents => &["child_id"],
            Table::BibleBeeCycles => &["cycle_id"],
            Table::Divisions | Table::Scriptures | Table::EssayPrompts => &["bible_bee_cycle_id"],
            Table::StudentScriptures => &["child_id", "bible_bee_cycle_id", "scripture_id"],
            Table::StudentEssays => &["child_id", "bible_bee_cycle_id"],
            Table::BrandingSettings => &["org_id"],
            Table::Households
            | Table::Ministries
            | Table::RegistrationCycles
            | Table::Users => &[],
        }
    }

    /// Older spellings of an indexed column that stored rows may still carry.
    pub fn legacy_columns(self, column: &str) -> &'static [&'static str] {
        match (self, column) {
            (Table::Divisions | Table::EssayPrompts, "bible_bee_cycle_id") => &["year_id"],
            (
                Table::Scriptures | Table::StudentScriptures | Table::StudentEssays,
                "bible_bee_cycle_id",
            ) => &["competition_year_id"],
            _ => &[],
        }
    }

    /// Columns matched case-insensitively by a free-text `search` filter.
    pub fn search_columns(self) -> &'static [&'static str] {
        match self {
            Table::Households => &["name", "address_line1", "city", "primary_email"],
            Table::Guardians => &["first_name", "last_name", "email", "mobile_phone"],
            Table::Children => &["first_name", "last_name"],
            Table::Ministries => &["name", "code"],
            Table::MinistryEnrollments => &["notes"],
            Table::RegistrationCycles => &["name"],
            Table::Attendance => &[],
            Table::Incidents => &["child_name", "description"],
            Table::BibleBeeCycles | Table::Divisions => &["name"],
            Table::Scriptures => &["reference"],
            Table::StudentScriptures | Table::StudentEssays => &[],
            Table::EssayPrompts => &["title", "prompt"],
            Table::Users => &["name", "email"],
            Table::BrandingSettings => &["app_name"],
        }
    }

    /// Equality and boolean-flag filter keys a `list` call recognizes.
    pub fn filter_columns(self) -> &'static [&'static str] {
        match self {
            Table::Households => &["city", "state", "zip"],
            Table::Guardians => &["household_id", "is_primary"],
            Table::Children => &["household_id", "is_active", "grade", "special_needs"],
            Table::Ministries => &["code", "is_active", "allows_checkin"],
            Table::MinistryEnrollments => &["child_id", "cycle_id", "ministry_id", "status"],
            Table::RegistrationCycles => &["is_active"],
            Table::Attendance => &["child_id", "event_id", "date", "timeslot_id"],
            Table::Incidents => &["child_id", "event_id", "severity"],
            Table::BibleBeeCycles => &["cycle_id", "is_active"],
            Table::Divisions => &["bible_bee_cycle_id"],
            Table::Scriptures => &["bible_bee_cycle_id", "category"],
            Table::StudentScriptures => &["child_id", "bible_bee_cycle_id", "scripture_id", "status"],
            Table::EssayPrompts => &["bible_bee_cycle_id", "division_name"],
            Table::StudentEssays => &["child_id", "bible_bee_cycle_id", "essay_prompt_id", "status"],
            Table::Users => &["email", "role", "is_active"],
            Table::BrandingSettings => &["org_id"],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DataError::validation(format!("unknown table: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_round_trip() {
        for table in Table::ALL {
            assert_eq!(table.as_str().parse::<Table>().unwrap(), table);
        }
        assert!("sessions".parse::<Table>().is_err());
    }

    #[test]
    fn test_indexes_are_filterable() {
        // every indexed column must also be accepted as a list filter
        for table in Table::ALL {
            for index in table.indexes() {
                assert!(
                    table.filter_columns().contains(index),
                    "{}.{} is indexed but not filterable",
                    table,
                    index
                );
            }
        }
    }
}
