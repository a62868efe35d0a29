use super::{text, Entity, MappingContext};
use crate::domain::model::{
    BibleBeeCycle, Division, EssayPrompt, Scripture, StudentEssay, StudentScripture,
};
use crate::domain::table::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BibleBeeCycleRow {
    pub id: String,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub cycle_id: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    #[serde(rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active_legacy: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for BibleBeeCycle {
    type Row = BibleBeeCycleRow;
    const TABLE: Table = Table::BibleBeeCycles;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: BibleBeeCycleRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        BibleBeeCycle {
            name: text(scope.prefer("name", row.name, "label", row.label)),
            cycle_id: row.cycle_id,
            description: row.description,
            is_active: scope
                .prefer("is_active", row.is_active, "isActive", row.is_active_legacy)
                .unwrap_or(false),
            id: row.id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> BibleBeeCycleRow {
        BibleBeeCycleRow {
            id: self.id.clone(),
            name: Some(self.name.clone()),
            cycle_id: self.cycle_id.clone(),
            description: self.description.clone(),
            is_active: Some(self.is_active),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DivisionRow {
    pub id: String,
    pub bible_bee_cycle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub min_scriptures: Option<i32>,
    pub min_grade: Option<i32>,
    pub max_grade: Option<i32>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for Division {
    type Row = DivisionRow;
    const TABLE: Table = Table::Divisions;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: DivisionRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        Division {
            bible_bee_cycle_id: text(scope.prefer(
                "bible_bee_cycle_id",
                row.bible_bee_cycle_id,
                "year_id",
                row.year_id,
            )),
            name: text(row.name),
            description: row.description,
            min_scriptures: row.min_scriptures.unwrap_or(0),
            min_grade: row.min_grade,
            max_grade: row.max_grade,
            id: row.id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> DivisionRow {
        DivisionRow {
            id: self.id.clone(),
            bible_bee_cycle_id: Some(self.bible_bee_cycle_id.clone()),
            name: Some(self.name.clone()),
            description: self.description.clone(),
            min_scriptures: Some(self.min_scriptures),
            min_grade: self.min_grade,
            max_grade: self.max_grade,
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptureRow {
    pub id: String,
    pub bible_bee_cycle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition_year_id: Option<String>,
    pub scripture_number: Option<String>,
    pub scripture_order: Option<i32>,
    #[serde(rename = "sortOrder", skip_serializing_if = "Option::is_none")]
    pub sort_order_legacy: Option<i32>,
    pub reference: Option<String>,
    pub category: Option<String>,
    pub texts: Option<Value>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for Scripture {
    type Row = ScriptureRow;
    const TABLE: Table = Table::Scriptures;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: ScriptureRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        Scripture {
            bible_bee_cycle_id: text(scope.prefer(
                "bible_bee_cycle_id",
                row.bible_bee_cycle_id,
                "competition_year_id",
                row.competition_year_id,
            )),
            scripture_number: row.scripture_number,
            scripture_order: scope
                .prefer(
                    "scripture_order",
                    row.scripture_order,
                    "sortOrder",
                    row.sort_order_legacy,
                )
                .unwrap_or(0),
            reference: text(row.reference),
            category: row.category,
            texts: row.texts,
            id: row.id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> ScriptureRow {
        ScriptureRow {
            id: self.id.clone(),
            bible_bee_cycle_id: Some(self.bible_bee_cycle_id.clone()),
            scripture_number: self.scripture_number.clone(),
            scripture_order: Some(self.scripture_order),
            reference: Some(self.reference.clone()),
            category: self.category.clone(),
            texts: self.texts.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentScriptureRow {
    pub id: String,
    pub child_id: Option<String>,
    pub bible_bee_cycle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition_year_id: Option<String>,
    pub scripture_id: Option<String>,
    pub status: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for StudentScripture {
    type Row = StudentScriptureRow;
    const TABLE: Table = Table::StudentScriptures;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: StudentScriptureRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        StudentScripture {
            child_id: text(row.child_id),
            bible_bee_cycle_id: text(scope.prefer(
                "bible_bee_cycle_id",
                row.bible_bee_cycle_id,
                "competition_year_id",
                row.competition_year_id,
            )),
            scripture_id: text(row.scripture_id),
            status: row.status.unwrap_or_else(|| "assigned".to_string()),
            completed_at: row.completed_at,
            id: row.id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> StudentScriptureRow {
        StudentScriptureRow {
            id: self.id.clone(),
            child_id: Some(self.child_id.clone()),
            bible_bee_cycle_id: Some(self.bible_bee_cycle_id.clone()),
            scripture_id: Some(self.scripture_id.clone()),
            status: Some(self.status.clone()),
            completed_at: self.completed_at.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EssayPromptRow {
    pub id: String,
    pub bible_bee_cycle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_id: Option<String>,
    pub division_name: Option<String>,
    pub title: Option<String>,
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
    pub instructions: Option<String>,
    pub due_date: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for EssayPrompt {
    type Row = EssayPromptRow;
    const TABLE: Table = Table::EssayPrompts;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: EssayPromptRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        EssayPrompt {
            bible_bee_cycle_id: text(scope.prefer(
                "bible_bee_cycle_id",
                row.bible_bee_cycle_id,
                "year_id",
                row.year_id,
            )),
            division_name: row.division_name,
            title: text(row.title),
            prompt: text(scope.prefer("prompt", row.prompt, "prompt_text", row.prompt_text)),
            instructions: row.instructions,
            due_date: row.due_date,
            id: row.id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> EssayPromptRow {
        EssayPromptRow {
            id: self.id.clone(),
            bible_bee_cycle_id: Some(self.bible_bee_cycle_id.clone()),
            division_name: self.division_name.clone(),
            title: Some(self.title.clone()),
            prompt: Some(self.prompt.clone()),
            instructions: self.instructions.clone(),
            due_date: self.due_date.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentEssayRow {
    pub id: String,
    pub child_id: Option<String>,
    pub bible_bee_cycle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition_year_id: Option<String>,
    pub essay_prompt_id: Option<String>,
    pub status: Option<String>,
    pub submitted_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Entity for StudentEssay {
    type Row = StudentEssayRow;
    const TABLE: Table = Table::StudentEssays;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn to_domain(row: StudentEssayRow, ctx: &MappingContext<'_>) -> Self {
        let scope = ctx.record(Self::TABLE, row.id.clone());
        let (created_at, updated_at) = scope.timestamps(row.created_at, row.updated_at);

        StudentEssay {
            child_id: text(row.child_id),
            bible_bee_cycle_id: text(scope.prefer(
                "bible_bee_cycle_id",
                row.bible_bee_cycle_id,
                "competition_year_id",
                row.competition_year_id,
            )),
            essay_prompt_id: text(row.essay_prompt_id),
            status: row.status.unwrap_or_else(|| "assigned".to_string()),
            submitted_at: row.submitted_at,
            id: row.id,
            created_at,
            updated_at,
        }
    }

    fn to_backend(&self) -> StudentEssayRow {
        StudentEssayRow {
            id: self.id.clone(),
            child_id: Some(self.child_id.clone()),
            bible_bee_cycle_id: Some(self.bible_bee_cycle_id.clone()),
            essay_prompt_id: Some(self.essay_prompt_id.clone()),
            status: Some(self.status.clone()),
            submitted_at: self.submitted_at.clone(),
            created_at: Some(self.created_at.clone()),
            updated_at: Some(self.updated_at.clone()),
            ..Default::default()
        }
    }
}
