//! Functions and stored procedures.

use super::{MetadataRetriever, row_schema};
use crate::Result;
use crate::adapters::MetadataRow;
use crate::config::MetadataCategory;
use crate::inclusion::{InclusionRule, InclusionRuleFilter};
use crate::models::{Catalog, FunctionReturnType, NewRoutine, ProcedureReturnType, RoutineKind};

/// Row fields of one routine category.
struct RoutineColumns {
    category: MetadataCategory,
    name: &'static str,
    return_type: &'static str,
}

const FUNCTION_COLUMNS: RoutineColumns = RoutineColumns {
    category: MetadataCategory::Functions,
    name: "FUNCTION_NAME",
    return_type: "FUNCTION_TYPE",
};

const PROCEDURE_COLUMNS: RoutineColumns = RoutineColumns {
    category: MetadataCategory::Procedures,
    name: "PROCEDURE_NAME",
    return_type: "PROCEDURE_TYPE",
};

impl RoutineColumns {
    fn kind(&self, row: &MetadataRow) -> RoutineKind {
        let id = row.i64(self.return_type);
        match self.category {
            MetadataCategory::Procedures => RoutineKind::Procedure {
                return_type: ProcedureReturnType::from_short_id(id),
            },
            _ => RoutineKind::Function {
                return_type: FunctionReturnType::from_short_id(id),
            },
        }
    }

    fn consumed(&self) -> [&'static str; 6] {
        let (catalog, schema) = self.category.schema_columns();
        [catalog, schema, self.name, self.return_type, "SPECIFIC_NAME", "REMARKS"]
    }
}

impl MetadataRetriever<'_> {
    /// Adds functions accepted by `rule`.
    ///
    /// # Errors
    /// Returns error if the source fails or the strategy is misconfigured
    pub async fn retrieve_functions(&self, catalog: &mut Catalog, rule: &InclusionRule) -> Result<usize> {
        self.retrieve_routines(catalog, rule, &FUNCTION_COLUMNS).await
    }

    /// Adds procedures accepted by `rule`.
    ///
    /// # Errors
    /// Returns error if the source fails or the strategy is misconfigured
    pub async fn retrieve_procedures(
        &self,
        catalog: &mut Catalog,
        rule: &InclusionRule,
    ) -> Result<usize> {
        self.retrieve_routines(catalog, rule, &PROCEDURE_COLUMNS).await
    }

    async fn retrieve_routines(
        &self,
        catalog: &mut Catalog,
        rule: &InclusionRule,
        columns: &RoutineColumns,
    ) -> Result<usize> {
        let category = columns.category;
        let filter: InclusionRuleFilter<NewRoutine> = InclusionRuleFilter::new(Some(rule.clone()));
        if filter.is_exclude_all() {
            tracing::info!("Not retrieving {}, since this was not requested", category);
            return Ok(0);
        }

        let rows = self.retrieve_rows(category, catalog).await?;
        let consumed = columns.consumed();
        let mut count = 0;
        for row in &rows {
            let Some(name) = row.non_blank(columns.name) else {
                continue;
            };
            let Some(schema) = row_schema(catalog, row, category.schema_columns()) else {
                continue;
            };

            let mut routine = NewRoutine::new(
                schema,
                &catalog.schema(schema).full_name,
                name,
                row.string("SPECIFIC_NAME"),
                columns.kind(row),
            );
            routine.remarks = row.non_blank("REMARKS").map(str::to_string);
            routine.attributes = row.attributes(&consumed);
            if !filter.test(&routine) {
                tracing::trace!("Routine {} excluded", routine.full_name);
                continue;
            }

            let full_name = routine.full_name.clone();
            if catalog.add_routine(routine).is_some() {
                tracing::debug!("Retrieved {} {}", category, full_name);
                count += 1;
            }
        }

        tracing::info!("Retrieved {} {}", count, category);
        Ok(count)
    }
}
