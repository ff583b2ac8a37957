use super::{MetadataRetriever, row_schema};
use crate::Result;
use crate::config::MetadataCategory;
use crate::inclusion::{InclusionRule, InclusionRuleFilter};
use crate::models::{
    ActionOrientation, ActionTiming, Catalog, EventManipulation, Trigger, qualify_name,
};

impl MetadataRetriever<'_> {
    /// Adds triggers to retrieved tables.
    ///
    /// Triggers are matched by `rule` on `<table full name>.<trigger>`.
    ///
    /// # Errors
    /// Returns error if the source fails or the strategy is misconfigured
    pub async fn retrieve_triggers(&self, catalog: &mut Catalog, rule: &InclusionRule) -> Result<usize> {
        let filter: InclusionRuleFilter<Trigger> = InclusionRuleFilter::new(Some(rule.clone()));
        if filter.is_exclude_all() {
            tracing::info!("Not retrieving triggers, since this was not requested");
            return Ok(0);
        }

        let rows = self.retrieve_rows(MetadataCategory::Triggers, catalog).await?;
        let columns = MetadataCategory::Triggers.schema_columns();
        let mut count = 0;
        for row in &rows {
            let (Some(name), Some(table_name)) =
                (row.non_blank("TRIGGER_NAME"), row.non_blank("EVENT_OBJECT_TABLE"))
            else {
                continue;
            };
            let Some(table) = row_schema(catalog, row, columns)
                .and_then(|schema| catalog.lookup_table(schema, table_name))
            else {
                continue;
            };
            if catalog.table(table).triggers().iter().any(|t| t.name == name) {
                continue;
            }

            let timing = row
                .non_blank("ACTION_TIMING")
                .or(row.non_blank("CONDITION_TIMING"))
                .unwrap_or_default();
            let trigger = Trigger {
                name: name.to_string(),
                full_name: qualify_name(&catalog.table(table).full_name, name),
                event_manipulation: EventManipulation::from_metadata(
                    row.non_blank("EVENT_MANIPULATION").unwrap_or_default(),
                ),
                action_timing: ActionTiming::from_metadata(timing),
                action_orientation: ActionOrientation::from_metadata(
                    row.non_blank("ACTION_ORIENTATION").unwrap_or_default(),
                ),
                action_order: row.i64("ACTION_ORDER").unwrap_or_default(),
                action_condition: row.non_blank("ACTION_CONDITION").map(str::to_string),
                action_statement: row.non_blank("ACTION_STATEMENT").map(str::to_string),
            };
            if !filter.test(&trigger) {
                tracing::trace!("Trigger {} excluded", trigger.full_name);
                continue;
            }

            if catalog.table_mut(table).add_trigger(trigger) {
                count += 1;
            }
        }

        tracing::info!("Retrieved {} triggers", count);
        Ok(count)
    }
}
