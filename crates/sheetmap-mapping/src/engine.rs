//! The row mapping engine
//!
//! Turns a raw table (header row plus data rows) into primary documents,
//! secondary snapshot documents and a list of rejected rows.

use ahash::AHashMap;
use serde::Serialize;
use serde_json::Value;
use sheetmap_core::{
    fields, is_blank_row, ComputedFieldConfig, Document, FieldFormat, ImportContext,
    MappingConfig, MappingRule, PricePeriod, PriceRecord, RawCell, RawRow, TargetCollection,
};

use crate::coerce::{coerce_cell, coerce_number, number_value, Coerced};
use crate::computed::CompiledField;
use crate::ids::{IdGenerator, RandomIdGenerator};
use crate::summary::ImportSummary;

/// Rejection reason: a required primary field was absent or unreadable
pub const MISSING_REQUIRED_FIELD: &str = "missing required field";
/// Rejection reason: no rule produced any value
pub const EMPTY_ROW: &str = "empty row or no valid data";

/// A data row that produced no document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidRow {
    /// Position in the raw table; the header row is 0
    pub index: usize,
    pub raw_row: RawRow,
    pub reason: String,
    /// Header of the offending rule, when one is to blame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl InvalidRow {
    fn missing(index: usize, row: &[RawCell], header: &str) -> Self {
        Self {
            index,
            raw_row: row.to_vec(),
            reason: MISSING_REQUIRED_FIELD.to_string(),
            field: Some(header.to_string()),
        }
    }

    fn empty(index: usize, row: &[RawCell]) -> Self {
        Self {
            index,
            raw_row: row.to_vec(),
            reason: EMPTY_ROW.to_string(),
            field: None,
        }
    }
}

/// Result of mapping one table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingOutput {
    /// One primary document per accepted row, in row order
    pub valid_data: Vec<Document>,
    pub invalid_rows: Vec<InvalidRow>,
    /// Snapshot documents for accepted rows that populated any secondary field
    pub secondary_data: Vec<Document>,
}

impl MappingOutput {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary::from_output(self)
    }
}

/// Column position of each header. The first occurrence of a duplicate wins.
#[derive(Debug, Clone, Default)]
struct HeaderIndex {
    columns: AHashMap<String, usize>,
}

impl HeaderIndex {
    fn new(header: &[RawCell]) -> Self {
        let mut columns = AHashMap::with_capacity(header.len());
        for (position, cell) in header.iter().enumerate() {
            if let Some(text) = cell.as_text() {
                columns.entry(text.into_owned()).or_insert(position);
            }
        }
        Self { columns }
    }

    /// Cell under `header`; `None` when the column is absent or the row is short
    fn cell<'r>(&self, row: &'r [RawCell], header: &str) -> Option<&'r RawCell> {
        self.columns.get(header).and_then(|&col| row.get(col))
    }
}

enum RowOutcome {
    Skipped,
    Invalid(InvalidRow),
    Valid {
        primary: Document,
        secondary: Option<Document>,
    },
}

/// Maps tables with one configuration, context and price period.
///
/// Computed-field expressions are compiled once at construction.
pub struct MappingEngine<G: IdGenerator = RandomIdGenerator> {
    rules: Vec<MappingRule>,
    computed: Vec<CompiledField>,
    context: ImportContext,
    period: PricePeriod,
    ids: G,
}

impl MappingEngine<RandomIdGenerator> {
    /// Engine with entropy-seeded snapshot ids
    pub fn new(config: &MappingConfig, context: ImportContext, period: PricePeriod) -> Self {
        Self::with_id_generator(config, context, period, RandomIdGenerator::new())
    }
}

impl<G: IdGenerator> MappingEngine<G> {
    pub fn with_id_generator(
        config: &MappingConfig,
        context: ImportContext,
        period: PricePeriod,
        ids: G,
    ) -> Self {
        Self::from_parts(&config.rules, &config.computed_fields, context, period, ids)
    }

    fn from_parts(
        rules: &[MappingRule],
        computed_fields: &[ComputedFieldConfig],
        context: ImportContext,
        period: PricePeriod,
        ids: G,
    ) -> Self {
        Self {
            rules: rules.to_vec(),
            computed: computed_fields.iter().map(CompiledField::compile).collect(),
            context,
            period,
            ids,
        }
    }

    pub fn context(&self) -> &ImportContext {
        &self.context
    }

    pub fn period(&self) -> PricePeriod {
        self.period
    }

    /// Map every data row of `table`. Row 0 is the header.
    pub fn apply(&mut self, table: &[RawRow]) -> MappingOutput {
        let mut output = MappingOutput::default();
        let Some((header, rows)) = table.split_first() else {
            return output;
        };
        let header = HeaderIndex::new(header);

        for (offset, row) in rows.iter().enumerate() {
            let index = offset + 1;
            match self.map_row(&header, index, row) {
                RowOutcome::Skipped => {
                    tracing::trace!(row = index, "skipping blank row");
                }
                RowOutcome::Invalid(invalid) => {
                    tracing::debug!(row = index, reason = %invalid.reason, field = ?invalid.field, "row rejected");
                    output.invalid_rows.push(invalid);
                }
                RowOutcome::Valid { primary, secondary } => {
                    output.valid_data.push(primary);
                    if let Some(secondary) = secondary {
                        output.secondary_data.push(secondary);
                    }
                }
            }
        }

        tracing::info!(
            rows = rows.len(),
            valid = output.valid_data.len(),
            invalid = output.invalid_rows.len(),
            snapshots = output.secondary_data.len(),
            "mapping complete"
        );
        output
    }

    fn map_row(&mut self, header: &HeaderIndex, index: usize, row: &[RawCell]) -> RowOutcome {
        if is_blank_row(row) {
            return RowOutcome::Skipped;
        }

        let mut primary = Document::new();
        let mut secondary = Document::new();
        let mut primary_fields = 0usize;
        let mut secondary_fields = 0usize;
        let mut prices: Vec<PriceRecord> = Vec::new();

        for rule in &self.rules {
            let cell = header.cell(row, &rule.excel_header);
            let collection = rule.collection();

            if let Some(price_type) = rule.price_type() {
                match cell.and_then(coerce_number) {
                    Some(amount) => {
                        prices.push(PriceRecord::from_major(self.period, price_type, amount));
                        primary_fields += 1;
                    }
                    None => {
                        if let Some(cell) = cell.filter(|c| !c.is_blank()) {
                            tracing::warn!(row = index, header = %rule.excel_header, value = %cell, "price is not a number");
                        }
                        if rule.required {
                            return RowOutcome::Invalid(InvalidRow::missing(index, row, &rule.excel_header));
                        }
                    }
                }
                continue;
            }

            let value = match cell.map(|c| coerce_cell(c, rule.format)) {
                Some(Coerced::Value(value)) => value,
                Some(Coerced::Invalid(message)) => {
                    tracing::warn!(row = index, header = %rule.excel_header, %message, "skipping unreadable cell");
                    // A bad date only drops the field; a bad number counts as missing
                    let fails_row = rule.format != FieldFormat::Date;
                    if fails_row && rule.required && collection == TargetCollection::Primary {
                        return RowOutcome::Invalid(InvalidRow::missing(index, row, &rule.excel_header));
                    }
                    continue;
                }
                Some(Coerced::Missing) | None => {
                    if rule.required && collection == TargetCollection::Primary {
                        return RowOutcome::Invalid(InvalidRow::missing(index, row, &rule.excel_header));
                    }
                    continue;
                }
            };

            match collection {
                TargetCollection::Primary => {
                    primary.set_path(&rule.target_path, value);
                    primary_fields += 1;
                }
                TargetCollection::Secondary => {
                    secondary.set_path(&rule.target_path, value);
                    secondary_fields += 1;
                }
            }
        }

        if !prices.is_empty() {
            primary.merge_prices(&prices);
        }

        if primary_fields == 0 && secondary_fields == 0 {
            return RowOutcome::Invalid(InvalidRow::empty(index, row));
        }

        for field in &self.computed {
            let Some(value) = field.evaluate(&primary, &secondary) else {
                tracing::trace!(row = index, field = %field.config().name, "computed field omitted");
                continue;
            };
            let Some(value) = number_value(value) else {
                continue;
            };
            match field.config().target_collection {
                TargetCollection::Primary => primary.set_path(&field.config().target_path, value),
                TargetCollection::Secondary => {
                    secondary.set_path(&field.config().target_path, value);
                    secondary_fields += 1;
                }
            }
        }

        let secondary = if secondary_fields > 0 {
            self.link_snapshot(&primary, &mut secondary);
            Some(secondary)
        } else {
            None
        };

        RowOutcome::Valid { primary, secondary }
    }

    /// Stamp snapshot metadata and the owning entity onto a secondary document
    fn link_snapshot(&mut self, primary: &Document, secondary: &mut Document) {
        let context = &self.context;
        let snapshot_id = format!(
            "{}-{}",
            context.snapshot_date.format("%Y%m%d"),
            self.ids.next_id()
        );

        if let Some(entity_id) = context.resolve_entity_id(primary) {
            secondary.insert(fields::ENTITY_ID, Value::String(entity_id));
        }
        secondary.insert(fields::SNAPSHOT_ID, Value::String(snapshot_id));
        secondary.insert(
            fields::SNAPSHOT_DATE,
            Value::String(context.snapshot_date.format("%Y-%m-%d").to_string()),
        );
        secondary.insert(
            fields::SNAPSHOT_TYPE,
            Value::String(context.snapshot_type.clone()),
        );
        secondary.insert(fields::DATA_SOURCE, Value::String(context.data_source.clone()));
    }
}

/// Map `rows` in one call.
///
/// `rows[0]` is the header row. Blank data rows are skipped silently; every
/// other data row yields either a primary document or an [`InvalidRow`].
pub fn apply_mapping_rules<G: IdGenerator>(
    rows: &[RawRow],
    rules: &[MappingRule],
    computed_fields: &[ComputedFieldConfig],
    context: &ImportContext,
    period: PricePeriod,
    ids: G,
) -> MappingOutput {
    MappingEngine::from_parts(rules, computed_fields, context.clone(), period, ids).apply(rows)
}
