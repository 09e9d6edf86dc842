//! Import jobs: configuration lookup, validation and mapping in one call

use std::path::Path;

use sheetmap_core::{ConfigCatalog, Error, ImportContext, PricePeriod, RawRow, Result};
use sheetmap_csv::{read_table, CsvReadOptions};
use sheetmap_mapping::{check_config, IdGenerator, MappingEngine, MappingOutput, RandomIdGenerator};

/// Which configuration to apply, and to which month and snapshot
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub platform: String,
    pub name: String,
    pub period: PricePeriod,
    pub context: ImportContext,
}

impl ImportRequest {
    pub fn new<P: Into<String>, N: Into<String>>(
        platform: P,
        name: N,
        period: PricePeriod,
        context: ImportContext,
    ) -> Self {
        Self {
            platform: platform.into(),
            name: name.into(),
            period,
            context,
        }
    }
}

/// Extension trait for ConfigCatalog to run imports
pub trait CatalogImportExt {
    /// Map a raw table with random snapshot ids
    fn import(&self, request: &ImportRequest, table: &[RawRow]) -> Result<MappingOutput>;

    /// Map a raw table with the given id source
    fn import_with_ids<G: IdGenerator>(
        &self,
        request: &ImportRequest,
        table: &[RawRow],
        ids: G,
    ) -> Result<MappingOutput>;

    /// Read a CSV, TSV or JSON table from disk and map it
    fn import_file<P: AsRef<Path>>(&self, request: &ImportRequest, path: P) -> Result<MappingOutput>;
}

impl CatalogImportExt for ConfigCatalog {
    fn import(&self, request: &ImportRequest, table: &[RawRow]) -> Result<MappingOutput> {
        self.import_with_ids(request, table, RandomIdGenerator::new())
    }

    fn import_with_ids<G: IdGenerator>(
        &self,
        request: &ImportRequest,
        table: &[RawRow],
        ids: G,
    ) -> Result<MappingOutput> {
        let config = self.get(&request.platform, &request.name)?;
        check_config(config)?;

        tracing::info!(
            platform = %request.platform,
            name = %request.name,
            year = request.period.year(),
            month = request.period.month(),
            rows = table.len().saturating_sub(1),
            "starting import"
        );

        let mut engine =
            MappingEngine::with_id_generator(config, request.context.clone(), request.period, ids);
        Ok(engine.apply(table))
    }

    fn import_file<P: AsRef<Path>>(&self, request: &ImportRequest, path: P) -> Result<MappingOutput> {
        let path = path.as_ref();
        let table = read_table(path, &CsvReadOptions::default())
            .map_err(|e| Error::other(format!("{}: {}", path.display(), e)))?;
        self.import(request, &table)
    }
}
