//! Enrichment applied to a valid composite resource before it is stored.
//!
//! Three passes run over each present table config: replica normalisation,
//! dimension-table quota injection and tuner application. Only tuner
//! resolution can fail.

use tracing::debug;

use crate::composite::TableConfigs;
use crate::config::ControllerConfig;
use crate::error::TableConfigsError;
use crate::schema::SchemaDoc;
use crate::table::{QuotaConfig, TableConfigDoc, TableType};
use crate::tuner::TunerRegistry;

/// Enrich `configs` in place.
///
/// On error `configs` may be partially enriched; callers discard it.
pub fn derive(
    configs: &mut TableConfigs,
    config: &ControllerConfig,
    tuners: &TunerRegistry,
) -> Result<(), TableConfigsError> {
    let TableConfigs {
        table_name,
        schema,
        offline,
        realtime,
        ..
    } = configs;
    let Some(schema) = schema.as_ref() else {
        // Validation guarantees a schema; nothing to derive against otherwise.
        return Ok(());
    };

    for (slot, table) in [
        (TableType::Offline, offline.as_mut()),
        (TableType::Realtime, realtime.as_mut()),
    ] {
        let Some(table) = table else { continue };
        normalize_replicas(table, config.min_replicas);
        inject_dim_table_quota(table, &config.dim_table_max_size);
        apply_tuners(table_name, slot, schema, table, tuners)?;
    }
    Ok(())
}

fn normalize_replicas(table: &mut TableConfigDoc, min_replicas: u32) {
    let segments = &mut table.segments_config;
    let declared = match table.table_type {
        TableType::Offline => &mut segments.replication,
        TableType::Realtime => &mut segments.replicas_per_partition,
    };
    if let Some(replicas) = declared
        && *replicas < min_replicas
    {
        debug!(
            table = %table.table_name,
            table_type = %table.table_type,
            from = *replicas,
            to = min_replicas,
            "raising replica count to minimum"
        );
        *replicas = min_replicas;
    }
}

fn inject_dim_table_quota(table: &mut TableConfigDoc, max_size: &str) {
    if !table.is_dim_table || table.storage_quota().is_some() {
        return;
    }
    table
        .quota
        .get_or_insert_with(QuotaConfig::default)
        .storage = Some(max_size.to_string());
}

fn apply_tuners(
    name: &str,
    slot: TableType,
    schema: &SchemaDoc,
    table: &mut TableConfigDoc,
    tuners: &TunerRegistry,
) -> Result<(), TableConfigsError> {
    // Directives are cloned out so each tuner can take the table mutably.
    let directives = table.tuner_configs.clone();
    for directive in &directives {
        let tuner = tuners
            .get(&directive.name)
            .ok_or_else(|| TableConfigsError::UnknownTuner {
                name: name.to_string(),
                table_type: slot,
                tuner: directive.name.clone(),
            })?;
        debug!(table = %name, table_type = %slot, tuner = %directive.name, "applying tuner");
        tuner.apply(schema, table, &directive.tuner_properties);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;
    use crate::table::TunerConfig;
    use crate::tuner::AUTO_INDEX_TUNER;

    fn schema() -> SchemaDoc {
        SchemaDoc::new("events")
            .with_dimension("d1", DataType::String)
            .with_dimension("d2", DataType::String)
            .with_metric("m1", DataType::Long)
            .with_date_time("ts", DataType::Long, "1:MILLISECONDS:EPOCH", "1:MILLISECONDS")
            .with_primary_key(vec!["d1".into()])
    }

    fn configs() -> TableConfigs {
        let offline = TableConfigDoc::new("events", TableType::Offline);
        let mut realtime = TableConfigDoc::new("events", TableType::Realtime);
        realtime
            .table_index_config
            .stream_configs
            .insert("streamType".into(), "kafka".into());
        TableConfigs::new("events", Some(schema()), Some(offline), Some(realtime))
    }

    fn run(configs: &mut TableConfigs, config: &ControllerConfig) -> Result<(), TableConfigsError> {
        derive(configs, config, &TunerRegistry::with_defaults())
    }

    #[test]
    fn raises_declared_replicas_only() {
        let mut configs = configs();
        configs.offline.as_mut().unwrap().segments_config.replication = Some(1);
        configs.realtime.as_mut().unwrap().segments_config.replicas_per_partition = Some(5);

        run(&mut configs, &ControllerConfig::default().with_min_replicas(3)).unwrap();

        let offline = configs.offline.as_ref().unwrap();
        let realtime = configs.realtime.as_ref().unwrap();
        assert_eq!(offline.segments_config.replication, Some(3));
        assert_eq!(realtime.segments_config.replicas_per_partition, Some(5));
        // Undeclared stays undeclared.
        assert_eq!(offline.segments_config.replicas_per_partition, None);
        assert_eq!(realtime.segments_config.replication, None);
    }

    #[test]
    fn injects_quota_into_dim_tables_without_one() {
        let mut configs = configs();
        configs.offline.as_mut().unwrap().is_dim_table = true;
        run(&mut configs, &ControllerConfig::default()).unwrap();
        assert_eq!(configs.offline.as_ref().unwrap().storage_quota(), Some("200M"));
        assert_eq!(configs.realtime.as_ref().unwrap().storage_quota(), None);
    }

    #[test]
    fn keeps_explicit_dim_table_quota() {
        let mut configs = configs();
        let offline = configs.offline.as_mut().unwrap();
        offline.is_dim_table = true;
        offline.quota = Some(QuotaConfig {
            storage: Some("5G".into()),
            ..Default::default()
        });
        run(&mut configs, &ControllerConfig::default()).unwrap();
        assert_eq!(configs.offline.as_ref().unwrap().storage_quota(), Some("5G"));
    }

    #[test]
    fn applies_named_tuners_to_both_slots() {
        let mut configs = configs();
        for table in [configs.offline.as_mut().unwrap(), configs.realtime.as_mut().unwrap()] {
            table.tuner_configs.push(TunerConfig::new(AUTO_INDEX_TUNER));
        }
        run(&mut configs, &ControllerConfig::default()).unwrap();

        for table in [configs.offline.as_ref().unwrap(), configs.realtime.as_ref().unwrap()] {
            let indexing = &table.table_index_config;
            assert_eq!(indexing.inverted_index_columns, vec!["d1".to_string(), "d2".to_string()]);
            assert_eq!(indexing.no_dictionary_columns, vec!["m1".to_string()]);
        }
    }

    #[test]
    fn unknown_tuner_fails_with_context() {
        let mut configs = configs();
        configs
            .realtime
            .as_mut()
            .unwrap()
            .tuner_configs
            .push(TunerConfig::new("noSuchTuner"));
        assert_eq!(
            run(&mut configs, &ControllerConfig::default()),
            Err(TableConfigsError::UnknownTuner {
                name: "events".into(),
                table_type: TableType::Realtime,
                tuner: "noSuchTuner".into(),
            })
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let mut a = configs();
        a.offline.as_mut().unwrap().tuner_configs.push(TunerConfig::new(AUTO_INDEX_TUNER));
        let mut b = a.clone();
        run(&mut a, &ControllerConfig::default()).unwrap();
        run(&mut b, &ControllerConfig::default()).unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
