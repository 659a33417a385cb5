use crate::cli::StagingMode;
use crate::error::SynthesisError;
use crate::schema::{Column, Report};

/// Alias the staging database is attached under.
pub const STAGING_SCHEMA: &str = "named";
/// Name of the pivoted wide table inside the staging database.
pub const WIDE_TABLE: &str = "NamedFields";
/// EAV source column holding the attribute code.
pub const CODE_COLUMN: &str = "ColumnId";
/// EAV source column holding the raw attribute value.
pub const VALUE_COLUMN: &str = "Value";

/// Ordered SQL fragments for one report's long-to-wide pivot. Later
/// fragments reference identifiers defined by earlier ones, so the order
/// of the fields here is the order they must be emitted in.
#[derive(Debug, Clone)]
pub struct PivotPlan {
    pub attach: String,
    pub table_ddl: String,
    pub views: Vec<String>,
    pub population: Vec<String>,
}

/// Name of the CSV file the wide table is exported to. The in-memory
/// staging variant tags its export so it never collides with the baseline
/// export it is later compared against.
pub fn export_file(artifact: &str, mode: StagingMode) -> String {
    match mode {
        StagingMode::Memory => format!("{artifact}_test.csv"),
        StagingMode::File => format!("{artifact}.csv"),
    }
}

/// Confirms the report carries exactly one row identifier column.
pub fn validate_row_id(report: &Report, row_id: &str) -> Result<(), SynthesisError> {
    let row_id_count = report
        .columns
        .iter()
        .filter(|column| column.title == row_id)
        .count();
    match row_id_count {
        0 => Err(SynthesisError::MissingRowId {
            report: report.title.clone(),
            row_id: row_id.to_string(),
        }),
        1 => Ok(()),
        _ => Err(SynthesisError::DuplicateRowId {
            report: report.title.clone(),
            row_id: row_id.to_string(),
        }),
    }
}

pub fn synthesize(
    report: &Report,
    row_id: &str,
    table_sql: &str,
    mode: StagingMode,
) -> Result<PivotPlan, SynthesisError> {
    validate_row_id(report, row_id)?;

    // The row identifier is pivoted as the primary key, never through a
    // coercion view, even when the schema also binds it to an attribute.
    let active: Vec<&Column> = report
        .columns
        .iter()
        .filter(|column| column.title != row_id && column.is_active())
        .collect();

    let attach = match mode {
        StagingMode::Memory => format!("ATTACH DATABASE '' AS {STAGING_SCHEMA};"),
        StagingMode::File => format!(
            "ATTACH DATABASE '{}_staging.db' AS {STAGING_SCHEMA};",
            report.artifact
        ),
    };

    let mut table_ddl = format!("CREATE TABLE {STAGING_SCHEMA}.{WIDE_TABLE}(\n");
    table_ddl.push_str(&format!("  {row_id} INTEGER NOT NULL,\n"));
    for column in &active {
        table_ddl.push_str(&format!("  {} STRING,\n", column.title));
    }
    table_ddl.push_str(&format!("  PRIMARY KEY({row_id})\n);\n"));

    let mut views = Vec::with_capacity(active.len() + 1);
    views.push(format!(
        "CREATE TEMP VIEW {row_id} as SELECT DISTINCT {row_id} FROM {table_sql} order by {row_id};\n"
    ));
    for column in &active {
        let title = column.title.as_str();
        let code = column.code.as_deref().unwrap_or_default();
        let coerced = column.kind.coerce(title, VALUE_COLUMN);
        views.push(format!(
            "CREATE TEMP VIEW {title} as SELECT a.{row_id}, {coerced} as {title} \
             FROM {table_sql} as a inner join {row_id} as b on a.{row_id} = b.{row_id} \
             where a.{CODE_COLUMN}={code};\n"
        ));
    }

    // Every row identifier is inserted first; each column is then filled
    // by an independent update so one failing column cannot mask another.
    let mut population = Vec::with_capacity(active.len() + 1);
    population.push(format!(
        "insert into {STAGING_SCHEMA}.{WIDE_TABLE}({row_id}) SELECT {row_id} FROM {row_id};\n"
    ));
    for column in &active {
        let title = column.title.as_str();
        population.push(format!(
            "UPDATE {STAGING_SCHEMA}.{WIDE_TABLE} set {title}=\
             (select {title} from {title} where {WIDE_TABLE}.{row_id} = {title}.{row_id});\n"
        ));
    }

    Ok(PivotPlan {
        attach,
        table_ddl,
        views,
        population,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ColumnType;

    fn report(columns: Vec<Column>) -> Report {
        Report {
            title: "My Report".to_string(),
            artifact: "My_Report".to_string(),
            columns,
        }
    }

    fn col(title: &str, code: Option<&str>, kind: ColumnType) -> Column {
        Column {
            title: title.to_string(),
            code: code.map(str::to_string),
            kind,
        }
    }

    fn sample() -> Report {
        report(vec![
            col("WorkId", None, ColumnType::Integer),
            col("Status", Some("7"), ColumnType::String),
            col("GatherTime", Some("11"), ColumnType::DateTime),
            col("Inactive", None, ColumnType::String),
        ])
    }

    #[test]
    fn ddl_has_row_id_first_and_one_field_per_active_column() {
        let plan = synthesize(&sample(), "WorkId", "Props", StagingMode::Memory).expect("plan");
        let lines: Vec<&str> = plan.table_ddl.lines().collect();
        assert_eq!(lines[0], "CREATE TABLE named.NamedFields(");
        assert_eq!(lines[1], "  WorkId INTEGER NOT NULL,");
        assert_eq!(lines[2], "  Status STRING,");
        assert_eq!(lines[3], "  GatherTime STRING,");
        assert_eq!(lines[4], "  PRIMARY KEY(WorkId)");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn inactive_columns_emit_nothing() {
        let plan = synthesize(&sample(), "WorkId", "Props", StagingMode::Memory).expect("plan");
        assert!(!plan.table_ddl.contains("Inactive"));
        assert!(plan.views.iter().all(|v| !v.contains("Inactive")));
        assert!(plan.population.iter().all(|u| !u.contains("Inactive")));
    }

    #[test]
    fn views_join_on_the_row_identifier_and_filter_by_code() {
        let plan = synthesize(&sample(), "WorkId", "Props", StagingMode::Memory).expect("plan");
        assert_eq!(plan.views.len(), 3);
        assert_eq!(
            plan.views[0],
            "CREATE TEMP VIEW WorkId as SELECT DISTINCT WorkId FROM Props order by WorkId;\n"
        );
        assert!(plan.views[1].contains("a.ColumnId=7"));
        assert!(plan.views[1].contains("Value as Status"));
        assert!(plan.views[2].contains("datetime_format(Value) as GatherTime"));
        assert!(plan.views[2].contains("inner join WorkId as b on a.WorkId = b.WorkId"));
    }

    #[test]
    fn population_inserts_row_ids_before_column_updates() {
        let plan = synthesize(&sample(), "WorkId", "Props", StagingMode::Memory).expect("plan");
        assert_eq!(plan.population.len(), 3);
        assert!(plan.population[0].starts_with("insert into named.NamedFields(WorkId)"));
        assert_eq!(
            plan.population[1],
            "UPDATE named.NamedFields set Status=\
             (select Status from Status where NamedFields.WorkId = Status.WorkId);\n"
        );
    }

    #[test]
    fn zero_active_columns_still_yields_a_valid_table() {
        let plan = synthesize(
            &report(vec![col("WorkId", None, ColumnType::Integer)]),
            "WorkId",
            "Props",
            StagingMode::Memory,
        )
        .expect("plan");
        assert!(plan.table_ddl.contains("WorkId INTEGER NOT NULL"));
        assert_eq!(plan.views.len(), 1);
        assert_eq!(plan.population.len(), 1);
    }

    #[test]
    fn missing_row_identifier_is_a_synthesis_error() {
        let err = synthesize(
            &report(vec![col("Status", Some("7"), ColumnType::String)]),
            "WorkId",
            "Props",
            StagingMode::Memory,
        )
        .expect_err("must fail");
        assert_eq!(
            err,
            SynthesisError::MissingRowId {
                report: "My Report".to_string(),
                row_id: "WorkId".to_string(),
            }
        );
    }

    #[test]
    fn duplicated_row_identifier_is_a_synthesis_error() {
        let err = synthesize(
            &report(vec![
                col("WorkId", None, ColumnType::Integer),
                col("WorkId", Some("5"), ColumnType::Integer),
            ]),
            "WorkId",
            "Props",
            StagingMode::Memory,
        )
        .expect_err("must fail");
        assert!(matches!(err, SynthesisError::DuplicateRowId { .. }));
    }

    #[test]
    fn file_staging_attaches_a_named_database() {
        let plan = synthesize(&sample(), "WorkId", "Props", StagingMode::File).expect("plan");
        assert_eq!(
            plan.attach,
            "ATTACH DATABASE 'My_Report_staging.db' AS named;"
        );
        assert_eq!(export_file("My_Report", StagingMode::File), "My_Report.csv");
        assert_eq!(
            export_file("My_Report", StagingMode::Memory),
            "My_Report_test.csv"
        );
    }
}
