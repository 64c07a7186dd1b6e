use crate::cli::RenderArgs;
use crate::config::ProjectConfig;
use crate::output::{print_notification, print_sql, print_warning};
use crate::recipe::Recipe;
use serde::Serialize;
use visql::{BuildError, BuilderState, QueryAssembler};

/// `--json` payload: the query plus what each picker would offer.
#[derive(Debug, Serialize)]
struct RenderReport {
    sql: Option<String>,
    table_options: Vec<String>,
    join_options: Vec<String>,
    columns: Vec<String>,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load_or_demo(args.config)?;
    let recipe = Recipe::load(&args.recipe)?;
    let state = recipe.replay(&project.catalog)?;

    let qa = QueryAssembler::new(&project.catalog);
    let sql = match qa.generate(&state) {
        Ok(sql) => sql,
        Err(e) => return Err(notify(e)),
    };

    if args.json {
        let report = report(&qa, &state, sql);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match sql {
        Some(sql) => print_sql(&sql),
        None => print_warning("no join has a type yet; nothing to show"),
    }
    Ok(())
}

fn report(qa: &QueryAssembler<'_>, state: &BuilderState, sql: Option<String>) -> RenderReport {
    RenderReport {
        sql,
        table_options: qa.table_options(state),
        join_options: qa.join_endpoint_options(state),
        columns: qa.qualified_columns(state),
    }
}

fn notify(e: BuildError) -> anyhow::Error {
    print_notification(&e.to_string());
    anyhow::anyhow!("query rejected ({})", e.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use visql::SchemaCatalog;

    #[test]
    fn report_lists_picker_options() {
        let catalog = SchemaCatalog::demo();
        let recipe = Recipe::parse(
            r#"
[[tables]]
table = "Products"
columns = ["ProductName"]
"#,
        )
        .unwrap();
        let state = recipe.replay(&catalog).unwrap();
        let qa = QueryAssembler::new(&catalog);

        let sql = qa.generate(&state).unwrap();
        let json = serde_json::to_value(report(&qa, &state, sql)).unwrap();

        assert_eq!(json["sql"], "SELECT Products.ProductName FROM Products");
        assert_eq!(
            json["columns"],
            serde_json::json!([
                "Products.ProductID",
                "Products.ProductName",
                "Products.Price",
                "Products.CategoryID"
            ])
        );
        assert_eq!(json["table_options"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn validation_failure_becomes_error() {
        let err = notify(BuildError::NoTableSelected);
        assert!(err.to_string().contains("NoTableSelected"));
    }
}
