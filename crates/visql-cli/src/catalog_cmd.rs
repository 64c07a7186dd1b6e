use crate::cli::CatalogArgs;
use crate::config::ProjectConfig;
use crate::output::{print_header, print_info};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use visql::SchemaCatalog;

pub fn run(args: CatalogArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load_or_demo(args.config)?;

    if project.is_demo {
        print_info(&format!(
            "{} not found; showing the built-in demo catalog",
            project.config_path.display()
        ));
    }

    print_header("Tables");
    println!("{}", catalog_table(&project.catalog));
    Ok(())
}

fn header(title: &str) -> Cell {
    Cell::new(title)
        .add_attribute(Attribute::Bold)
        .fg(Color::Cyan)
}

pub(crate) fn catalog_table(catalog: &SchemaCatalog) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header("Table"),
            header("Columns"),
            header("Joins To"),
        ]);

    for t in catalog.list_tables() {
        let related = catalog.related_tables(&t.name);
        let related = if related.is_empty() {
            Cell::new("(leaf)").fg(Color::DarkGrey)
        } else {
            Cell::new(related.join(", ")).fg(Color::Magenta)
        };
        table.add_row(vec![
            Cell::new(&t.name).fg(Color::Yellow),
            Cell::new(t.columns.join(", ")).fg(Color::White),
            related,
        ]);
    }

    table
}
