use rowdb::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("In-Memory Database Demo\n");

    let mut db = Database::with_config(EngineConfig {
        index_backend: IndexBackend::Avl,
        ..EngineConfig::default()
    });

    db.create_table("student", ["id", "name", "gpa", "age"])?;
    println!("Created table 'student'");

    println!("Inserting data...");
    db.insert_row("student", ["1", "'John Doe'", "3.5", "20"])?;
    db.insert_row("student", ["2", "'Jane Smith'", "3.9", "19"])?;
    db.insert_row("student", ["3", "'Mark Davis'", "3.2", "21"])?;
    db.insert_row("student", ["4", "'Emma Wilson'", "3.8", "22"])?;
    println!("Inserted 4 rows\n");

    let filter = WhereClause::new(Predicate::new("gpa", Operator::Gt, "3.0"))
        .and(Predicate::new("age", Operator::Lt, "20"))
        .or(Predicate::new("gpa", Operator::Eq, "3.2"));
    println!("WHERE {filter}:");
    print_rows(&db.select_rows("student", &filter)?);

    let updated = db.update_rows(
        "student",
        &WhereClause::new(Predicate::new("age", Operator::GtEq, "21")),
        "gpa",
        "4.0",
    )?;
    println!("Updated {updated} rows:");
    print_rows(&db.select_rows("student", &WhereClause::all())?);

    let undone = db.undo()?;
    println!("Undid {} on {}:", undone.kind, undone.table);
    print_rows(&db.select_rows("student", &WhereClause::all())?);

    // same engine through the command interface
    println!("{}", db.execute("DELETE FROM student WHERE name = 'Jane Smith'")?);
    println!("{}", db.execute("SELECT * FROM student WHERE id != 4")?);

    println!("--- History ---");
    print!("{}", db.execute("HISTORY")?);
    println!("{}", db.execute("EXECUTE 2")?);

    let table = db.table("student")?;
    println!(
        "'student' holds {} rows in {} bytes of heap",
        table.len(),
        table.allocated_bytes()
    );

    println!("Tables in database:");
    for table_name in db.list_tables() {
        println!("  - {}", table_name);
    }

    Ok(())
}

fn print_rows(result: &QueryResult) {
    println!(
        "{:<5} {:<15} {:<5} {:<5}",
        result.columns[0], result.columns[1], result.columns[2], result.columns[3]
    );
    println!("{}", "-".repeat(33));
    for row in &result.rows {
        let cells = row.values();
        println!("{:<5} {:<15} {:<5} {:<5}", cells[0], cells[1], cells[2], cells[3]);
    }
    println!();
}
