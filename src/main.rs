use std::error::Error;

mod algebra;
mod bench;
mod datagen;
mod execution;
mod explain;
mod storage;
mod types;

use algebra::LogicalNode;
use bench::{benchmark, render_table, BenchmarkPlan};
use datagen::RandomDataGenerator;
use execution::expression::Predicate;
use execution::operator::{
    HashJoin, IndexScan, NestedLoopJoin, OrderBy, OrderedSelect, Project, Scan, Select,
};
use execution::plan::QueryPlan;
use storage::{Attribute, Relation, Schema};
use types::{TupleValue, TupleValueType};

fn year_1970() -> Predicate {
    Predicate::column_equals_value("year", TupleValue::Int(1970))
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Physical strategies for
/// SELECT title, year, genre FROM album WHERE year = 1970
/// over a single relation, as in the classic single-table comparison.
fn album_plans(album: &Relation) -> Vec<BenchmarkPlan> {
    let columns = ["title", "year", "genre"];

    let simple = album.clone();
    let ordered_scan = album.clone();
    let ordered_select = album.clone();
    let index_scan = album.clone();
    vec![
        BenchmarkPlan::new("simple", move || {
            let select = Select::new(year_1970(), Box::new(Scan::new(&simple)))?;
            let project = Project::new(strings(&columns), Box::new(select))?;
            Ok(QueryPlan::new(Box::new(project)))
        }),
        BenchmarkPlan::new("ordered_scan", move || {
            let order_by = OrderBy::new("year", Box::new(Scan::new(&ordered_scan)))?;
            let select = Select::new(year_1970(), Box::new(order_by))?;
            let project = Project::new(strings(&columns), Box::new(select))?;
            Ok(QueryPlan::new(Box::new(project)))
        }),
        BenchmarkPlan::new("ordered_select", move || {
            let order_by = OrderBy::new("year", Box::new(Scan::new(&ordered_select)))?;
            let select = OrderedSelect::new(year_1970(), Box::new(order_by))?;
            let project = Project::new(strings(&columns), Box::new(select))?;
            Ok(QueryPlan::new(Box::new(project)))
        }),
        BenchmarkPlan::new("index_scan", move || {
            let scan = IndexScan::new(&index_scan, "year", TupleValue::Int(1970))?;
            let order_by = OrderBy::new("year", Box::new(scan))?;
            let project = Project::new(strings(&columns), Box::new(order_by))?;
            Ok(QueryPlan::new(Box::new(project)))
        }),
    ]
}

/// Physical strategies for
/// SELECT title, name, year FROM album JOIN artist ON artist_id = id
/// WHERE year = 1970
fn album_artist_plans(album: &Relation, artist: &Relation) -> Vec<BenchmarkPlan> {
    let columns = ["title", "name", "year"];

    let (a1, r1) = (album.clone(), artist.clone());
    let (a2, r2) = (album.clone(), artist.clone());
    let (a3, r3) = (album.clone(), artist.clone());
    let (a4, r4) = (album.clone(), artist.clone());
    let (a5, r5) = (album.clone(), artist.clone());
    vec![
        BenchmarkPlan::new("nested_loop_join", move || {
            let join = NestedLoopJoin::new(
                Predicate::columns_equal("artist_id", "id"),
                Box::new(Scan::new(&a1)),
                Box::new(Scan::new(&r1)),
            )?;
            let project = Project::new(strings(&columns), Box::new(join))?;
            let select = Select::new(year_1970(), Box::new(project))?;
            Ok(QueryPlan::new(Box::new(select)))
        })
        // quadratic, keep it out of the large runs
        .skip_when(|size| size >= 1000),
        BenchmarkPlan::new("hash_join", move || {
            let join = HashJoin::new(
                ("artist_id", "id"),
                Box::new(Scan::new(&a2)),
                Box::new(Scan::new(&r2)),
            )?;
            let project = Project::new(strings(&columns), Box::new(join))?;
            let select = Select::new(year_1970(), Box::new(project))?;
            Ok(QueryPlan::new(Box::new(select)))
        }),
        BenchmarkPlan::new("select_first", move || {
            let select = Select::new(year_1970(), Box::new(Scan::new(&a3)))?;
            let join = NestedLoopJoin::new(
                Predicate::columns_equal("artist_id", "id"),
                Box::new(select),
                Box::new(Scan::new(&r3)),
            )?;
            let project = Project::new(strings(&["title", "name"]), Box::new(join))?;
            Ok(QueryPlan::new(Box::new(project)))
        })
        .skip_when(|size| size >= 1000),
        BenchmarkPlan::new("index_scan_naive_join", move || {
            let scan = IndexScan::new(&a4, "year", TupleValue::Int(1970))?;
            let join = NestedLoopJoin::new(
                Predicate::columns_equal("artist_id", "id"),
                Box::new(scan),
                Box::new(Scan::new(&r4)),
            )?;
            let project = Project::new(strings(&columns), Box::new(join))?;
            let select = Select::new(year_1970(), Box::new(project))?;
            Ok(QueryPlan::new(Box::new(select)))
        }),
        BenchmarkPlan::new("index_scan_hash_join", move || {
            let scan = IndexScan::new(&a5, "year", TupleValue::Int(1970))?;
            let join = HashJoin::new(
                ("artist_id", "id"),
                Box::new(scan),
                Box::new(Scan::new(&r5)),
            )?;
            let project = Project::new(strings(&columns), Box::new(join))?;
            let select = Select::new(year_1970(), Box::new(project))?;
            Ok(QueryPlan::new(Box::new(select)))
        }),
    ]
}

fn run_album_queries(generator: &mut RandomDataGenerator) -> Result<(), Box<dyn Error>> {
    let album = Relation::new(
        "album",
        Schema::new(vec![
            Attribute::new("artist", TupleValueType::Text),
            Attribute::new("title", TupleValueType::Text),
            Attribute::new("year", TupleValueType::Int),
            Attribute::new("genre", TupleValueType::Text),
        ]),
    );
    album.create_index("year")?;

    println!("== album: SELECT title, year, genre FROM album WHERE year = 1970\n");
    let plans = album_plans(&album);
    let timings = benchmark(&[album], &plans, 3, generator)?;
    println!("\n{}", render_table(&timings));
    Ok(())
}

fn run_album_artist_queries(generator: &mut RandomDataGenerator) -> Result<(), Box<dyn Error>> {
    let album = Relation::new(
        "album",
        Schema::new(vec![
            Attribute::new("artist_id", TupleValueType::Int),
            Attribute::new("title", TupleValueType::Text),
            Attribute::new("year", TupleValueType::Int),
            Attribute::new("genre", TupleValueType::Text),
        ]),
    );
    album.create_index("year")?;
    album.create_index("artist_id")?;

    let artist = Relation::new(
        "artist",
        Schema::new(vec![
            Attribute::new("name", TupleValueType::Text),
            Attribute::new("id", TupleValueType::Int),
        ]),
    );
    artist.create_index("id")?;

    let logical = LogicalNode::Select {
        predicate: year_1970(),
        child: Box::new(LogicalNode::Project {
            columns: strings(&["title", "name", "year"]),
            child: Box::new(LogicalNode::Join {
                predicate: Predicate::columns_equal("artist_id", "id"),
                left: Box::new(LogicalNode::Scan {
                    table: "album".to_string(),
                }),
                right: Box::new(LogicalNode::Scan {
                    table: "artist".to_string(),
                }),
            }),
        }),
    };
    println!("== album join artist: logical tree\n");
    println!("{}", logical.dump());
    println!("{}\n", logical.to_dot());

    // Render one physical tree for comparison with the logical one
    let join = HashJoin::new(
        ("artist_id", "id"),
        Box::new(Scan::new(&album)),
        Box::new(Scan::new(&artist)),
    )?;
    let project = Project::new(strings(&["title", "name", "year"]), Box::new(join))?;
    let select = Select::new(year_1970(), Box::new(project))?;
    println!("== physical tree for hash_join\n");
    println!("{}\n", QueryPlan::new(Box::new(select)).to_dot());

    let plans = album_artist_plans(&album, &artist);

    println!("== album join artist: physical strategies\n");
    let timings = benchmark(&[album, artist], &plans, 3, generator)?;
    println!("\n{}", render_table(&timings));
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut generator = RandomDataGenerator::new();
    run_album_queries(&mut generator)?;
    run_album_artist_queries(&mut generator)?;
    Ok(())
}
