use std::error::Error;
use std::time::{Duration, Instant};

use crate::datagen::DataGenerator;
use crate::execution::plan::QueryPlan;
use crate::storage::Relation;

/// One measured plan execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingRecord {
    pub plan: String,
    pub size: usize,
    pub rows: usize,
    pub elapsed: Duration,
}

type PlanFactory = Box<dyn Fn() -> Result<QueryPlan, Box<dyn Error>>>;

/// A named strategy under measurement. The factory builds a fresh
/// operator tree per sweep point (trees are single-pass); the optional
/// skip rule lets the caller exclude a plan above some relation size,
/// e.g. to keep a quadratic nested-loop join out of the large runs.
pub struct BenchmarkPlan {
    name: String,
    factory: PlanFactory,
    skip: Option<Box<dyn Fn(usize) -> bool>>,
}

impl BenchmarkPlan {
    pub fn new(
        name: &str,
        factory: impl Fn() -> Result<QueryPlan, Box<dyn Error>> + 'static,
    ) -> BenchmarkPlan {
        BenchmarkPlan {
            name: name.to_string(),
            factory: Box::new(factory),
            skip: None,
        }
    }

    pub fn skip_when(mut self, rule: impl Fn(usize) -> bool + 'static) -> BenchmarkPlan {
        self.skip = Some(Box::new(rule));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Sweeps relation sizes 10^1 .. 10^max_k. At each size every relation is
/// cleared and regenerated (indexes rebuild automatically), then each
/// non-skipped plan is built fresh and executed once. Any error aborts
/// the whole sweep.
pub fn benchmark(
    relations: &[Relation],
    plans: &[BenchmarkPlan],
    max_k: u32,
    generator: &mut dyn DataGenerator,
) -> Result<Vec<TimingRecord>, Box<dyn Error>> {
    let mut timings = Vec::new();
    for k in 1..=max_k {
        let size = 10usize.pow(k);
        println!("Running benchmark for relation size {}", size);
        for relation in relations {
            relation.clear();
            relation.generate(size, generator)?;
        }
        for plan in plans {
            if plan.skip.as_ref().map_or(false, |rule| rule(size)) {
                continue;
            }
            println!("\tRunning benchmark for query {}", plan.name);
            let query = (plan.factory)()?;
            let start = Instant::now();
            let rows = query.execute();
            timings.push(TimingRecord {
                plan: plan.name.clone(),
                size,
                rows: rows.len(),
                elapsed: start.elapsed(),
            });
        }
    }
    Ok(timings)
}

/// Aligned text table of the timing records, one row per execution.
pub fn render_table(timings: &[TimingRecord]) -> String {
    let name_width = timings
        .iter()
        .map(|t| t.plan.len())
        .max()
        .unwrap_or(4)
        .max("plan".len());
    let mut out = format!(
        "{:<name_width$}  {:>10}  {:>10}  {:>12}\n",
        "plan", "size", "rows", "time (s)"
    );
    for record in timings {
        out.push_str(&format!(
            "{:<name_width$}  {:>10}  {:>10}  {:>12.6}\n",
            record.plan,
            record.size,
            record.rows,
            record.elapsed.as_secs_f64()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datagen::RandomDataGenerator;
    use crate::execution::operator::Scan;
    use crate::storage::{Attribute, Schema};
    use crate::types::TupleValueType;

    fn album_relation() -> Relation {
        Relation::new(
            "album",
            Schema::new(vec![
                Attribute::new("title", TupleValueType::Text),
                Attribute::new("year", TupleValueType::Int),
            ]),
        )
    }

    fn scan_plan(relation: &Relation) -> BenchmarkPlan {
        let relation = relation.clone();
        BenchmarkPlan::new("scan", move || {
            Ok(QueryPlan::new(Box::new(Scan::new(&relation))))
        })
    }

    #[test]
    fn test_sweep_records_every_size() {
        let relation = album_relation();
        let plans = vec![scan_plan(&relation)];
        let mut generator = RandomDataGenerator::with_seed(42);

        let timings = benchmark(&[relation.clone()], &plans, 2, &mut generator).unwrap();
        assert_eq!(timings.len(), 2);
        assert_eq!(timings[0].size, 10);
        assert_eq!(timings[0].rows, 10);
        assert_eq!(timings[1].size, 100);
        assert_eq!(timings[1].rows, 100);
        // The relation holds the last sweep size afterwards
        assert_eq!(relation.len(), 100);
    }

    #[test]
    fn test_skip_rule_excludes_large_sizes() {
        let relation = album_relation();
        let plans = vec![
            scan_plan(&relation),
            scan_plan(&relation).skip_when(|size| size >= 100),
        ];
        let mut generator = RandomDataGenerator::with_seed(42);

        let timings = benchmark(&[relation], &plans, 2, &mut generator).unwrap();
        // Two runs at size 10, one at size 100
        assert_eq!(timings.len(), 3);
        assert_eq!(timings.iter().filter(|t| t.size == 100).count(), 1);
    }

    #[test]
    fn test_failing_factory_aborts_the_sweep() {
        let relation = album_relation();
        let plans = vec![BenchmarkPlan::new("broken", || {
            Err("no such plan".into())
        })];
        let mut generator = RandomDataGenerator::with_seed(42);
        assert!(benchmark(&[relation], &plans, 2, &mut generator).is_err());
    }

    #[test]
    fn test_render_table_lines_up() {
        let timings = vec![TimingRecord {
            plan: "hash_join".to_string(),
            size: 100,
            rows: 42,
            elapsed: Duration::from_micros(1500),
        }];
        let table = render_table(&timings);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("plan"));
        assert!(lines[1].starts_with("hash_join"));
        assert!(lines[1].contains("0.001500"));
    }
}
