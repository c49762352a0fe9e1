use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hydat_trends::config::{AnalysisConfig, TargetMode};
use hydat_trends::models::{
    DataType, DatumConversion, DatumId, Observation, RegulationRecord, StatColumn, Station,
    StationId,
};
use hydat_trends::processors::{
    aggregate_by_year, DatumAligner, DatumGraph, NormalizationPolicy, StatisticalNormalizer,
    TrendPipeline,
};
use hydat_trends::readers::Snapshot;

const DATUMS: [i64; 4] = [10, 35, 100, 605];

// Synthetic stations spread over a few datums, every third one with an edge to 35
fn create_test_snapshot(station_count: usize, years: i32) -> Snapshot {
    let mut stations = Vec::with_capacity(station_count);
    let mut observations = Vec::new();
    let mut regulation = Vec::new();
    let mut conversions = Vec::new();

    for i in 0..station_count {
        let id = StationId::new(format!("{:02}ZZ{:03}", i % 12, i));
        let datum = DatumId(DATUMS[i % DATUMS.len()]);

        stations.push(Station::new(
            id.clone(),
            format!("Test Station {}", i),
            45.0 + (i as f64) * 0.01,
            -75.0 - (i as f64) * 0.01,
            Some(datum),
        ));

        if i % 3 == 0 && datum != DatumId(35) {
            conversions.push(DatumConversion::new(
                id.clone(),
                datum,
                DatumId(35),
                Some(0.5 * i as f64),
            ));
        }

        regulation.push(RegulationRecord::new(id.clone(), i % 10 == 0));

        for year in 0..years {
            let base = 100.0 + (i as f64) + (year as f64) * 0.05;
            let mean = if (i + year as usize) % 17 == 0 {
                None
            } else {
                Some(base)
            };
            observations.push(Observation::new(
                id.clone(),
                1950 + year,
                DataType::WaterLevel,
                mean,
                Some(base - 1.0),
                Some(base + 1.0),
            ));
        }
    }

    Snapshot::new(
        DataType::WaterLevel,
        stations,
        observations,
        regulation,
        conversions,
    )
}

fn benchmark_datum_alignment(c: &mut Criterion) {
    let snapshot = create_test_snapshot(200, 60);
    let graph = DatumGraph::from_conversions(&snapshot.conversions);

    c.bench_function("datum_alignment", |b| {
        b.iter(|| {
            let aligner = DatumAligner::new(&snapshot.stations, &graph);
            let (aligned, report) = aligner.align(&snapshot.observations, DatumId(35));
            black_box((aligned.len(), report.excluded_rows))
        })
    });
}

fn benchmark_statistical_normalization(c: &mut Criterion) {
    let snapshot = create_test_snapshot(200, 60);

    c.bench_function("z_score_normalization", |b| {
        b.iter(|| {
            let (values, report) =
                StatisticalNormalizer::new(StatColumn::Mean).normalize(&snapshot.observations);
            black_box((values.len(), report.degenerate_stations.len()))
        })
    });
}

fn benchmark_yearly_aggregation(c: &mut Criterion) {
    let snapshot = create_test_snapshot(200, 60);

    c.bench_function("yearly_aggregation", |b| {
        b.iter(|| black_box(aggregate_by_year(&snapshot.observations, StatColumn::Max).len()))
    });
}

fn benchmark_pipeline_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_by_station_count");

    let target_datum = AnalysisConfig {
        targets: TargetMode::All,
        ..Default::default()
    };
    let statistical = AnalysisConfig {
        policy: NormalizationPolicy::Statistical,
        targets: TargetMode::Unified,
        ..Default::default()
    };

    for &size in &[10, 100, 500] {
        let snapshot = create_test_snapshot(size, 60);

        group.bench_with_input(BenchmarkId::new("target_datum", size), &snapshot, |b, s| {
            b.iter(|| {
                let output = TrendPipeline::new(&target_datum).run(s, None);
                black_box(output.map(|o| o.series.len()).unwrap_or(0))
            })
        });

        group.bench_with_input(BenchmarkId::new("statistical", size), &snapshot, |b, s| {
            b.iter(|| {
                let output = TrendPipeline::new(&statistical).run(s, None);
                black_box(output.map(|o| o.series.len()).unwrap_or(0))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_datum_alignment,
    benchmark_statistical_normalization,
    benchmark_yearly_aggregation,
    benchmark_pipeline_by_size
);
criterion_main!(benches);
