use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sensor_panel::metrics::{
    cpu::parse_proc_stat,
    memory::parse_meminfo,
    sensors::{parse_sensors_output, readings_from_report},
};
use sensor_panel::{SamplerConfig, SensorHub};
use std::sync::Arc;

const PROC_STAT: &str = "cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628 0\n\
                         cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0\n";

const MEMINFO: &str = "MemTotal:       32594172 kB\n\
                       MemFree:         1832428 kB\n\
                       MemAvailable:   20817232 kB\n\
                       Buffers:          795612 kB\n\
                       Cached:         17512260 kB\n";

const SENSORS_REPORT: &str = r#"{
    "k10temp-pci-00c3": { "Adapter": "PCI adapter", "Tctl": { "temp1_input": 45.25 },
                          "Tccd1": { "temp3_input": 40.5 } },
    "amdgpu-pci-0300": { "Adapter": "PCI adapter",
                         "vddgfx": { "in0_input": 0.806 },
                         "edge": { "temp1_input": 51.0, "temp1_crit": 100.0 },
                         "junction": { "temp2_input": 63.0 },
                         "mem": { "temp3_input": 58.0 },
                         "PPT": { "power1_average": 34.123, "power1_cap": 203.0 } },
    "nvme-pci-0100": { "Adapter": "PCI adapter", "Composite": { "temp1_input": 38.85 } }
}"#;

/// Benchmark the raw pseudo-file parsers
fn bench_raw_parsers(c: &mut Criterion) {
    c.bench_function("parse_proc_stat", |b| {
        b.iter(|| parse_proc_stat(PROC_STAT).expect("Should parse"))
    });

    c.bench_function("parse_meminfo", |b| {
        b.iter(|| parse_meminfo(MEMINFO).expect("Should parse"))
    });
}

/// Benchmark decoding and searching a chip sensors report
fn bench_sensors_report(c: &mut Criterion) {
    c.bench_function("sensors_report_decode", |b| {
        b.iter(|| parse_sensors_output(SENSORS_REPORT.as_bytes()).expect("Should decode"))
    });

    let report = parse_sensors_output(SENSORS_REPORT.as_bytes()).expect("Should decode");
    c.bench_function("sensors_report_lookup", |b| {
        b.iter(|| readings_from_report(&report))
    });
}

/// Benchmark the request-path aggregation under concurrent readers
fn bench_metrics_aggregation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");
    let hub = Arc::new(
        rt.block_on(async { SensorHub::start(&SamplerConfig::default()) })
            .expect("Should start hub"),
    );

    c.bench_function("metrics_aggregation", |b| b.iter(|| hub.metrics()));

    c.bench_function("metrics_json_serialization", |b| {
        let metrics = hub.metrics();
        b.iter(|| serde_json::to_string(&metrics).expect("Should serialize"))
    });

    for readers in [1usize, 2, 4, 8].iter() {
        c.bench_with_input(
            BenchmarkId::new("concurrent_aggregation", readers),
            readers,
            |b, &readers| {
                b.iter(|| {
                    std::thread::scope(|scope| {
                        for _ in 0..readers {
                            let hub = Arc::clone(&hub);
                            scope.spawn(move || {
                                for _ in 0..100 {
                                    std::hint::black_box(hub.metrics());
                                }
                            });
                        }
                    });
                })
            },
        );
    }

    rt.block_on(hub.shutdown());
}

criterion_group!(
    benches,
    bench_raw_parsers,
    bench_sensors_report,
    bench_metrics_aggregation
);
criterion_main!(benches);
