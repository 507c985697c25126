use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use gtfs_kit_core::{Parser, Writer};

// A grid of stops served by back-and-forth trips on a handful of routes.
fn generate_feed(dir: &Path, num_stops: usize, num_trips: usize, stops_per_trip: usize) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("agency.txt"),
        "agency_id,agency_name,agency_url,agency_timezone\nA1,Bench,https://example.com,Europe/Berlin\n",
    )
    .unwrap();

    let mut stops = String::from("stop_id,stop_name,stop_lat,stop_lon\n");
    for i in 0..num_stops {
        let lat = 48.0 + (i / 100) as f64 * 0.001;
        let lon = 7.8 + (i % 100) as f64 * 0.001;
        writeln!(stops, "S{},Stop {},{:.6},{:.6}", i, i, lat, lon).unwrap();
    }
    fs::write(dir.join("stops.txt"), stops).unwrap();

    let mut routes = String::from("route_id,agency_id,route_short_name,route_type\n");
    for i in 0..10 {
        writeln!(routes, "R{},A1,{},3", i, i).unwrap();
    }
    fs::write(dir.join("routes.txt"), routes).unwrap();

    fs::write(
        dir.join("calendar.txt"),
        "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nWK,1,1,1,1,1,0,0,20240101,20241231\n",
    )
    .unwrap();

    let mut trips = String::from("route_id,service_id,trip_id\n");
    let mut stop_times =
        String::from("trip_id,arrival_time,departure_time,stop_id,stop_sequence\n");
    for t in 0..num_trips {
        writeln!(trips, "R{},WK,T{}", t % 10, t).unwrap();
        let start = 5 * 3600 + (t % 200) * 300;
        for s in 0..stops_per_trip {
            let secs = start + s * 90;
            let time = format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
            let stop = (t * 7 + s) % num_stops;
            writeln!(stop_times, "T{},{},{},S{},{}", t, time, time, stop, s + 1).unwrap();
        }
    }
    fs::write(dir.join("trips.txt"), trips).unwrap();
    fs::write(dir.join("stop_times.txt"), stop_times).unwrap();
}

fn bench_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("gtfs_kit_bench_{}_{}", name, std::process::id()))
}

fn benchmark_loading(c: &mut Criterion) {
    let dir = bench_dir("input");
    generate_feed(&dir, 5_000, 2_000, 30);
    let parser = Parser::default();

    c.bench_function("parse 2k trips / 60k stop times", |b| {
        b.iter(|| parser.parse_path(&dir).unwrap())
    });

    let feed = parser.parse_path(&dir).unwrap();
    let out = bench_dir("output");
    c.bench_function("write 2k trips / 60k stop times", |b| {
        b.iter(|| Writer::new().write_to_dir(&feed, &out).unwrap())
    });

    fs::remove_dir_all(&dir).ok();
    fs::remove_dir_all(&out).ok();
}

criterion_group!(benches, benchmark_loading);
criterion_main!(benches);
