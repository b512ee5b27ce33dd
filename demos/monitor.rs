//! Minimal monitoring pipeline: two sensor properties, a derived unit
//! conversion, a latest-value join, and a debounced alarm stream.
//!
//! Run with: `cargo run --example monitor`

use std::time::Duration;

use liveprop::{
    combine_latest, FnObserver, Observable, ObservableExt, Property, SubscribeOptions,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let temperature_c = Property::with_value(21.5_f64);
    let pressure_kpa = Property::with_value(101.3_f64);

    // Unit conversion stage.
    let temperature_f = temperature_c.map(|c| c * 9.0 / 5.0 + 32.0);
    let _printer = temperature_f.subscribe_with(
        FnObserver::arc(|f: &f64| println!("temperature: {f:.1} F")),
        SubscribeOptions::new().first_update(),
    );

    // Latest-value join over both sensors.
    let rounded_t = temperature_c.map(|c| (c * 10.0).round() as i64);
    let rounded_p = pressure_kpa.map(|p| (p * 10.0).round() as i64);
    let joined = combine_latest(&[&rounded_t, &rounded_p]);
    let _joined_printer = joined.subscribe(FnObserver::arc(|pair: &Vec<i64>| {
        println!(
            "snapshot: {:.1} C / {:.1} kPa",
            pair[0] as f64 / 10.0,
            pair[1] as f64 / 10.0
        );
    }));

    // Alarm only when the reading settles above the threshold.
    let alarms = temperature_c
        .filter(|c| *c > 30.0)
        .debounce(Duration::from_millis(200));
    let _alarm_printer = alarms.subscribe(FnObserver::arc(|c: &f64| {
        println!("ALARM: temperature settled at {c:.1} C");
    }));

    // Simulated sensor traffic.
    for reading in [22.0, 24.5, 31.0, 32.5, 33.0] {
        temperature_c.set(reading);
        tokio::time::sleep(Duration::from_millis(80)).await;
    }
    pressure_kpa.set(99.8);

    tokio::time::sleep(Duration::from_millis(400)).await;
}
